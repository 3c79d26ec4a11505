pub mod config;
pub mod errors;
pub mod ipc;
pub mod network;
pub mod plugin;
pub mod song_info;
pub mod state;
pub mod window;

// Re-export commonly used items for convenience
pub use config::ShellConfig;
pub use errors::app_error::{AppError, AppResult};
pub use plugin::global_registry;
pub use state::AppState;
