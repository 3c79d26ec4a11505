//! Removal of promotional decorations from channel and video names.

/// Checked in order; the first match is stripped
pub const PROMOTIONAL_SUFFIXES: &[&str] = &[
    " - Topic",
    "VEVO",
    " (Performance Video)",
    " (Clip official)",
    " (Official Video)",
    " (Official Music Video)",
    " (Official Audio)",
    " (Lyric Video)",
];

/// Strip at most one promotional suffix from `name`.
///
/// Whitespace left at the end by stripping is trimmed. Names without a known
/// suffix come back unchanged.
pub fn cleanup_name(name: &str) -> String {
    PROMOTIONAL_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .map(|stripped| stripped.trim_end().to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_channel() {
        assert_eq!(cleanup_name("Band - Topic"), "Band");
    }

    #[test]
    fn test_vevo_with_and_without_space() {
        assert_eq!(cleanup_name("ArtistVEVO"), "Artist");
        assert_eq!(cleanup_name("Artist VEVO"), "Artist");
    }

    #[test]
    fn test_video_decorations() {
        assert_eq!(cleanup_name("Song (Official Video)"), "Song");
        assert_eq!(cleanup_name("Song (Official Music Video)"), "Song");
        assert_eq!(cleanup_name("Song (Lyric Video)"), "Song");
        assert_eq!(cleanup_name("Chanson (Clip official)"), "Chanson");
    }

    #[test]
    fn test_only_one_suffix_removed() {
        assert_eq!(cleanup_name("Artist VEVO VEVO"), "Artist VEVO");
    }

    #[test]
    fn test_untouched_names() {
        assert_eq!(cleanup_name("Plain Song"), "Plain Song");
        assert_eq!(cleanup_name("Trailing space "), "Trailing space ");
        assert_eq!(cleanup_name("(Official Video) first"), "(Official Video) first");
        assert_eq!(cleanup_name(""), "");
    }

    #[test]
    fn test_idempotent_on_realistic_names() {
        for name in ["Band - Topic", "ArtistVEVO", "Song (Official Audio)", "Plain"] {
            let once = cleanup_name(name);
            assert_eq!(cleanup_name(&once), once);
        }
    }
}
