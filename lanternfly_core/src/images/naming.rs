//! Storage key generation for uploaded images.
//!
//! Keys look like `20240601T120000-photo.png`. The fixed-width UTC prefix is
//! what makes a reverse string sort of the gallery come out newest first, so
//! the format here and the sort in [`super::service`] must change together.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";
pub const FALLBACK_FILENAME: &str = "upload";

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// Source of the upload instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Reduces a client-supplied filename to `[A-Za-z0-9._-]`, dropping any
/// directory components. Never returns an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let joined = WHITESPACE.replace_all(base.trim(), "_");
    let safe = UNSAFE_CHARS.replace_all(&joined, "_");
    let trimmed = safe.trim_matches(|c: char| c == '.' || c == '_');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn storage_key(filename: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", timestamp(at), sanitize_filename(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 7).unwrap()
    }

    #[test]
    fn test_plain_filenames_are_kept() {
        assert_eq!(sanitize_filename("lanternfly.png"), "lanternfly.png");
        assert_eq!(sanitize_filename("IMG_0042.JPG"), "IMG_0042.JPG");
        assert_eq!(sanitize_filename("spotted-lanternfly.v2.webp"), "spotted-lanternfly.v2.webp");
    }

    #[test]
    fn test_directory_components_are_dropped() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.png"), "photo.png");
        assert_eq!(sanitize_filename("/var/tmp/a.gif"), "a.gif");
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_filename("bug\tnear  tree.jpg"), "bug_near_tree.jpg");
        assert_eq!(sanitize_filename("caf\u{e9}.png"), "caf_.png");
        assert_eq!(sanitize_filename("a;rm -rf $HOME.png"), "a_rm_-rf__HOME.png");
    }

    #[test]
    fn test_hidden_and_traversal_names_fall_back() {
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("../.."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("dir/"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("   "), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("\u{1F41B}"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".bashrc"), "bashrc");
    }

    #[test]
    fn test_sanitized_names_never_contain_unsafe_characters() {
        let samples = [
            "../../secret.png",
            "a/b\\c.png",
            "<script>.png",
            "name with spaces.gif",
            "\0null.png",
            "..\\..\\win.ini",
            "%2e%2e%2fetc.png",
            "",
        ];

        for sample in samples {
            let sanitized = sanitize_filename(sample);
            assert!(!sanitized.is_empty(), "empty result for {:?}", sample);
            assert!(
                sanitized
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
                "unsafe result {:?} for {:?}",
                sanitized,
                sample
            );
            assert!(!sanitized.contains(".."), "traversal in {:?}", sanitized);
        }
    }

    #[test]
    fn test_storage_key_format() {
        assert_eq!(timestamp(instant()), "20240601T090507");
        assert_eq!(
            storage_key("../lantern fly.png", instant()),
            "20240601T090507-lantern_fly.png"
        );
        assert_eq!(storage_key("", instant()), "20240601T090507-upload");
    }

    #[test]
    fn test_keys_sort_chronologically() {
        let earlier = storage_key("z.png", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let later = storage_key("a.png", Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert!(later > earlier);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(instant());
        assert_eq!(clock.now(), instant());
        assert!(SystemClock.now() > instant());
    }
}
