use serde::{Deserialize, Deserializer};

/// Normalizes free text by composing it into Unicode Normalization
/// Form C, collapsing every run of whitespace into a single space and
/// stripping leading and trailing whitespace.
///
/// ```
/// use feedback::normalization::normalize_text;
/// assert_eq!(normalize_text("  Đoàn \t\n Trường "), "Đoàn Trường");
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    let composed = text.as_ref().nfc().collect::<String>();

    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Counts characters the way length limits are enforced.
pub fn char_length(text: impl AsRef<str>) -> usize {
    text.as_ref().chars().count()
}

/// Deserializes a `String` after running it through `normalize_text`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(normalize_text(s))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use unicode_normalization::is_nfc;

    use super::{char_length, normalize_text};

    #[test]
    fn composes_decomposed_diacritics() {
        let decomposed = "Nguye\u{302}\u{303}n";

        assert_eq!(normalize_text(decomposed), "Nguyễn");
        assert_eq!(char_length(normalize_text(decomposed)), 6);
    }

    #[test]
    fn blank_text_becomes_empty() {
        assert_eq!(normalize_text(" \t\r\n "), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 2000, ..ProptestConfig::default()
        })]

        #[test]
        fn normalization_works(string in "(\\S.*\\S|\\S+)", space_before in "\\s*", space_after in "\\s*") {
            let normalized = normalize_text(format!("{}{}{}", space_before, string, space_after));

            prop_assert!(is_nfc(&normalized), "{:?} (normalized form of {:?}) is in NFC", normalized, string);

            prop_assert!(!normalized.starts_with(char::is_whitespace) && !normalized.ends_with(char::is_whitespace), "{:?} (normalized form of {:?}) has no leading or trailing whitespace", normalized, string);

            prop_assert!(!normalized.contains("  "), "{:?} (normalized form of {:?}) has no doubled spaces", normalized, string);

            prop_assert!(normalized.chars().all(|c| c == ' ' || !c.is_whitespace()), "{:?} (normalized form of {:?}) only uses plain spaces", normalized, string);
        }

        #[test]
        fn normalization_is_idempotent(string in ".*") {
            let once = normalize_text(&string);

            prop_assert_eq!(normalize_text(&once), once);
        }
    }
}
