//! Property-based tests for slug normalization

use coursegraph::compile::slug::normalize;
use proptest::prelude::*;

proptest! {
    /// Normalizing twice is the same as normalizing once.
    #[test]
    fn normalize_is_idempotent(input in ".{0,64}") {
        let once = normalize(&input);
        prop_assert_eq!(normalize(&once), once);
    }

    /// Output contains only lowercase alphanumerics and single dashes, with
    /// no dash at either end.
    #[test]
    fn normalize_output_is_a_well_formed_slug(input in ".{0,64}") {
        let slug = normalize(&input);
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        for ch in slug.chars() {
            prop_assert!(
                ch == '-' || (ch.is_alphanumeric() && !ch.is_uppercase()),
                "unexpected character {:?} in {:?}",
                ch,
                slug
            );
        }
    }

    /// ASCII titles lose nothing but case and punctuation.
    #[test]
    fn ascii_words_survive(words in prop::collection::vec("[a-z]{1,8}", 1..5)) {
        let title = words.join(" ");
        prop_assert_eq!(normalize(&title), words.join("-"));
    }
}
