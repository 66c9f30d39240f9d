//! Download names for generated images.

/// Used when a prompt has nothing left after sanitizing.
pub const FALLBACK_NAME: &str = "generated-image";

const MAX_SLUG_LEN: usize = 50;

/// Turn a prompt into a file-name slug: lowercase, keep only `a-z`, `0-9`
/// and whitespace, turn each whitespace run into `-`, cap at 50 characters.
pub fn download_slug(prompt: &str) -> String {
    let mut slug = String::with_capacity(prompt.len().min(MAX_SLUG_LEN));
    let mut in_whitespace = false;
    for c in prompt.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_whitespace = false;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    if slug.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        slug
    }
}

pub fn download_file_name(prompt: &str, extension: &str) -> String {
    format!("{}.{}", download_slug(prompt), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_punctuation_is_dropped() {
        assert_eq!(download_slug("A Beautiful Sunset! (v2)"), "a-beautiful-sunset-v2");
    }

    #[test]
    fn test_empty_and_symbol_only_fall_back() {
        assert_eq!(download_slug(""), FALLBACK_NAME);
        assert_eq!(download_slug("!!! ???"), "-");
        assert_eq!(download_slug("***"), FALLBACK_NAME);
    }

    #[test]
    fn test_dropped_characters_do_not_split_whitespace_runs() {
        // "a ! b": the bang disappears before whitespace collapses
        assert_eq!(download_slug("a ! b"), "a-b");
    }

    #[test]
    fn test_edges_keep_hyphens() {
        assert_eq!(download_slug("  misty\tforest\n"), "-misty-forest-");
    }

    #[test]
    fn test_non_ascii_letters_are_removed() {
        assert_eq!(download_slug("Café Über 9"), "caf-ber-9");
    }

    #[test]
    fn test_truncates_to_fifty() {
        let prompt = "word ".repeat(30);
        let slug = download_slug(&prompt);
        assert_eq!(slug.len(), 50);
        assert!(slug.starts_with("word-word-"));
    }

    #[test]
    fn test_file_name_appends_extension() {
        assert_eq!(download_file_name("Red Fox", "png"), "red-fox.png");
        assert_eq!(download_file_name("", "jpg"), "generated-image.jpg");
    }

    proptest! {
        #[test]
        fn slug_is_bounded_and_clean(prompt in ".*") {
            let slug = download_slug(&prompt);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.len() <= 50);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.contains("--"));
        }
    }
}
