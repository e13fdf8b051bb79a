// src/slug.rs
use deunicode::deunicode;

/// URL-safe identifier derived from a human-readable name. Accented and
/// non-Latin letters are transliterated to ASCII first.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    slug
}

/// `slugify(text)`, or `fallback` when nothing usable is left.
pub fn slugify_or(text: &str, fallback: &str) -> String {
    let slug = slugify(text);
    if slug.is_empty() { fallback.to_string() } else { slug }
}

/// First of `base`, `base-2`, `base-3`, ... not present in `taken`.
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_joins_words() {
        assert_eq!(slugify("The Dark Knight"), "the-dark-knight");
    }

    #[test]
    fn drops_punctuation() {
        assert_eq!(slugify("Spider-Man: No Way Home!"), "spider-man-no-way-home");
        assert_eq!(slugify("Ocean's Eleven"), "oceans-eleven");
    }

    #[test]
    fn collapses_separators_and_trims() {
        assert_eq!(slugify("  --Sci_Fi   & Fantasy-- "), "sci-fi-fantasy");
    }

    #[test]
    fn accents_fold_to_ascii() {
        assert_eq!(slugify("Amélie"), "amelie");
        assert_eq!(slugify("Léon"), "leon");
        assert_ne!(slugify("Léon"), slugify("Lon"));
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
    }

    #[test]
    fn non_latin_scripts_are_transliterated() {
        let slug = slugify("বাংলা");
        assert!(!slug.is_empty());
        assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn empty_slugs_use_the_fallback() {
        assert_eq!(slugify_or("!!!", "movie"), "movie");
        assert_eq!(slugify_or("", "category"), "category");
        assert_eq!(slugify_or("Heat", "movie"), "heat");
    }

    #[test]
    fn taken_slugs_get_a_numeric_suffix() {
        assert_eq!(unique_slug("heat", &[]), "heat");

        let taken = vec!["heat".to_string(), "heat-2".to_string(), "heat-4".to_string()];
        assert_eq!(unique_slug("heat", &taken), "heat-3");
        assert_eq!(unique_slug("heated", &taken), "heated");
    }
}
