//! Slug derivation for catalog identifiers.
//!
//! Display names are free-form (and frequently Cyrillic); slugs are the
//! stable, URL-safe identifiers the rest of the catalog keys on. Derivation
//! is deterministic and pure — uniqueness is enforced by the store, not here.

use regex::Regex;
use std::sync::LazyLock;

/// Matches every maximal run of characters outside `[a-z0-9]`.
static NON_SLUG_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("[^a-z0-9]+").unwrap());

/// Transliterates a single lowercase Cyrillic character to Latin.
///
/// Returns `None` for characters outside the table, which pass through
/// unchanged. Hard and soft signs map to the empty string.
fn transliterate_char(c: char) -> Option<&'static str> {
    let mapped = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(mapped)
}

/// Transliterates Cyrillic text to Latin, lowercasing along the way.
fn transliterate(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match transliterate_char(c) {
            Some(mapped) => result.push_str(mapped),
            None => result.push(c),
        }
    }
    result
}

/// Derives a URL-safe slug from a display name.
///
/// Lowercases the input, transliterates Cyrillic characters through a fixed
/// table, collapses every run of characters outside `[a-z0-9]` into a single
/// `_`, and strips leading/trailing underscores.
///
/// The result can be empty (e.g. an all-punctuation name); callers that
/// require a usable identifier must reject that case.
///
/// # Examples
///
/// ```
/// use stockroom::slug::make_slug;
///
/// assert_eq!(make_slug("Canned Meat"), "canned_meat");
/// assert_eq!(make_slug("Мясная консервация"), "myasnaya_konservatsiya");
/// ```
#[must_use]
pub fn make_slug(name: &str) -> String {
    let translit = transliterate(name.trim());
    let slug = NON_SLUG_RUN.replace_all(&translit, "_");
    slug.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_latin() {
        assert_eq!(make_slug("Snacks"), "snacks");
        assert_eq!(make_slug("Canned Meat"), "canned_meat");
        assert_eq!(make_slug("5L Bottles"), "5l_bottles");
    }

    #[test]
    fn test_cyrillic_transliteration() {
        assert_eq!(make_slug("Еда"), "eda");
        assert_eq!(make_slug("Напитки"), "napitki");
        assert_eq!(make_slug("Мясная консервация"), "myasnaya_konservatsiya");
        assert_eq!(make_slug("Щи и борщ"), "schi_i_borsch");
    }

    #[test]
    fn test_hard_and_soft_signs_dropped() {
        assert_eq!(make_slug("Объект"), "obekt");
        assert_eq!(make_slug("Соль"), "sol");
    }

    #[test]
    fn test_punctuation_collapses_to_single_underscore() {
        assert_eq!(make_slug("dried -- fruit"), "dried_fruit");
        assert_eq!(make_slug("a...b"), "a_b");
    }

    #[test]
    fn test_edge_underscores_stripped() {
        assert_eq!(make_slug("  (snacks)  "), "snacks");
        assert_eq!(make_slug("!energy!"), "energy");
    }

    #[test]
    fn test_empty_result_for_unmappable_input() {
        assert_eq!(make_slug(""), "");
        assert_eq!(make_slug("!!!"), "");
        assert_eq!(make_slug("漢字"), "");
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let names = ["Canned Meat", "Мясная консервация", "a...b", "Соль"];
        for name in names {
            let once = make_slug(name);
            assert_eq!(make_slug(name), once);
            assert_eq!(make_slug(&once), once, "slug of a slug must be stable");
        }
    }

    #[test]
    fn test_output_character_set() {
        for name in ["Мясная консервация", "Газировка", "Быстрое приготовление"] {
            let slug = make_slug(name);
            assert!(!slug.is_empty());
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            assert!(!slug.starts_with('_') && !slug.ends_with('_'));
            assert!(!slug.contains("__"));
        }
    }
}
