use crate::database::store::{CatalogTx, StoreError};

/// Probes per allocation before giving up: the base form plus 99 numbered
/// suffixes. Collision chains longer than this mean something else is wrong.
pub const MAX_SLUG_ATTEMPTS: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum SlugError {
    #[error("no free slug for '{base}' after {attempts} attempts")]
    Exhausted { base: String, attempts: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Normalize a display name into a URL-safe token: lowercase ASCII
/// alphanumerics, every other run of characters collapsed to one hyphen,
/// no leading or trailing hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Find a slug for `name` that no space currently holds, probing on the
/// caller's transaction: the normalized base first, then `base-1`, `base-2`,
/// and so on. The check-then-insert sequence can still lose a race; the
/// UNIQUE constraint on `spaces.slug` is what actually arbitrates ties.
pub async fn unique_slug<T: CatalogTx>(tx: &mut T, name: &str) -> Result<String, SlugError> {
    let mut base = slugify(name);
    if base.is_empty() {
        // All-symbol names still need a routable identifier
        base = "space".to_string();
    }

    if !tx.slug_exists(&base).await? {
        return Ok(base);
    }

    for n in 1..MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, n);
        if !tx.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted {
        base,
        attempts: MAX_SLUG_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("City Central Park"), "city-central-park");
        assert_eq!(slugify("Fort St. George"), "fort-st-george");
    }

    #[test]
    fn collapses_symbol_runs_into_one_hyphen() {
        assert_eq!(slugify("a  -  b"), "a-b");
        assert_eq!(slugify("rock & roll!!! hall"), "rock-roll-hall");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  padded  "), "padded");
        assert_eq!(slugify("--already-slugged--"), "already-slugged");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(slugify("café łódź"), "caf-d");
        assert_eq!(slugify("日本庭園"), "");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Pier 39"), "pier-39");
    }

    #[test]
    fn output_alphabet_is_closed() {
        for name in ["Weird   ~~~ Name_#5", "  !!  ", "MiXeD CaSe 99"] {
            let slug = slugify(name);
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!slug.starts_with('-'));
            assert!(!slug.ends_with('-'));
        }
    }
}
