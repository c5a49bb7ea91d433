//! Category and subcategory naming.

use crate::error::CoreError;

pub const MAX_CATEGORY_NAME_LEN: usize = 80;

/// URL slug for a category name: lowercase ASCII alphanumerics joined by `-`.
///
/// ```
/// use bazaar_core::catalog::slugify;
///
/// assert_eq!(slugify("Home & Kitchen"), "home-kitchen");
/// assert_eq!(slugify("  T-Shirts  "), "t-shirts");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Validate a category or subcategory name and return its slug.
pub fn check_category_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "name: must be between 1 and {MAX_CATEGORY_NAME_LEN} characters"
        )));
    }
    let slug = slugify(trimmed);
    if slug.is_empty() {
        return Err(CoreError::Validation(
            "name: must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slugify("Men's  Footwear!!"), "men-s-footwear");
        assert_eq!(slugify("--Sale--"), "sale");
    }

    #[test]
    fn non_ascii_only_name_rejected() {
        assert_matches!(check_category_name("***"), Err(CoreError::Validation(_)));
        assert_matches!(check_category_name("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn valid_name_returns_slug() {
        assert_eq!(check_category_name("Home Decor").unwrap(), "home-decor");
    }
}
