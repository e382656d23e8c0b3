//! Merchant name extraction.

use crate::models::bill::UNKNOWN_MERCHANT;

/// The first non-empty line, trimmed, or [`UNKNOWN_MERCHANT`].
pub fn extract_merchant(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNKNOWN_MERCHANT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_line() {
        assert_eq!(extract_merchant("  Walmart Supercenter \nTotal: 3.00"), "Walmart Supercenter");
    }

    #[test]
    fn test_skips_blank_lines() {
        assert_eq!(extract_merchant("\n\n   \nCorner Cafe\n"), "Corner Cafe");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(extract_merchant(""), UNKNOWN_MERCHANT);
        assert_eq!(extract_merchant(" \n\t\n"), UNKNOWN_MERCHANT);
    }
}
