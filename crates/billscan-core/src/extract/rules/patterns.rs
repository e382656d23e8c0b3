//! Regex patterns for bill and receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Labeled total: "Total: $42.50", "AMOUNT DUE - 17,00", "Balance 9.99"
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i)(total|amount due|balance|payable)\s*[:\-\s]?\s*([\$€£]?\d+[.,]?\d*)"
    ).unwrap();

    // Numeric dates with slash or dash separators: 5/1/24, 05-01-2024
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"\b(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})\b"
    ).unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(
        r"[\$€£]"
    ).unwrap();
}
