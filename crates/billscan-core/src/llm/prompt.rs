//! Extraction prompt for the generation endpoint.

use chrono::{Local, NaiveDate};

/// Prompt asking the model for the four bill fields as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPrompt(String);

impl ExtractionPrompt {
    /// Build the prompt with today's local date.
    pub fn new(text: &str) -> Self {
        Self::with_date(text, Local::now().date_naive())
    }

    pub fn with_date(text: &str, today: NaiveDate) -> Self {
        Self(format!(
            "Extract the following details from the provided text:\n\
             - Total Billed Amount\n\
             - Merchant Name\n\
             - Category\n\
             - Date\n\
             If any of these details is not present in the text, still produce a value for it; do not omit any field.\n\
             If the date is missing, use the current date ({today}). \
             If the merchant name is missing, use \"Unknown Merchant\". \
             If the category is missing, infer it from the text.\n\
             The text may contain several amounts; choose the one most likely to be the total billed amount.\n\
             Text:\n\
             {text}\n\
             \n\
             Provide the result in JSON format.\n",
            today = today.format("%Y-%m-%d"),
            text = text,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contents() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let prompt = ExtractionPrompt::with_date("ACME\nTotal: $3.00", date);
        let s = prompt.as_str();

        assert!(s.contains("Total Billed Amount"));
        assert!(s.contains("Merchant Name"));
        assert!(s.contains("Category"));
        assert!(s.contains("\"Unknown Merchant\""));
        assert!(s.contains("(2024-05-01)"));
        assert!(s.contains("ACME\nTotal: $3.00"));
        assert!(s.trim_end().ends_with("JSON format."));
    }
}
