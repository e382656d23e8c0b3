//! Bill field extraction.

mod rule_based;
pub mod rules;

pub use rule_based::RuleExtractor;

use crate::error::Result;
use crate::models::bill::{ExtractedFields, ExtractionMode};

/// A text-to-fields pipeline selected per deployment.
///
/// Implementations hold only read-only state and are shared across
/// concurrently handled requests.
pub trait BillExtractor: Send + Sync {
    /// Extract fields from raw bill text.
    fn extract(&self, text: &str) -> Result<ExtractedFields>;

    /// The mode this extractor implements.
    fn mode(&self) -> ExtractionMode;
}
