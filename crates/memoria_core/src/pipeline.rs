//! Restyling pipeline result types.

use serde::{Deserialize, Serialize};

/// Which strategy in the chain produced a result.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Generative restyling service
    #[display("remote")]
    Remote,
    /// Deterministic local filter chain
    #[display("local")]
    Local,
}

/// Whether a restyle produced an output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// An output was stored
    #[display("success")]
    Success,
    /// Every strategy failed
    #[display("failure")]
    Failure,
}

/// Cached record of one restyle of one source.
///
/// # Examples
///
/// ```
/// use memoria_core::{Outcome, PipelineResult, StrategyKind};
///
/// let result = PipelineResult::builder()
///     .source_hash("ab12")
///     .strategy_used(StrategyKind::Local)
///     .output_key(Some("ab12.restyled.png".to_string()))
///     .outcome(Outcome::Success)
///     .build()
///     .unwrap();
/// assert!(result.is_success());
/// assert!(result.error_detail.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct PipelineResult {
    /// Content hash of the Original that was restyled
    pub source_hash: String,
    /// Strategy that produced the outcome (the last one tried on failure)
    pub strategy_used: StrategyKind,
    /// Key of the stored derivative
    #[builder(default)]
    pub output_key: Option<String>,
    /// Success or failure
    pub outcome: Outcome,
    /// Underlying error on failure
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl PipelineResult {
    /// Creates a new builder.
    pub fn builder() -> PipelineResultBuilder {
        PipelineResultBuilder::default()
    }

    /// True when an output was stored.
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// One item that could not be restyled in a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    /// Source key
    pub key: String,
    /// Why it failed
    pub error_detail: String,
}

/// Per-item report of a bulk restyle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    /// Source keys that now have a restyled output
    pub succeeded: Vec<String>,
    /// Source keys that could not be restyled
    pub failed: Vec<BulkFailure>,
    /// True when the run stopped early on cancellation
    pub cancelled: bool,
}

impl BulkReport {
    /// Number of items the report covers.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
