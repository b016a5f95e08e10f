//! Strategy trait.

use memoria_core::StrategyKind;
use memoria_error::MemoriaResult;

/// One way of turning source image bytes into restyled image bytes.
///
/// Strategies are pure with respect to storage: they receive bytes and return
/// bytes, and the pipeline owns persistence.
#[async_trait::async_trait]
pub trait RestyleStrategy: Send + Sync {
    /// Which kind of strategy this is, recorded in the pipeline result.
    fn kind(&self) -> StrategyKind;

    /// Restyle `source`, returning encoded image bytes.
    async fn apply(&self, source: &[u8]) -> MemoriaResult<Vec<u8>>;
}
