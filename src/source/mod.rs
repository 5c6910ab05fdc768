//! Log data providers.
//!
//! A provider resolves one execution unit's complete line array. The
//! orchestrator calls it from a spawned task and cancels by dropping the
//! future, so implementations must not rely on running to completion.

use crate::model::{LogLine, ProviderError, SectionKey};
use async_trait::async_trait;

pub mod directory;

pub use directory::{discover_units, DirectoryProvider};

/// Source of per-unit log lines.
#[async_trait]
pub trait LogProvider: Send + Sync + 'static {
    /// Fetch every line of `key`.
    ///
    /// # Errors
    ///
    /// Any [`ProviderError`]; its `Display` text becomes the section's error message.
    async fn fetch(&self, key: &SectionKey) -> Result<Vec<LogLine>, ProviderError>;
}
