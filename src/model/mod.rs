//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod identifiers;
pub mod key_action;
pub mod log_line;
pub mod section;

// Re-export for convenience
pub use error::{AppError, ProviderError, StateError};
pub use identifiers::{InvalidSectionKey, SectionKey};
pub use key_action::KeyAction;
pub use log_line::{LineField, LogLevel, LogLine};
pub use section::{LogSection, SectionStatus};
