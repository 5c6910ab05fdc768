//! View-state layer: index math between the state store and the renderer.
//!
//! - `row_index`: RowIndex - prefix sums and reverse lookup via Fenwick tree
//! - `projector`: RowProjection - flat header/line row layout of a state

pub mod projector;
pub mod row_index;

pub use projector::{Row, RowProjection};
pub use row_index::RowIndex;
