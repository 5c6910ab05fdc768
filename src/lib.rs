//! pipelog
//!
//! Terminal viewer for the logs of a pipeline execution: one collapsible
//! section per execution unit, fetched on demand, with search across
//! everything loaded so far.
//!
//! The core (`model`, `state`, `view_state`) is pure and synchronous.
//! `orchestrator` runs provider fetches on tokio and feeds their results back
//! through the state machine; `view` is the terminal shell around it.

pub mod config;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod source;
pub mod state;
pub mod view;
pub mod view_state;

#[cfg(test)]
mod test_harness;
