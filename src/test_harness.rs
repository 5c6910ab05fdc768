//! Shared fixtures for unit tests.
//!
//! State builders for the pure core, a scriptable [`MockProvider`] for
//! orchestrator tests and a buffer dump for rendering tests.

use crate::model::{LogLine, ProviderError, SectionKey};
use crate::source::LogProvider;
use crate::state::{reduce, LogAction, LogState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

// ===== State builders =====

pub fn key(raw: &str) -> SectionKey {
    SectionKey::new(raw).expect("test keys are non-empty")
}

pub fn keys(raw: &[&str]) -> Vec<SectionKey> {
    raw.iter().map(|k| key(k)).collect()
}

/// Apply an action that is expected to succeed.
pub fn apply(state: &Arc<LogState>, action: LogAction) -> Arc<LogState> {
    reduce(state, action).expect("action should apply")
}

/// Fresh state with these sections.
pub fn created(raw: &[&str]) -> Arc<LogState> {
    apply(
        &Arc::new(LogState::new()),
        LogAction::CreateSections { keys: keys(raw) },
    )
}

/// Deliver plain lines to a section.
pub fn load(state: &Arc<LogState>, section: &str, lines: &[&str]) -> Arc<LogState> {
    apply(
        state,
        LogAction::UpdateSectionData {
            key: key(section),
            lines: lines.iter().map(|l| LogLine::plain(*l)).collect(),
        },
    )
}

// ===== Mock provider =====

/// Scripted provider.
///
/// Responses are per key; unknown keys fail with `NotFound`. When gated, every
/// fetch blocks until [`MockProvider::release`] hands out a permit, which lets a
/// test hold fetches in flight and resolve them in any order.
#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<HashMap<SectionKey, Result<Vec<LogLine>, String>>>,
    gates: Mutex<HashMap<SectionKey, Arc<Semaphore>>>,
    gated: bool,
    active: Mutex<HashMap<SectionKey, usize>>,
    max_active: Mutex<HashMap<SectionKey, usize>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches wait for [`MockProvider::release`].
    pub fn gated() -> Self {
        Self {
            gated: true,
            ..Self::default()
        }
    }

    pub fn with_lines(self, section: &str, lines: &[&str]) -> Self {
        self.set_lines(section, lines);
        self
    }

    pub fn with_error(self, section: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(key(section), Err(message.to_string()));
        self
    }

    pub fn set_lines(&self, section: &str, lines: &[&str]) {
        self.responses.lock().unwrap().insert(
            key(section),
            Ok(lines.iter().map(|l| LogLine::plain(*l)).collect()),
        );
    }

    /// Let one waiting (or future) fetch of `section` proceed.
    pub fn release(&self, section: &str) {
        self.gate(&key(section)).add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous fetches ever seen for `section`.
    pub fn max_concurrent(&self, section: &str) -> usize {
        self.max_active
            .lock()
            .unwrap()
            .get(&key(section))
            .copied()
            .unwrap_or(0)
    }

    pub fn active(&self, section: &str) -> usize {
        self.active
            .lock()
            .unwrap()
            .get(&key(section))
            .copied()
            .unwrap_or(0)
    }

    fn gate(&self, key: &SectionKey) -> Arc<Semaphore> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(
            gates
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Semaphore::new(0))),
        )
    }
}

/// Counts a fetch as active until dropped (also on cancellation).
struct ActiveGuard<'a> {
    provider: &'a MockProvider,
    key: SectionKey,
}

impl<'a> ActiveGuard<'a> {
    fn enter(provider: &'a MockProvider, key: &SectionKey) -> Self {
        let mut active = provider.active.lock().unwrap();
        let count = active.entry(key.clone()).or_insert(0);
        *count += 1;
        let mut max = provider.max_active.lock().unwrap();
        let peak = max.entry(key.clone()).or_insert(0);
        *peak = (*peak).max(*count);
        Self {
            provider,
            key: key.clone(),
        }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        if let Some(count) = self.provider.active.lock().unwrap().get_mut(&self.key) {
            *count -= 1;
        }
    }
}

#[async_trait]
impl LogProvider for MockProvider {
    async fn fetch(&self, key: &SectionKey) -> Result<Vec<LogLine>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = ActiveGuard::enter(self, key);

        if self.gated {
            let gate = self.gate(key);
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ProviderError::Cancelled)?;
            permit.forget();
        }

        let response = self.responses.lock().unwrap().get(key).cloned();
        match response {
            Some(Ok(lines)) => Ok(lines),
            Some(Err(message)) => Err(ProviderError::Remote { message }),
            None => Err(ProviderError::NotFound { key: key.clone() }),
        }
    }
}

// ===== Rendering =====

/// Convert a ratatui buffer to text, one line per row, trailing blanks trimmed.
pub fn buffer_to_string(buffer: &ratatui::buffer::Buffer) -> String {
    let area = buffer.area();
    let mut lines = Vec::new();

    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
