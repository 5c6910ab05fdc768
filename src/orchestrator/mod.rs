//! Fetch orchestrator: the impure shell around the state machine.
//!
//! Owns the current [`LogState`] and is driven by one dispatch loop. Fetches run
//! on spawned tokio tasks and report back through an unbounded channel; the loop
//! applies completions in arrival order with [`FetchOrchestrator::apply_completion`].
//!
//! Invariants:
//! - At most one in-flight fetch per section. A fetch is only issued for a
//!   NotStarted section that has no entry in the in-flight table.
//! - A cancelled provider call is fully dropped before the next call for the
//!   same section starts, so the provider never sees two calls for one key.
//! - A completion only mutates state when its [`FetchTicket`] still matches the
//!   in-flight table. Every `CreateSections` bumps the generation and cancels
//!   every outstanding fetch; `ResetSection` cancels that section's fetch.

mod policy;

pub use policy::AutoOpen;

use crate::model::{LogLine, ProviderError, SectionKey, SectionStatus, StateError};
use crate::source::LogProvider;
use crate::state::{reduce, LogAction, LogState, SearchOptions, UiEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identity of one fetch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Section list generation the fetch was issued under.
    pub generation: u64,
    /// Unique per issued fetch; tells a retry apart from its predecessor.
    pub attempt: u64,
    /// Section being fetched.
    pub key: SectionKey,
}

/// A resolved provider call.
#[derive(Debug)]
pub struct FetchCompletion {
    /// Identity of the request this answers.
    pub ticket: FetchTicket,
    /// Lines from the provider, or why it could not deliver them.
    pub result: Result<Vec<LogLine>, ProviderError>,
}

/// What [`FetchOrchestrator::apply_completion`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Lines stored; section Loaded.
    Applied,
    /// Provider error recorded; section Error.
    Failed,
    /// Stale ticket; state untouched.
    Discarded,
}

#[derive(Debug)]
struct InFlight {
    attempt: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owner of the section store and of every outstanding provider call.
///
/// All state changes go through [`FetchOrchestrator::dispatch`] or the verbs
/// built on it; completions are folded back in with
/// [`FetchOrchestrator::apply_completion`].
pub struct FetchOrchestrator<P: LogProvider> {
    provider: Arc<P>,
    state: Arc<LogState>,
    generation: u64,
    next_attempt: u64,
    in_flight: HashMap<SectionKey, InFlight>,
    /// Cancelled fetch tasks, per key, that may still be unwinding.
    retiring: HashMap<SectionKey, JoinHandle<()>>,
    auto_open: AutoOpen,
    completions_tx: UnboundedSender<FetchCompletion>,
    completions_rx: UnboundedReceiver<FetchCompletion>,
}

impl<P: LogProvider> FetchOrchestrator<P> {
    /// Empty store, generation 0, default [`AutoOpen`] policy.
    pub fn new(provider: Arc<P>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            state: Arc::new(LogState::new()),
            generation: 0,
            next_attempt: 0,
            in_flight: HashMap::new(),
            retiring: HashMap::new(),
            auto_open: AutoOpen::default(),
            completions_tx,
            completions_rx,
        }
    }

    /// Sections [`FetchOrchestrator::create_sections`] fetches right away.
    pub fn with_auto_open(mut self, auto_open: AutoOpen) -> Self {
        self.auto_open = auto_open;
        self
    }

    /// Start from an empty store using these search options.
    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.state = Arc::new(LogState::with_search_options(options));
        self
    }

    // ===== Accessors =====

    /// Current state snapshot.
    pub fn state(&self) -> &Arc<LogState> {
        &self.state
    }

    /// Number of `CreateSections` dispatched so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Configured auto-open policy.
    pub fn auto_open(&self) -> AutoOpen {
        self.auto_open
    }

    /// Fetches issued and not yet completed or cancelled.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether a fetch for `key` is outstanding.
    pub fn is_in_flight(&self, key: &SectionKey) -> bool {
        self.in_flight.contains_key(key)
    }

    // ===== Dispatch =====

    /// Apply one action and run its side effects on outstanding fetches.
    ///
    /// `ToggleSection` goes through [`FetchOrchestrator::toggle_section`] and
    /// `FetchingSectionData` issues the fetch it announces, so the Loading
    /// status is always backed by an in-flight request.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations from the transition functions. State and
    /// in-flight fetches are untouched when an error is returned.
    pub fn dispatch(&mut self, action: LogAction) -> Result<(), StateError> {
        match action {
            LogAction::ToggleSection { key } => self.toggle_section(&key),
            LogAction::FetchingSectionData { key } => self.fetch_section(&key),
            other => self.apply(other),
        }
    }

    fn apply(&mut self, action: LogAction) -> Result<(), StateError> {
        let creates = matches!(action, LogAction::CreateSections { .. });
        let reset = match &action {
            LogAction::ResetSection { key } => Some(key.clone()),
            _ => None,
        };

        self.state = reduce(&self.state, action)?;

        if creates {
            self.generation += 1;
            self.cancel_all();
            debug!(generation = self.generation, "New section generation");
        }
        if let Some(key) = reset {
            self.cancel(&key);
        }
        Ok(())
    }

    /// Establish a new execution's sections and fetch the ones the
    /// [`AutoOpen`] policy selects.
    pub fn create_sections(&mut self, keys: Vec<SectionKey>) -> Result<(), StateError> {
        self.apply(LogAction::CreateSections { keys })?;

        let targets: Vec<SectionKey> = self
            .auto_open
            .select(self.state.len())
            .into_iter()
            .filter_map(|i| self.state.log_keys().get(i).cloned())
            .collect();
        for key in targets {
            self.open_section(&key)?;
        }
        Ok(())
    }

    /// User click on a section header.
    ///
    /// A NotStarted section is fetched and shown with a loading affordance;
    /// anything else just flips visibility.
    pub fn toggle_section(&mut self, key: &SectionKey) -> Result<(), StateError> {
        let status = self.state.require_section(key)?.status();
        if status == SectionStatus::NotStarted && !self.is_in_flight(key) {
            self.start_fetch(key)
        } else {
            self.apply(LogAction::ToggleSection { key: key.clone() })
        }
    }

    /// Make a section visible, fetching it if it was never loaded.
    pub fn open_section(&mut self, key: &SectionKey) -> Result<(), StateError> {
        let section = self.state.require_section(key)?;
        if section.status() == SectionStatus::NotStarted && !self.is_in_flight(key) {
            self.start_fetch(key)
        } else if !section.is_open() {
            self.apply(LogAction::ToggleSection { key: key.clone() })
        } else {
            Ok(())
        }
    }

    /// Reset a section and fetch it again. The only retry path.
    pub fn retry_section(&mut self, key: &SectionKey) -> Result<(), StateError> {
        self.apply(LogAction::ResetSection { key: key.clone() })?;
        self.open_section(key)
    }

    /// Translate a renderer event.
    pub fn handle_event(&mut self, event: UiEvent) -> Result<(), StateError> {
        match event {
            UiEvent::SectionClick(key) => self.toggle_section(&key),
            other => self.apply(LogAction::from(other)),
        }
    }

    // ===== Fetching =====

    /// Fetch a section unless a fetch for it is already outstanding.
    /// Visibility is left alone.
    fn fetch_section(&mut self, key: &SectionKey) -> Result<(), StateError> {
        self.state.require_section(key)?;
        if self.is_in_flight(key) {
            return Ok(());
        }
        self.spawn_fetch(key)
    }

    /// Fetch a section and open it so the loading affordance shows.
    fn start_fetch(&mut self, key: &SectionKey) -> Result<(), StateError> {
        self.spawn_fetch(key)?;
        if !self.state.require_section(key)?.is_open() {
            self.apply(LogAction::ToggleSection { key: key.clone() })?;
        }
        Ok(())
    }

    /// Mark the section Loading and spawn the provider call.
    ///
    /// Must be called from within a tokio runtime.
    fn spawn_fetch(&mut self, key: &SectionKey) -> Result<(), StateError> {
        self.apply(LogAction::FetchingSectionData { key: key.clone() })?;

        self.next_attempt += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            attempt: self.next_attempt,
            key: key.clone(),
        };
        let cancel = CancellationToken::new();
        let predecessor = self.retiring.remove(key);
        info!(
            key = %key,
            generation = ticket.generation,
            attempt = ticket.attempt,
            "Fetching section"
        );

        let provider = Arc::clone(&self.provider);
        let tx = self.completions_tx.clone();
        let fetch_key = key.clone();
        let task_cancel = cancel.clone();
        let attempt = ticket.attempt;
        let task = tokio::spawn(async move {
            let cancel = task_cancel;
            // The previous call for this key must be gone before this one starts.
            if let Some(previous) = predecessor {
                let _ = previous.await;
            }
            if cancel.is_cancelled() {
                debug!(key = %ticket.key, attempt = ticket.attempt, "Fetch cancelled before start");
                return;
            }

            let mut fetch = tokio::spawn(async move { provider.fetch(&fetch_key).await });

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    fetch.abort();
                    // Resolves once the provider future has been dropped.
                    let _ = (&mut fetch).await;
                    debug!(key = %ticket.key, attempt = ticket.attempt, "Fetch cancelled");
                }
                joined = &mut fetch => {
                    let result = joined.unwrap_or_else(|e| {
                        Err(ProviderError::Remote {
                            message: format!("Log provider task failed: {e}"),
                        })
                    });
                    // The receiver lives as long as the orchestrator.
                    let _ = tx.send(FetchCompletion { ticket, result });
                }
            }
        });
        self.in_flight.insert(
            key.clone(),
            InFlight {
                attempt,
                cancel,
                task,
            },
        );
        Ok(())
    }

    fn cancel(&mut self, key: &SectionKey) {
        if let Some(in_flight) = self.in_flight.remove(key) {
            debug!(key = %key, attempt = in_flight.attempt, "Cancelled in-flight fetch");
            self.retire(key.clone(), in_flight);
        }
    }

    fn cancel_all(&mut self) {
        let cancelled: Vec<(SectionKey, InFlight)> = self.in_flight.drain().collect();
        for (key, in_flight) in cancelled {
            self.retire(key, in_flight);
        }
    }

    /// Signal a fetch to stop and remember its task until the next fetch of
    /// the same key has waited for it.
    fn retire(&mut self, key: SectionKey, in_flight: InFlight) {
        in_flight.cancel.cancel();
        self.retiring.retain(|_, task| !task.is_finished());
        self.retiring.insert(key, in_flight.task);
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
            && self
                .in_flight
                .get(&ticket.key)
                .is_some_and(|in_flight| in_flight.attempt == ticket.attempt)
    }

    // ===== Completions =====

    /// Apply one completion if its ticket is still current.
    ///
    /// Provider errors become `SectionFailed`; they never escape.
    pub fn apply_completion(
        &mut self,
        completion: FetchCompletion,
    ) -> Result<CompletionOutcome, StateError> {
        let FetchCompletion { ticket, result } = completion;
        if !self.is_current(&ticket) {
            debug!(
                key = %ticket.key,
                generation = ticket.generation,
                current_generation = self.generation,
                attempt = ticket.attempt,
                "Discarding stale fetch completion"
            );
            return Ok(CompletionOutcome::Discarded);
        }
        self.in_flight.remove(&ticket.key);

        match result {
            Ok(lines) => {
                info!(key = %ticket.key, lines = lines.len(), "Section loaded");
                self.apply(LogAction::UpdateSectionData {
                    key: ticket.key,
                    lines,
                })?;
                Ok(CompletionOutcome::Applied)
            }
            Err(e) => {
                warn!(key = %ticket.key, error = %e, "Section fetch failed");
                self.apply(LogAction::SectionFailed {
                    key: ticket.key,
                    message: e.to_string(),
                })?;
                Ok(CompletionOutcome::Failed)
            }
        }
    }

    /// Wait for the next completion.
    ///
    /// Returns `None` without waiting when nothing is in flight and no
    /// completion is queued.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        if self.in_flight.is_empty() {
            return self.completions_rx.try_recv().ok();
        }
        self.completions_rx.recv().await
    }

    /// A queued completion, if any, without waiting.
    pub fn try_next_completion(&mut self) -> Option<FetchCompletion> {
        self.completions_rx.try_recv().ok()
    }

    /// Apply every queued completion. Returns how many changed state.
    pub fn pump(&mut self) -> Result<usize, StateError> {
        let mut applied = 0;
        while let Some(completion) = self.try_next_completion() {
            if self.apply_completion(completion)? != CompletionOutcome::Discarded {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Apply completions until no fetch is in flight.
    pub async fn settle(&mut self) -> Result<(), StateError> {
        while let Some(completion) = self.next_completion().await {
            self.apply_completion(completion)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
