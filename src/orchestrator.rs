//! Reconciliation run
//!
//! One run walks `Start → SessionAcquired → Fetching → PerFactLoop →
//! SessionReleasing → Done`. Login and fetch failures are fatal; everything
//! that goes wrong for a single fact is logged, counted, and skipped.
//!
//! The session is released on every path that got past login, including a
//! fatal fetch: all post-login work runs in [`Orchestrator::run_with_session`]
//! and its result is held until the logout has been issued.

use crate::attributes::AttributeSync;
use crate::config::Credentials;
use crate::error::SyncError;
use crate::facts::{Fact, FactSource};
use crate::inventory::InventoryApi;
use crate::mapping::FactMapper;
use crate::resolver::{HostResolver, Resolution};
use crate::session::{Session, SessionManager};

/// Run lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    SessionAcquired,
    Fetching,
    PerFactLoop,
    SessionReleasing,
    Done,
    AbortedFatal,
}

impl RunState {
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Start, SessionAcquired)
                | (SessionAcquired, Fetching)
                | (Fetching, PerFactLoop)
                | (PerFactLoop, SessionReleasing)
                | (SessionReleasing, Done)
                | (Start | SessionAcquired | Fetching, AbortedFatal)
                // fatal fetch: release first, then abort
                | (Fetching, SessionReleasing)
                | (SessionReleasing, AbortedFatal)
        )
    }
}

/// Tracks the current state and logs each transition
#[derive(Debug)]
struct StateTracker {
    current: RunState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: RunState::Start,
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal run transition {:?} -> {:?}",
            self.current,
            next
        );
        tracing::debug!(from = ?self.current, to = ?next, "Run state");
        self.current = next;
    }
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Facts returned by the feed
    pub facts: usize,
    /// Fact name not in the mapping table
    pub unmapped: usize,
    /// No inventory record matched the host identifier
    pub unresolved: usize,
    /// More than one inventory record matched
    pub ambiguous: usize,
    /// The inventory search itself failed
    pub lookup_failed: usize,
    pub applied: usize,
    pub apply_failed: usize,
}

impl RunReport {
    /// Facts that did not result in a successful update
    pub fn skipped(&self) -> usize {
        self.unmapped + self.unresolved + self.ambiguous + self.lookup_failed + self.apply_failed
    }

    fn log(&self) {
        tracing::info!(
            facts = self.facts,
            applied = self.applied,
            unmapped = self.unmapped,
            unresolved = self.unresolved,
            ambiguous = self.ambiguous,
            lookup_failed = self.lookup_failed,
            apply_failed = self.apply_failed,
            "Reconciliation run complete"
        );
    }
}

/// Drives one reconciliation run
pub struct Orchestrator<'a, F: ?Sized, I: ?Sized> {
    facts: &'a F,
    mapper: &'a FactMapper,
    sessions: SessionManager<'a, I>,
    resolver: HostResolver<'a, I>,
    sync: AttributeSync<'a, I>,
}

impl<'a, F, I> Orchestrator<'a, F, I>
where
    F: FactSource + ?Sized,
    I: InventoryApi + ?Sized,
{
    pub fn new(
        facts: &'a F,
        inventory: &'a I,
        mapper: &'a FactMapper,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            facts,
            mapper,
            sessions: SessionManager::new(inventory, credentials),
            resolver: HostResolver::new(inventory),
            sync: AttributeSync::new(inventory),
        }
    }

    /// Execute a full run
    pub async fn run(&self) -> Result<RunReport, SyncError> {
        let mut state = StateTracker::new();

        let session = match self.sessions.acquire().await {
            Ok(session) => session,
            Err(e) => {
                state.advance(RunState::AbortedFatal);
                return Err(SyncError::Auth(e));
            }
        };
        state.advance(RunState::SessionAcquired);

        let outcome = self.run_with_session(&session, &mut state).await;

        state.advance(RunState::SessionReleasing);
        self.sessions.release(session).await;

        match outcome {
            Ok(report) => {
                state.advance(RunState::Done);
                report.log();
                Ok(report)
            }
            Err(e) => {
                state.advance(RunState::AbortedFatal);
                Err(e)
            }
        }
    }

    async fn run_with_session(
        &self,
        session: &Session,
        state: &mut StateTracker,
    ) -> Result<RunReport, SyncError> {
        state.advance(RunState::Fetching);
        let facts = self.facts.fetch().await?;

        state.advance(RunState::PerFactLoop);
        let mut report = RunReport {
            facts: facts.len(),
            ..RunReport::default()
        };
        for fact in &facts {
            self.process_fact(session, fact, &mut report).await;
        }
        Ok(report)
    }

    /// Map, resolve, and apply a single fact. Never fails the run.
    async fn process_fact(&self, session: &Session, fact: &Fact, report: &mut RunReport) {
        let Some(key) = self.mapper.map(&fact.name) else {
            report.unmapped += 1;
            return;
        };

        let resolution = match self.resolver.resolve(session, &fact.host_id).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::warn!(host = %fact.host_id, error = %e, "Inventory search failed, skipping");
                report.lookup_failed += 1;
                return;
            }
        };

        let host = match resolution {
            Resolution::Resolved(host) => host,
            Resolution::Ambiguous(candidates) => {
                let ids: Vec<String> = candidates.iter().map(|c| c.id.to_string()).collect();
                tracing::info!(
                    host = %fact.host_id,
                    candidates = %ids.join(","),
                    "Multiple inventory records returned, skipping for safety"
                );
                report.ambiguous += 1;
                return;
            }
            Resolution::Unresolved => {
                tracing::debug!(host = %fact.host_id, "No inventory record, skipping");
                report.unresolved += 1;
                return;
            }
        };

        tracing::info!(
            key = %key,
            value = %fact.value,
            system = %host.name,
            system_id = %host.id,
            "Setting custom value"
        );
        match self.sync.apply(session, host.id, key, &fact.value).await {
            Ok(()) => report.applied += 1,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    system_id = %host.id,
                    error = %e,
                    "Failed to set custom value"
                );
                report.apply_failed += 1;
            }
        }
    }
}
