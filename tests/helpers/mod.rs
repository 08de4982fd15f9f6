//! In-memory fact feed and inventory used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use factsync::{
    Credentials, Fact, FactSource, FactSourceError, InventoryApi, InventoryError, InventoryHost,
    SessionKey, SystemId,
};

pub const SESSION_KEY: &str = "5678xabc";

pub fn credentials() -> Credentials {
    Credentials {
        username: "factsync".to_string(),
        password: "secret".to_string(),
    }
}

pub fn host(id: i64, name: &str) -> InventoryHost {
    InventoryHost {
        id: SystemId(id),
        name: name.to_string(),
        hostname: format!("{}.example.com", name),
    }
}

// ============================================================================
// Log capture
// ============================================================================

/// Events recorded by [`capture_logs`], as (level, message)
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    /// Events whose message starts with `prefix`
    pub fn matching(&self, prefix: &str) -> Vec<(Level, String)> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, message)| message.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Record every event on this thread until the guard drops.
/// `#[tokio::test]` runs on a current-thread runtime, so the whole run is seen.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    (logs, tracing::subscriber::set_default(subscriber))
}

// ============================================================================
// Fact feed
// ============================================================================

pub struct FakeFeed {
    facts: Option<Vec<Fact>>,
    fetches: AtomicUsize,
}

impl FakeFeed {
    pub fn with_facts(facts: Vec<Fact>) -> Self {
        Self {
            facts: Some(facts),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A feed whose every fetch fails
    pub fn unreachable() -> Self {
        Self {
            facts: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FactSource for FakeFeed {
    async fn fetch(&self) -> Result<Vec<Fact>, FactSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.facts.clone().ok_or(FactSourceError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        })
    }
}

// ============================================================================
// Inventory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    Logout,
    Search(String),
    SetCustomValues {
        system: SystemId,
        values: BTreeMap<String, String>,
    },
}

#[derive(Default)]
pub struct FakeInventory {
    candidates: HashMap<String, Vec<InventoryHost>>,
    reject_login: bool,
    fail_logout: bool,
    failing_searches: HashSet<String>,
    /// 1-based indexes of setCustomValues calls that fail
    failing_applies: HashSet<usize>,
    apply_attempts: AtomicUsize,
    active_session: Mutex<Option<SessionKey>>,
    calls: Mutex<Vec<Call>>,
    attributes: Mutex<BTreeMap<SystemId, BTreeMap<String, String>>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a search result for `query`
    pub fn with_candidates(mut self, query: &str, hosts: Vec<InventoryHost>) -> Self {
        self.candidates.insert(query.to_string(), hosts);
        self
    }

    pub fn rejecting_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn failing_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    pub fn failing_apply(mut self, attempt: usize) -> Self {
        self.failing_applies.insert(attempt);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn logouts(&self) -> usize {
        self.count(|c| matches!(c, Call::Logout))
    }

    pub fn searches(&self) -> usize {
        self.count(|c| matches!(c, Call::Search(_)))
    }

    pub fn apply_calls(&self) -> Vec<(SystemId, BTreeMap<String, String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetCustomValues { system, values } => Some((system, values)),
                _ => None,
            })
            .collect()
    }

    /// Custom attributes currently stored per system
    pub fn attributes(&self) -> BTreeMap<SystemId, BTreeMap<String, String>> {
        self.attributes.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_session(&self, session: &SessionKey) -> Result<(), InventoryError> {
        match self.active_session.lock().unwrap().as_ref() {
            Some(active) if active == session => Ok(()),
            _ => Err(InventoryError::Fault {
                code: 2950,
                message: "Could not find session".to_string(),
            }),
        }
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn login(&self, username: &str, password: &str) -> Result<SessionKey, InventoryError> {
        self.record(Call::Login);
        if self.reject_login || username.is_empty() || password.is_empty() {
            return Err(InventoryError::Fault {
                code: 2950,
                message: "Either the password or username is incorrect.".to_string(),
            });
        }
        let key = SessionKey::new(SESSION_KEY);
        *self.active_session.lock().unwrap() = Some(key.clone());
        Ok(key)
    }

    async fn logout(&self, session: &SessionKey) -> Result<(), InventoryError> {
        self.record(Call::Logout);
        self.check_session(session)?;
        *self.active_session.lock().unwrap() = None;
        if self.fail_logout {
            return Err(InventoryError::Status {
                status: 500,
                body: "logout failed".to_string(),
            });
        }
        Ok(())
    }

    async fn search_by_name(
        &self,
        session: &SessionKey,
        query: &str,
    ) -> Result<Vec<InventoryHost>, InventoryError> {
        self.record(Call::Search(query.to_string()));
        self.check_session(session)?;
        if self.failing_searches.contains(query) {
            return Err(InventoryError::Status {
                status: 502,
                body: "Bad Gateway".to_string(),
            });
        }
        Ok(self.candidates.get(query).cloned().unwrap_or_default())
    }

    async fn set_custom_values(
        &self,
        session: &SessionKey,
        system: SystemId,
        values: &BTreeMap<String, String>,
    ) -> Result<(), InventoryError> {
        self.record(Call::SetCustomValues {
            system,
            values: values.clone(),
        });
        self.check_session(session)?;
        let attempt = self.apply_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_applies.contains(&attempt) {
            return Err(InventoryError::Fault {
                code: 1,
                message: format!("setCustomValues attempt {} rejected", attempt),
            });
        }
        self.attributes
            .lock()
            .unwrap()
            .entry(system)
            .or_default()
            .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}
