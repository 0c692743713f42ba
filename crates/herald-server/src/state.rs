use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use herald::agent::Agent;
use herald::session::Session;
use tokio::sync::{Mutex, OnceCell};

type AgentFactory = dyn Fn() -> anyhow::Result<Agent> + Send + Sync;

/// Lazily built agent shared by every request
///
/// The factory runs on first use. Concurrent first requests wait on the same initialization,
/// and a failed build is retried by the next request.
#[derive(Clone)]
pub struct AgentHandle {
    cell: Arc<OnceCell<Arc<Agent>>>,
    factory: Arc<AgentFactory>,
}

impl AgentHandle {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Agent> + Send + Sync + 'static,
    {
        Self {
            cell: Arc::new(OnceCell::new()),
            factory: Arc::new(factory),
        }
    }

    pub async fn get(&self) -> anyhow::Result<Arc<Agent>> {
        let agent = self
            .cell
            .get_or_try_init(|| async { (self.factory)().map(Arc::new) })
            .await?;
        Ok(agent.clone())
    }
}

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct StoredSession {
    session: Arc<Mutex<Session>>,
    last_used: u64,
}

/// Conversations keyed by the caller's user id
///
/// At most `max_sessions` conversations are kept. Making room drops the one idle the longest.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, StoredSession>>>,
    clock: Arc<AtomicU64>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(AtomicU64::new(0)),
            max_sessions: max_sessions.max(1),
        }
    }

    /// The session for `user_id`, created on first use. Without an id the caller gets a fresh
    /// session that is not kept.
    pub async fn get(&self, user_id: Option<&str>) -> Arc<Mutex<Session>> {
        let Some(id) = user_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Arc::new(Mutex::new(Session::new()));
        };

        let mut sessions = self.sessions.lock().await;
        let now = self.clock.fetch_add(1, Ordering::Relaxed);
        if let Some(stored) = sessions.get_mut(id) {
            stored.last_used = now;
            return stored.session.clone();
        }

        if sessions.len() >= self.max_sessions {
            let idlest = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = idlest {
                tracing::debug!(user_id = %key, "evicting idle session");
                sessions.remove(&key);
            }
        }

        let session = Arc::new(Mutex::new(Session::new()));
        sessions.insert(
            id.to_string(),
            StoredSession {
                session: session.clone(),
                last_used: now,
            },
        );
        session
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: AgentHandle,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(agent: AgentHandle) -> Self {
        Self {
            agent,
            sessions: SessionStore::default(),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald::providers::mock::MockProvider;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_agent_is_built_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let handle = AgentHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Agent::new(Box::new(MockProvider::new(vec![])), "instructions"))
        });

        let first = handle.get().await.unwrap();
        let second = handle.clone().get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let handle = AgentHandle::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("endpoint unreachable");
            }
            Ok(Agent::new(Box::new(MockProvider::new(vec![])), "instructions"))
        });

        assert!(handle.get().await.is_err());
        assert!(handle.get().await.is_ok());
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sessions_by_user_id() {
        let store = SessionStore::default();

        let alice = store.get(Some("alice")).await;
        let alice_again = store.get(Some(" alice ")).await;
        let bob = store.get(Some("bob")).await;
        assert!(Arc::ptr_eq(&alice, &alice_again));
        assert!(!Arc::ptr_eq(&alice, &bob));

        let first = store.get(None).await;
        let second = store.get(Some("  ")).await;
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.sessions.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_full_store_evicts_idlest_session() {
        let store = SessionStore::with_capacity(2);

        let alice = store.get(Some("alice")).await;
        let _bob = store.get(Some("bob")).await;
        // alice is used again, so bob is now the idlest
        assert!(Arc::ptr_eq(&alice, &store.get(Some("alice")).await));

        let _carol = store.get(Some("carol")).await;

        assert_eq!(store.sessions.lock().await.len(), 2);
        assert!(Arc::ptr_eq(&alice, &store.get(Some("alice")).await));
        let bob_again = store.get(Some("bob")).await;
        assert!(bob_again.lock().await.messages().is_empty());
        assert_eq!(store.sessions.lock().await.len(), 2);
    }
}
