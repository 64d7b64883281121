use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use jiff::Timestamp;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use nerdherd_diagnosis::persist::DiagnosisEvent;
use nerdherd_diagnosis::session::{Collaborators, DiagnosisSession, SessionSettings};
use nerdherd_storage::RecordStore;

/// A live session. The mutex serializes turns.
pub type SessionHandle = Arc<Mutex<DiagnosisSession>>;

/// Upper bound on the time between idle-session sweeps.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Registry slot for one session.
pub struct SessionEntry {
    handle: SessionHandle,
    /// Unix seconds of the last lookup.
    last_active: AtomicI64,
}

impl SessionEntry {
    fn touch(&self, now: Timestamp) {
        self.last_active.store(now.as_second(), Ordering::Relaxed);
    }

    fn idle_for(&self, now: Timestamp) -> Duration {
        let secs = now.as_second() - self.last_active.load(Ordering::Relaxed);
        Duration::from_secs(secs.max(0).unsigned_abs())
    }
}

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub collaborators: Collaborators,
    pub settings: SessionSettings,
    pub events: mpsc::UnboundedSender<DiagnosisEvent>,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    /// Bearer token for `/admin`. Admin routes are closed when unset.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        collaborators: Collaborators,
        settings: SessionSettings,
        events: mpsc::UnboundedSender<DiagnosisEvent>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            store,
            collaborators,
            settings,
            events,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            admin_token: admin_token.map(Arc::from),
        }
    }

    pub async fn insert_session(&self, session: DiagnosisSession) -> SessionHandle {
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        let entry = SessionEntry {
            handle: Arc::clone(&handle),
            last_active: AtomicI64::new(Timestamp::now().as_second()),
        };
        self.sessions.write().await.insert(id, entry);
        handle
    }

    /// Look up a session and mark it active.
    pub async fn session(&self, id: Uuid) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id)?;
        entry.touch(Timestamp::now());
        Some(Arc::clone(&entry.handle))
    }

    /// Drop sessions not looked up for at least `ttl` as of `now`. A session
    /// with a turn in flight is kept. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration, now: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.idle_for(now) < ttl || entry.handle.try_lock().is_err());
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Sweep idle sessions in the background until the task is aborted.
    pub fn spawn_session_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let period = ttl.min(MAX_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                state.evict_idle(ttl, Timestamp::now()).await;
            }
        })
    }
}
