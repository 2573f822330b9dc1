//! In-memory session store. Nothing is persisted; sessions live until deleted
//! or until they sit idle longer than the configured TTL.
//!
//! The outer lock only guards the map. Each entry pairs a transition gate with
//! the published snapshot: the gate is held across a whole transition
//! (including collaborator calls) so transitions on one session are serialized,
//! while readers only touch the snapshot and never wait on a collaborator.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::Session;

/// Longest pause between two idle sweeps.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct Published {
    session: Session,
    /// Creation or last successful transition. Reads do not count.
    touched: Instant,
}

struct Entry {
    gate: Mutex<()>,
    current: RwLock<Published>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Entry>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Session {
        let session = Session::new();
        let entry = Entry {
            gate: Mutex::new(()),
            current: RwLock::new(Published {
                session: session.clone(),
                touched: Instant::now(),
            }),
        };
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(entry));
        info!(session_id = %session.id, "Session created");
        session
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<Entry>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// The last published value. Does not wait for an in-flight transition.
    pub async fn get(&self, id: Uuid) -> Result<Session, AppError> {
        let entry = self.entry(id).await?;
        let current = entry.current.read().await;
        Ok(current.session.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(_) => {
                info!(session_id = %id, "Session deleted");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    /// Runs a transition against the current value and publishes the result only
    /// on success. Transitions on the same session run one at a time.
    pub async fn transition<F, Fut>(&self, id: Uuid, step: F) -> Result<Session, AppError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<Session, AppError>>,
    {
        let entry = self.entry(id).await?;
        let _gate = entry.gate.lock().await;
        let snapshot = entry.current.read().await.session.clone();
        let next = step(snapshot).await?;
        *entry.current.write().await = Published {
            session: next.clone(),
            touched: Instant::now(),
        };
        Ok(next)
    }

    /// Drops sessions untouched for longer than `ttl`. Sessions with a transition
    /// in flight are skipped. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut idle = Vec::new();
        for (id, entry) in sessions.iter() {
            if entry.gate.try_lock().is_err() {
                continue;
            }
            if entry.current.read().await.touched.elapsed() > ttl {
                idle.push(*id);
            }
        }
        for id in &idle {
            sessions.remove(id);
            info!(session_id = %id, "Session expired");
        }
        idle.len()
    }

    /// Runs [`SessionStore::evict_idle`] periodically for the life of the process.
    pub fn spawn_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = ttl.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.evict_idle(ttl).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
