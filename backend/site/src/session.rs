//! Per-visitor donation sessions.
//!
//! A session owns the ledger and submission flow for the one campaign the
//! visitor opened. Nothing is shared between sessions and nothing outlives the
//! process. Dropping a session is the server-side "navigate away"; a visitor
//! who leaves without saying so is dropped once the session sits idle longer
//! than the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use campaign_ledger::{Campaign, Ledger, SubmissionFlow};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{Result, SiteError};

pub struct Session {
    pub campaign: Campaign,
    pub ledger: Ledger,
    pub flow: SubmissionFlow,
    /// Bumped on every confirmation so a stale auto-acknowledge timer does
    /// not close a newer confirmation.
    pub confirmations: u64,
    /// Last visitor request that touched the session.
    pub last_seen: Instant,
}

impl Session {
    pub fn new(campaign: &Campaign) -> Self {
        Self {
            campaign: campaign.clone(),
            ledger: Ledger::initialize(campaign),
            flow: SubmissionFlow::new(campaign),
            confirmations: 0,
            last_seen: Instant::now(),
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_sessions,
            idle_ttl,
        }
    }

    /// Open a session on `campaign` and return its token. Idle sessions are
    /// evicted first so abandoned ones never hold a slot.
    pub async fn open(&self, campaign: &Campaign) -> Result<Uuid> {
        let mut sessions = self.sessions.lock().await;
        self.evict_locked(&mut sessions);
        if sessions.len() >= self.max_sessions {
            return Err(SiteError::SessionLimit);
        }
        let token = Uuid::new_v4();
        sessions.insert(token, Session::new(campaign));
        info!(%token, campaign = %campaign.slug, "session opened");
        Ok(token)
    }

    /// Run `f` against the session while holding the store lock and mark it
    /// as active. `f` must not block.
    pub async fn with<R>(&self, token: Uuid, f: impl FnOnce(&mut Session) -> Result<R>) -> Result<R> {
        self.access(token, true, f).await
    }

    /// Like [`SessionStore::with`] without refreshing `last_seen`; for
    /// server-side timers.
    pub async fn with_background<R>(
        &self,
        token: Uuid,
        f: impl FnOnce(&mut Session) -> Result<R>,
    ) -> Result<R> {
        self.access(token, false, f).await
    }

    async fn access<R>(
        &self,
        token: Uuid,
        touch: bool,
        f: impl FnOnce(&mut Session) -> Result<R>,
    ) -> Result<R> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&token)
            .ok_or_else(|| SiteError::SessionNotFound(token.to_string()))?;
        if touch {
            session.last_seen = Instant::now();
        }
        f(session)
    }

    /// Drop every session idle for longer than the TTL. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.evict_locked(&mut sessions)
    }

    fn evict_locked(&self, sessions: &mut HashMap<Uuid, Session>) -> usize {
        let before = sessions.len();
        sessions.retain(|token, session| {
            let keep = session.last_seen.elapsed() <= self.idle_ttl;
            if !keep {
                info!(%token, campaign = %session.campaign.slug, "idle session evicted");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn close(&self, token: Uuid) -> Result<()> {
        self.sessions
            .lock()
            .await
            .remove(&token)
            .map(|session| info!(%token, campaign = %session.campaign.slug, "session closed"))
            .ok_or_else(|| SiteError::SessionNotFound(token.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Return the flow to idle once the confirmation has been on screen for
/// `delay`, unless the session moved on or the server is shutting down.
pub fn schedule_acknowledge(
    store: Arc<SessionStore>,
    token: Uuid,
    confirmation: u64,
    delay: Duration,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(delay) => {
                let result = store
                    .with_background(token, |session| {
                        if session.confirmations == confirmation {
                            session.flow.acknowledge()?;
                        }
                        Ok(())
                    })
                    .await;
                if let Err(e) = result {
                    debug!(%token, "auto-acknowledge skipped: {e}");
                }
            }
        }
    });
}

/// Periodically evict idle sessions until `shutdown` fires.
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = store.evict_idle().await;
                    if evicted > 0 {
                        debug!(evicted, "session sweep");
                    }
                }
            }
        }
    });
}
