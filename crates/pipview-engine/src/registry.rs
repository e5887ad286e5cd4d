//! The set of live capture sessions.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use pipview_ipc::SessionId;

use crate::error::SessionError;
use crate::session::CaptureSession;
use crate::SessionResult;

/// Insertion-ordered collection of capture sessions, unique by identity.
///
/// Removal always waits for the session's own stop to complete before the
/// session leaves the collection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Arc<CaptureSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold existing sessions without starting them.
    pub fn with_sessions(sessions: impl IntoIterator<Item = Arc<CaptureSession>>) -> Self {
        let mut registry = Self::new();
        for session in sessions {
            if !registry.contains(&session) {
                registry.sessions.push(session);
            }
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<CaptureSession>> {
        self.sessions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CaptureSession>> {
        self.sessions.iter()
    }

    pub fn contains(&self, session: &Arc<CaptureSession>) -> bool {
        self.position(session).is_some()
    }

    /// Start every held session concurrently, without waiting.
    pub fn start_all(&self) {
        info!(count = self.sessions.len(), "Starting all sessions");

        for session in &self.sessions {
            let session = Arc::clone(session);
            tokio::spawn(async move {
                if let Err(e) = session.start().await {
                    warn!(session = %session.id(), "Failed to start session: {}", e);
                }
            });
        }
    }

    /// Append a session and start it.
    ///
    /// A session that fails to start is taken out again.
    #[instrument(name = "registry_add", skip(self, session), fields(session = %session.id()))]
    pub async fn add(&mut self, session: Arc<CaptureSession>) -> SessionResult<()> {
        if self.contains(&session) {
            debug!("Session already registered");
            return Ok(());
        }

        self.sessions.push(Arc::clone(&session));

        if let Err(e) = session.start().await {
            warn!("Session failed to start: {}", e);
            self.sessions.retain(|s| !Arc::ptr_eq(s, &session));
            return Err(e);
        }

        Ok(())
    }

    /// Close and remove the session at `index`.
    #[instrument(name = "registry_remove", skip(self))]
    pub async fn remove_at(&mut self, index: usize) -> SessionResult<Arc<CaptureSession>> {
        let session = self
            .sessions
            .get(index)
            .cloned()
            .ok_or(SessionError::IndexOutOfRange {
                index,
                len: self.sessions.len(),
            })?;

        let result = session.stop(true).await;
        self.sessions.remove(index);
        debug!(session = %session.id(), "Session removed");

        result.map(|()| session)
    }

    /// Close and remove `session`.
    pub async fn remove(&mut self, session: &Arc<CaptureSession>) -> SessionResult<()> {
        let index = self
            .position(session)
            .ok_or(SessionError::NotRegistered(session.id()))?;
        self.remove_at(index).await.map(|_| ())
    }

    /// Close and remove the session with the given id.
    pub async fn remove_by_id(&mut self, id: SessionId) -> SessionResult<()> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id() == id)
            .ok_or(SessionError::NotRegistered(id))?;
        self.remove_at(index).await.map(|_| ())
    }

    /// Close and remove every session, one at a time.
    #[instrument(name = "registry_remove_all", skip(self))]
    pub async fn remove_all(&mut self) {
        info!(count = self.sessions.len(), "Removing all sessions");

        while !self.sessions.is_empty() {
            if let Err(e) = self.remove_at(0).await {
                warn!("Session stopped with an error: {}", e);
            }
        }
    }

    fn position(&self, session: &Arc<CaptureSession>) -> Option<usize> {
        self.sessions.iter().position(|s| Arc::ptr_eq(s, session))
    }
}
