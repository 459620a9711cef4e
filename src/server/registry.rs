//! Session registry
//!
//! Tracks connected clients and enforces the connection limit.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Bookkeeping for one connected client
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub connected_at: Instant,
    pub commands: u64,
}

/// Registry for tracking active sessions, shared by all session tasks
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<SocketAddr, SessionInfo>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `addr` unless `max_clients` sessions are already active.
    pub async fn try_register(&self, addr: SocketAddr, max_clients: usize) -> bool {
        let mut sessions = self.sessions.lock().await;
        if sessions.len() >= max_clients {
            return false;
        }

        sessions.insert(
            addr,
            SessionInfo {
                connected_at: Instant::now(),
                commands: 0,
            },
        );
        info!(
            "Registered client {} ({}/{} clients)",
            addr,
            sessions.len(),
            max_clients
        );
        true
    }

    pub async fn record_command(&self, addr: &SocketAddr) {
        if let Some(session) = self.sessions.lock().await.get_mut(addr) {
            session.commands += 1;
        }
    }

    pub async fn remove(&self, addr: &SocketAddr) -> Option<SessionInfo> {
        let removed = self.sessions.lock().await.remove(addr);
        if let Some(session) = &removed {
            info!(
                "Client {} disconnected after {} commands ({:?})",
                addr,
                session.commands,
                session.connected_at.elapsed()
            );
        }
        removed
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
