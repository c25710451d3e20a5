//! Connection pool — tracks all active connections, indexed by user.

use std::sync::Arc;

use dashmap::DashMap;

use pulse_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Thread-safe pool of all active connections on this instance.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User ID → handles (one user can have multiple connections).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_user
            .entry(handle.principal.user_id)
            .or_default()
            .push(handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(&conn_id)?;
        if let Some(mut connections) = self.by_user.get_mut(&handle.principal.user_id) {
            connections.retain(|c| c.id != conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_user
                    .remove_if(&handle.principal.user_id, |_, v| v.is_empty());
            }
        }
        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(&conn_id).map(|entry| entry.value().clone())
    }

    /// Gets all connections for a user, oldest first.
    pub fn user_connections(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::principal::Principal;
    use tokio::sync::mpsc;

    fn make_handle(principal: &Principal) -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(1);
        Arc::new(ConnectionHandle::new(principal.clone(), tx))
    }

    #[test]
    fn test_add_remove_maintains_user_index() {
        let pool = ConnectionPool::new();
        let principal = Principal::anonymous();
        let a = make_handle(&principal);
        let b = make_handle(&principal);
        pool.add(a.clone());
        pool.add(b.clone());

        assert_eq!(pool.connection_count(), 2);
        assert_eq!(pool.user_count(), 1);
        assert_eq!(pool.user_connections(principal.user_id).len(), 2);

        pool.remove(a.id);
        assert_eq!(pool.user_connections(principal.user_id).len(), 1);

        pool.remove(b.id);
        assert_eq!(pool.user_count(), 0);
        assert!(pool.get(b.id).is_none());
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let pool = ConnectionPool::new();
        assert!(pool.remove(ConnectionId::new()).is_none());
    }
}
