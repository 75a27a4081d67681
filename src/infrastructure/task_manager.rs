use crate::transport::ConnectionId;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;

/// Tracks the background task of every transport connection
pub struct TaskManager {
    handles: HashMap<ConnectionId, JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Spawn the task for `id` and track it
    pub fn spawn<F>(&mut self, id: ConnectionId, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(id, handle) {
            previous.abort();
        }
    }

    /// Stop tracking `id` and let its task run to completion on its own
    pub fn release(&mut self, id: ConnectionId) {
        self.handles.remove(&id);
    }

    /// Forget tasks that already finished
    pub fn prune(&mut self) {
        self.handles.retain(|_, handle| !handle.is_finished());
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Abort all tracked tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in self.handles.values() {
            handle.abort();
        }
        self.handles.clear();
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_prune_drops_finished_tasks() {
        let mut tasks = TaskManager::new();
        tasks.spawn(ConnectionId::new(1), async {});
        tasks.spawn(ConnectionId::new(2), std::future::pending());

        tokio::time::sleep(Duration::from_millis(20)).await;
        tasks.prune();

        assert_eq!(tasks.len(), 1);
        tasks.abort_all();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_release_does_not_abort() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut tasks = TaskManager::new();
        tasks.spawn(ConnectionId::new(1), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        tasks.release(ConnectionId::new(1));
        assert!(tasks.is_empty());
        assert!(rx.await.is_ok());
    }
}
