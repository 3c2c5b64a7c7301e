use tokio::task::JoinHandle;

/// Tracks the tasks tied to one open socket (reader, heartbeat, liveness)
pub struct TaskManager {
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Track an already spawned task
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Number of tracked tasks that are still running
    pub fn active(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in &self.handles {
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

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_abort_all_stops_tracked_tasks() {
        let mut tasks = TaskManager::new();
        tasks.track(tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }));
        tasks.track(tokio::spawn(std::future::pending::<()>()));
        assert_eq!(tasks.active(), 2);

        tasks.abort_all();
        assert_eq!(tasks.active(), 0);

        // Idempotent
        tasks.abort_all();
    }
}
