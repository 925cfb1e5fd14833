//! One-shot delayed jobs that can be cancelled, individually through the
//! returned [`TaskHandle`] or in bulk for everything an entity owns.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOwner {
    Plot(i32),
    Valve(i32),
    Node(i32),
}

struct PendingTask {
    owner: TaskOwner,
    abort: AbortHandle,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    tasks: HashMap<u64, PendingTask>,
}

#[derive(Clone, Default)]
pub struct TaskScheduler {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Clone)]
pub struct TaskHandle {
    id: u64,
    owner: TaskOwner,
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .finish()
    }
}

impl TaskHandle {
    pub fn is_pending(&self) -> bool {
        self.inner.lock().tasks.contains_key(&self.id)
    }

    /// Returns false if the job already ran or got cancelled
    pub fn cancel(&self) -> bool {
        match self.inner.lock().tasks.remove(&self.id) {
            Some(task) => {
                task.abort.abort();
                debug!(task_id = self.id, owner = ?self.owner, "Cancelled task");
                true
            }
            None => false,
        }
    }
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `job` once after `delay` on the current tokio runtime
    pub fn schedule<F>(&self, owner: TaskOwner, delay: Duration, job: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let registry = self.inner.clone();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.lock().tasks.remove(&id).is_some() {
                job();
            }
        });
        inner.tasks.insert(
            id,
            PendingTask {
                owner,
                abort: join.abort_handle(),
            },
        );

        TaskHandle {
            id,
            owner,
            inner: self.inner.clone(),
        }
    }

    pub fn cancel_owned_by(&self, owner: TaskOwner) -> usize {
        let mut inner = self.inner.lock();
        let ids: Vec<u64> = inner
            .tasks
            .iter()
            .filter(|(_, task)| task.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        for id in ids.iter() {
            if let Some(task) = inner.tasks.remove(id) {
                task.abort.abort();
            }
        }
        ids.len()
    }

    pub fn cancel_all(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.tasks.len();
        for (_, task) in inner.tasks.drain() {
            task.abort.abort();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().tasks.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_after_delay() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(
            TaskOwner::Plot(1),
            Duration::from_secs(5),
            counting_job(&counter),
        );
        assert!(handle.is_pending());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!handle.is_pending());
        assert!(!handle.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_runs() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(
            TaskOwner::Valve(3),
            Duration::from_secs(1),
            counting_job(&counter),
        );
        assert!(handle.cancel());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_by_owner() {
        let scheduler = TaskScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let delay = Duration::from_secs(1);

        scheduler.schedule(TaskOwner::Node(1), delay, counting_job(&counter));
        scheduler.schedule(TaskOwner::Node(1), delay, counting_job(&counter));
        scheduler.schedule(TaskOwner::Node(2), delay, counting_job(&counter));

        assert_eq!(scheduler.cancel_owned_by(TaskOwner::Node(1)), 2);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
