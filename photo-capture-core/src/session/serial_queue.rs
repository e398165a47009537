use std::sync::mpsc;
use std::thread;

use crate::models::error::CaptureError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A named worker thread that runs jobs one at a time, in submission order.
///
/// Dropping the queue lets already-submitted jobs finish, then joins the worker.
pub struct SerialQueue {
    label: String,
    sender: Option<mpsc::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SerialQueue {
    pub fn new(label: &str) -> Result<Self, CaptureError> {
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn {}: {}", label, e)))?;

        Ok(Self {
            label: label.to_string(),
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `job` without waiting for it.
    pub fn dispatch<F>(&self, job: F) -> Result<(), CaptureError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .as_ref()
            .ok_or_else(|| self.stopped())?
            .send(Box::new(job))
            .map_err(|_| self.stopped())
    }

    /// Queue `f` and block until it has run, returning its result.
    ///
    /// Must not be called from a job on this queue.
    pub fn sync<T, F>(&self, f: F) -> Result<T, CaptureError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.dispatch(move || {
            let _ = tx.send(f());
        })?;
        rx.recv().map_err(|_| self.stopped())
    }

    /// Whether the calling thread is this queue's worker.
    pub fn is_current(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|h| h.thread().id() == thread::current().id())
    }

    fn stopped(&self) -> CaptureError {
        CaptureError::Unknown(format!("{} is not running", self.label))
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            // Joining ourselves would never return.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn runs_jobs_in_order() {
        let queue = SerialQueue::new("test.queue").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let seen = Arc::clone(&seen);
            queue.dispatch(move || seen.lock().push(i)).unwrap();
        }
        queue.sync(|| ()).unwrap();

        assert_eq!(*seen.lock(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn sync_returns_value() {
        let queue = SerialQueue::new("test.queue").unwrap();
        assert_eq!(queue.sync(|| 6 * 7).unwrap(), 42);
    }

    #[test]
    fn jobs_run_on_named_thread() {
        let queue = SerialQueue::new("camera.session.queue").unwrap();
        let name = queue
            .sync(|| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(name.as_deref(), Some("camera.session.queue"));
        assert!(!queue.is_current());
    }

    #[test]
    fn drop_drains_pending_jobs() {
        let count = Arc::new(Mutex::new(0));
        {
            let queue = SerialQueue::new("test.queue").unwrap();
            for _ in 0..5 {
                let count = Arc::clone(&count);
                queue.dispatch(move || *count.lock() += 1).unwrap();
            }
        }
        assert_eq!(*count.lock(), 5);
    }
}
