use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};

use crate::errno::Errno;

/// A worker started through `Runtime::thread_spawn`.
///
/// Completion is signalled over a channel so callers can wait with a bound
/// instead of blocking on `join`.
pub struct WorkerHandle {
    done: Receiver<()>,
    join: Option<JoinHandle<()>>,
}

/// How a bounded wait on a worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Finished,
    /// The worker exited without signalling, i.e. it panicked.
    Aborted,
    TimedOut,
}

impl WorkerHandle {
    /// Spawn `task` on a named OS thread.
    pub fn spawn(name: &str, task: Box<dyn FnOnce() + Send + 'static>) -> Result<Self, Errno> {
        let (tx, rx) = channel::bounded(1);
        let join = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                task();
                let _ = tx.send(());
            })
            .map_err(|e| Errno::from_io(&e))?;

        Ok(Self {
            done: rx,
            join: Some(join),
        })
    }

    pub fn wait_timeout(&self, timeout: Duration) -> WaitStatus {
        match self.done.recv_timeout(timeout) {
            Ok(()) => WaitStatus::Finished,
            Err(RecvTimeoutError::Disconnected) => WaitStatus::Aborted,
            Err(RecvTimeoutError::Timeout) => WaitStatus::TimedOut,
        }
    }

    /// Join the worker. Only call after `wait_timeout` reported it finished or
    /// aborted; joining a live worker blocks.
    pub fn join(mut self) -> Result<(), Errno> {
        match self.join.take() {
            Some(handle) => handle.join().map_err(|_| Errno::Io),
            None => Ok(()),
        }
    }
}
