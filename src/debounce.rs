//! Debounce Module for the Example Playground
//!
//! A cancellable deferred task: `schedule` replaces any pending work and runs
//! the new task once the window has passed without another `schedule`.
//! Tasks are spawned with `tokio::task::spawn_local`, so scheduling must
//! happen inside a `LocalSet`.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `task` after the window unless rescheduled or cancelled first.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.cancel();
        let window = self.window;
        self.pending = Some(tokio::task::spawn_local(async move {
            sleep(window).await;
            task();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_runs() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(RefCell::new(Vec::new()));
                let mut debouncer = Debouncer::new(Duration::from_millis(100));

                for value in 1..=3 {
                    let fired = Rc::clone(&fired);
                    debouncer.schedule(move || fired.borrow_mut().push(value));
                    sleep(Duration::from_millis(50)).await;
                }
                assert!(fired.borrow().is_empty());

                sleep(Duration::from_millis(100)).await;
                assert_eq!(*fired.borrow(), vec![3]);
                assert!(!debouncer.is_pending());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_task() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(RefCell::new(false));
                {
                    let mut debouncer = Debouncer::new(Duration::from_millis(100));
                    let fired = Rc::clone(&fired);
                    debouncer.schedule(move || *fired.borrow_mut() = true);
                    assert!(debouncer.is_pending());
                }
                sleep(Duration::from_millis(500)).await;
                assert!(!*fired.borrow());
            })
            .await;
    }
}
