use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Owns a running poll loop. Dropping it aborts the loop.
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Signals the loop to exit and waits for the current cycle to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Runs `cycle` now and then once per `period` until the handle is stopped.
pub fn spawn<F, Fut>(period: Duration, mut cycle: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = stopped.changed() => {
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                }
                _ = timer.tick() => {
                    cycle().await;
                }
            }
        }

        debug!("Poll loop stopped");
    });

    PollHandle {
        shutdown,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn runs_immediately_and_repeats() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = spawn(Duration::from_millis(10), counting(&counter));

        tokio::time::sleep(Duration::from_millis(55)).await;
        assert!(!handle.is_finished());
        handle.stop().await;

        assert!(counter.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn no_cycles_after_stop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = spawn(Duration::from_millis(5), counting(&counter));

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await;
        let seen = counter.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn dropping_the_handle_aborts_the_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = spawn(Duration::from_millis(5), counting(&counter));
        tokio::time::sleep(Duration::from_millis(12)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }
}
