use std::{future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::{task::JoinHandle, time::sleep};

type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Collapses bursts of calls into one invocation with the last call's arguments,
/// `delay` after that last call.
///
/// There is a single timer slot: each call cancels the pending timer. A timer
/// that fired has left the slot, so its action is never cancelled.
pub struct Debouncer<T> {
    delay: Duration,
    action: Action<T>,
    slot: Arc<Mutex<TimerSlot>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: Action<T> = Arc::new(move |args: T| -> BoxFuture<'static, ()> {
            Box::pin(action(args))
        });
        Self {
            delay,
            action,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    pub fn call(&self, args: T) {
        let action = Arc::clone(&self.action);
        let slot = Arc::clone(&self.slot);
        let delay = self.delay;

        let mut pending = self.slot.lock();
        pending.generation += 1;
        let generation = pending.generation;
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            {
                let mut slot = slot.lock();
                if slot.generation != generation {
                    return;
                }
                slot.timer = None;
            }
            action(args).await;
        });
        if let Some(previous) = pending.timer.replace(timer) {
            previous.abort();
        }
    }

    /// Drops the pending call. Returns true when one was waiting to fire.
    pub fn cancel(&self) -> bool {
        let mut pending = self.slot.lock();
        pending.generation += 1;
        match pending.timer.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> (Arc<Mutex<Vec<u32>>>, Debouncer<u32>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let debouncer = Debouncer::new(Duration::from_millis(300), move |n: u32| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().push(n);
            }
        });
        (calls, debouncer)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_into_last_call() {
        let (calls, debouncer) = recording();
        for n in 1..=5 {
            debouncer.call(n);
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_millis(400)).await;
        assert_eq!(*calls.lock(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn every_call_restarts_the_timer() {
        let (calls, debouncer) = recording();
        debouncer.call(1);
        sleep(Duration::from_millis(250)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(150)).await;
        assert!(calls.lock().is_empty());
        sleep(Duration::from_millis(200)).await;
        assert_eq!(*calls.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_calls_each_fire() {
        let (calls, debouncer) = recording();
        debouncer.call(1);
        sleep(Duration::from_millis(400)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(400)).await;
        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_call() {
        let (calls, debouncer) = recording();
        assert!(!debouncer.cancel());

        debouncer.call(1);
        sleep(Duration::from_millis(100)).await;
        assert!(debouncer.cancel());
        sleep(Duration::from_millis(400)).await;
        assert!(calls.lock().is_empty());

        debouncer.call(2);
        sleep(Duration::from_millis(400)).await;
        assert_eq!(*calls.lock(), vec![2]);
        assert!(!debouncer.cancel());
    }
}
