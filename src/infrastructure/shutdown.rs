use tokio::sync::watch;

/// Process-wide stop flag. Cloning shares the same flag.
#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

impl ShutdownListener {
    /// Resolves once shutdown was triggered, immediately if it already was.
    pub async fn notified(&mut self) {
        let _ = self.receiver.wait_for(|stopped| *stopped).await;
    }
}

/// Triggers `shutdown` on interrupt, and on SIGTERM where the platform has it.
pub fn install_signal_handlers(shutdown: Shutdown) {
    let interrupted = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "shutdown", "interrupted");
            interrupted.trigger();
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut terminate) => {
                    if terminate.recv().await.is_some() {
                        tracing::info!(target: "shutdown", "terminated");
                        shutdown.trigger();
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "shutdown", error = %err, "SIGTERM listener unavailable");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn late_listener_sees_trigger() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();
        shutdown.trigger();
        let mut late = shutdown.subscribe();

        timeout(Duration::from_secs(1), early.notified()).await.unwrap();
        timeout(Duration::from_secs(1), late.notified()).await.unwrap();
    }

    #[tokio::test]
    async fn listener_waits_until_triggered() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        assert!(timeout(Duration::from_millis(20), listener.notified()).await.is_err());
        shutdown.trigger();
        timeout(Duration::from_secs(1), listener.notified()).await.unwrap();
    }
}
