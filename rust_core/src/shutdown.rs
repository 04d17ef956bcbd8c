//! Cooperative shutdown signal
//!
//! A `ShutdownTrigger` fires once; every cloned `Shutdown` observes it. The
//! tracking loop checks it between rounds and races it against the fetch
//! fan-out and the inter-round sleep.

use tokio::sync::watch;

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace stores the value even when every receiver is gone
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    ///
    /// If the trigger is dropped without firing, this never resolves.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_observed_by_clones() {
        let (trigger, shutdown) = Shutdown::channel();
        let mut other = shutdown.clone();
        assert!(!shutdown.is_triggered());

        trigger.trigger();

        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), other.wait())
            .await
            .expect("wait should resolve after trigger");
    }

    #[tokio::test]
    async fn test_dropped_trigger_never_resolves() {
        let (trigger, mut shutdown) = Shutdown::channel();
        drop(trigger);

        let res = tokio::time::timeout(Duration::from_millis(20), shutdown.wait()).await;
        assert!(res.is_err());
        assert!(!shutdown.is_triggered());
    }
}
