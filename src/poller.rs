//! Background refresh of the unread-notification count and received
//! invitations.
//!
//! The first tick fires immediately, then every `interval`. Fetch failures
//! are logged and the loop carries on; the stores already record the error
//! in their slices. The loop ends when [`PollerHandle::shutdown`] is called
//! or the handle is dropped.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::gateway::{InvitationApi, NotificationApi};
use crate::store::{InvitationStore, NotificationStore};

/// Shortest period the poller accepts; `tokio::time::interval` panics on zero.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for an in-flight tick to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::debug!(error = %e, "poller task ended abnormally");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn spawn<G>(
    notifications: NotificationStore<G>,
    invitations: InvitationStore<G>,
    interval: Duration,
) -> PollerHandle
where
    G: NotificationApi + InvitationApi + ?Sized + 'static,
{
    if interval < MIN_INTERVAL {
        tracing::warn!(
            requested = ?interval,
            min = ?MIN_INTERVAL,
            "poll interval too short, clamping"
        );
    }
    let interval = interval.max(MIN_INTERVAL);
    let (tx, mut rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut rx => break,
                _ = ticker.tick() => poll_once(&notifications, &invitations).await,
            }
        }
        tracing::debug!("poller stopped");
    });
    PollerHandle {
        shutdown: Some(tx),
        task,
    }
}

async fn poll_once<G>(notifications: &NotificationStore<G>, invitations: &InvitationStore<G>)
where
    G: NotificationApi + InvitationApi + ?Sized,
{
    match notifications.fetch_unread_count().await {
        Ok(count) => tracing::debug!(count, "unread notifications"),
        Err(e) => tracing::warn!(error = %e, "failed to refresh unread count"),
    }
    if let Err(e) = invitations.fetch_invitations().await {
        tracing::warn!(error = %e, "failed to refresh invitations");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::store::AppState;
    use crate::store::invitation::fixtures::invitation;

    fn stores(
        gateway: &Arc<MemoryGateway>,
    ) -> (NotificationStore<MemoryGateway>, InvitationStore<MemoryGateway>) {
        let app = AppState::new();
        (
            NotificationStore::new(gateway.clone(), &app, 10),
            InvitationStore::new(gateway.clone(), &app),
        )
    }

    #[tokio::test]
    async fn first_tick_is_immediate() {
        let gateway =
            Arc::new(MemoryGateway::new().with_invitations(vec![invitation("i1", "Roadmap")]));
        let (notifications, invitations) = stores(&gateway);
        let mut rx = invitations.subscribe();

        let poller = spawn(notifications, invitations.clone(), Duration::from_secs(3600));
        tokio::time::timeout(Duration::from_secs(2), async {
            while rx.borrow_and_update().invitations.is_empty() {
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
        poller.shutdown().await;

        assert_eq!(invitations.state().pending_count(), 1);
        assert_eq!(
            gateway.calls(),
            vec!["GET notifications/unread-count", "GET invitations/received"]
        );
    }

    #[tokio::test]
    async fn keeps_polling_through_failures_until_shut_down() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_with(503, "Service unavailable");
        let (notifications, invitations) = stores(&gateway);

        let poller = spawn(notifications.clone(), invitations, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(110)).await;
        poller.shutdown().await;

        let ticks = gateway
            .calls()
            .iter()
            .filter(|c| c.as_str() == "GET notifications/unread-count")
            .count();
        assert!(ticks >= 2, "expected repeated polls, saw {}", ticks);
        assert_eq!(notifications.state().error.as_deref(), Some("Service unavailable"));

        let after = gateway.calls().len();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(gateway.calls().len(), after);
    }

    #[tokio::test]
    async fn zero_interval_is_clamped_instead_of_killing_the_task() {
        let gateway = Arc::new(MemoryGateway::new());
        let (notifications, invitations) = stores(&gateway);

        let poller = spawn(notifications, invitations, Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(60)).await;
        poller.shutdown().await;

        let ticks = gateway
            .calls()
            .iter()
            .filter(|c| c.as_str() == "GET notifications/unread-count")
            .count();
        assert!(ticks >= 2, "expected repeated polls, saw {}", ticks);
    }
}
