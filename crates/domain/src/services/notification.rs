//! Notification dispatch for trigger events.
//!
//! Provides the push transport abstraction and the dispatcher that fans a
//! trigger event out to every endpoint of its owner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{NotificationEndpoint, TriggerEvent};

/// Title of notifications sent for fired zones.
pub const REMINDER_TITLE: &str = "Location Reminder";

/// Title of the manual test notification.
pub const TEST_TITLE: &str = "Tactical Test";

/// Icon shown with every notification.
pub const DEFAULT_ICON: &str = "/icon.png";

/// Content of a push notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Uuid>,
}

impl PushMessage {
    /// Notification for a fired zone.
    pub fn for_trigger(event: &TriggerEvent) -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            body: event.message.clone(),
            icon: DEFAULT_ICON.to_string(),
            zone_id: Some(event.zone_id),
        }
    }

    /// Fixed test notification.
    pub fn test() -> Self {
        Self {
            title: TEST_TITLE.to_string(),
            body: "Push notifications are working.".to_string(),
            icon: DEFAULT_ICON.to_string(),
            zone_id: None,
        }
    }
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the push service.
    Delivered,
    /// The push service reports the subscription no longer exists. Terminal.
    Gone,
    /// Any other failure. Not retried, not terminal.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryOutcome::Gone)
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Gone => "gone",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }
}

/// Push transport.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    /// Delivers one message to one endpoint. Never panics on transport errors.
    async fn send(&self, endpoint: &NotificationEndpoint, message: &PushMessage) -> DeliveryOutcome;
}

/// Per-endpoint result of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub endpoint_id: Uuid,
    pub endpoint: String,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Whether the endpoint should be deleted.
    pub fn terminal(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// Sends trigger events to notification endpoints.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self { sender }
    }

    /// Delivers `event` to each endpoint owned by the event's owner.
    ///
    /// Endpoints of other users are skipped and do not appear in the result.
    pub async fn dispatch(
        &self,
        event: &TriggerEvent,
        endpoints: &[NotificationEndpoint],
    ) -> Vec<DeliveryReport> {
        let owned: Vec<NotificationEndpoint> = endpoints
            .iter()
            .filter(|e| {
                let owned = e.user_id == event.owner_id;
                if !owned {
                    warn!(
                        endpoint_id = %e.id,
                        owner_id = %event.owner_id,
                        "Skipping endpoint not owned by event owner"
                    );
                }
                owned
            })
            .cloned()
            .collect();

        self.send_to_all(&owned, &PushMessage::for_trigger(event))
            .await
    }

    /// Sends `message` to every endpoint concurrently. Results keep the input order.
    pub async fn send_to_all(
        &self,
        endpoints: &[NotificationEndpoint],
        message: &PushMessage,
    ) -> Vec<DeliveryReport> {
        let mut reports: Vec<DeliveryReport> = endpoints
            .iter()
            .map(|e| DeliveryReport {
                endpoint_id: e.id,
                endpoint: e.endpoint.clone(),
                outcome: DeliveryOutcome::Failed("delivery task did not complete".to_string()),
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (index, endpoint) in endpoints.iter().cloned().enumerate() {
            let sender = Arc::clone(&self.sender);
            let message = message.clone();
            tasks.spawn(async move {
                let outcome = sender.send(&endpoint, &message).await;
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => reports[index].outcome = outcome,
                Err(e) => warn!(error = %e, "Push delivery task failed"),
            }
        }

        for report in &reports {
            counter!("push_deliveries_total", "outcome" => report.outcome.label()).increment(1);
            match &report.outcome {
                DeliveryOutcome::Delivered => {
                    debug!(endpoint_id = %report.endpoint_id, "Push delivered")
                }
                DeliveryOutcome::Gone => {
                    warn!(endpoint_id = %report.endpoint_id, "Push endpoint gone")
                }
                DeliveryOutcome::Failed(reason) => warn!(
                    endpoint_id = %report.endpoint_id,
                    error = %reason,
                    "Push delivery failed"
                ),
            }
        }

        reports
    }
}

/// Push sender used when Web Push is disabled.
///
/// Every send is logged and reported as delivered. Nothing is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushSender;

#[async_trait::async_trait]
impl PushSender for LogPushSender {
    async fn send(&self, endpoint: &NotificationEndpoint, message: &PushMessage) -> DeliveryOutcome {
        tracing::info!(
            endpoint_id = %endpoint.id,
            title = %message.title,
            body = %message.body,
            "Push disabled, notification logged only"
        );
        DeliveryOutcome::Delivered
    }
}

/// Push sender for tests.
///
/// Logs and records every send. Outcomes can be scripted per endpoint URL;
/// unscripted endpoints are delivered.
#[derive(Debug, Default)]
pub struct MockPushSender {
    outcomes: Mutex<HashMap<String, DeliveryOutcome>>,
    sent: Mutex<Vec<(String, PushMessage)>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the outcome for an endpoint URL.
    pub fn with_outcome(self, endpoint: impl Into<String>, outcome: DeliveryOutcome) -> Self {
        self.outcomes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(endpoint.into(), outcome);
        self
    }

    /// Messages sent so far as `(endpoint URL, message)`.
    pub fn sent(&self) -> Vec<(String, PushMessage)> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, endpoint: &NotificationEndpoint, message: &PushMessage) -> DeliveryOutcome {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((endpoint.endpoint.clone(), message.clone()));

        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&endpoint.endpoint)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered);

        tracing::info!(
            endpoint_id = %endpoint.id,
            title = %message.title,
            outcome = outcome.label(),
            "Mock: Would send push notification"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn endpoint(user_id: Uuid, url: &str) -> NotificationEndpoint {
        NotificationEndpoint {
            id: Uuid::new_v4(),
            user_id,
            endpoint: url.to_string(),
            p256dh: "p256dh".to_string(),
            auth: "auth".to_string(),
            created_at: Utc::now(),
        }
    }

    fn event(owner_id: Uuid) -> TriggerEvent {
        TriggerEvent {
            zone_id: Uuid::new_v4(),
            owner_id,
            message: "Buy milk".to_string(),
        }
    }

    #[test]
    fn test_message_for_trigger() {
        let e = event(Uuid::new_v4());
        let message = PushMessage::for_trigger(&e);

        assert_eq!(message.title, "Location Reminder");
        assert_eq!(message.body, "Buy milk");
        assert_eq!(message.icon, "/icon.png");
        assert_eq!(message.zone_id, Some(e.zone_id));
    }

    #[test]
    fn test_test_message_serialization() {
        let json = serde_json::to_value(PushMessage::test()).unwrap();
        assert_eq!(json["title"], "Tactical Test");
        assert!(json.get("zoneId").is_none());
    }

    #[test]
    fn test_outcome_classification() {
        assert!(DeliveryOutcome::Delivered.is_success());
        assert!(!DeliveryOutcome::Delivered.is_terminal());
        assert!(DeliveryOutcome::Gone.is_terminal());
        assert!(!DeliveryOutcome::Gone.is_success());
        let failed = DeliveryOutcome::Failed("timeout".to_string());
        assert!(!failed.is_success());
        assert!(!failed.is_terminal());
    }

    // Scenario 6: one endpoint delivered, one gone; only the gone one is terminal.
    #[tokio::test]
    async fn test_dispatch_reports_each_endpoint() {
        let owner = Uuid::new_v4();
        let ep1 = endpoint(owner, "https://push.example.com/1");
        let ep2 = endpoint(owner, "https://push.example.com/2");
        let sender = Arc::new(
            MockPushSender::new().with_outcome(ep2.endpoint.clone(), DeliveryOutcome::Gone),
        );
        let dispatcher = NotificationDispatcher::new(sender.clone());

        let reports = dispatcher
            .dispatch(&event(owner), &[ep1.clone(), ep2.clone()])
            .await;

        let summary: Vec<(Uuid, bool)> = reports.iter().map(|r| (r.endpoint_id, r.success())).collect();
        assert_eq!(summary, vec![(ep1.id, true), (ep2.id, false)]);
        let terminal: Vec<Uuid> = reports
            .iter()
            .filter(|r| r.terminal())
            .map(|r| r.endpoint_id)
            .collect();
        assert_eq!(terminal, vec![ep2.id]);
        assert_eq!(sender.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_other_endpoints() {
        let owner = Uuid::new_v4();
        let endpoints: Vec<_> = (0..5)
            .map(|i| endpoint(owner, &format!("https://push.example.com/{}", i)))
            .collect();
        let sender = Arc::new(
            MockPushSender::new()
                .with_outcome(
                    "https://push.example.com/0",
                    DeliveryOutcome::Failed("connection refused".to_string()),
                )
                .with_outcome("https://push.example.com/3", DeliveryOutcome::Gone),
        );
        let dispatcher = NotificationDispatcher::new(sender);

        let reports = dispatcher.dispatch(&event(owner), &endpoints).await;

        let successes: Vec<bool> = reports.iter().map(DeliveryReport::success).collect();
        assert_eq!(successes, vec![false, true, true, false, true]);
        assert!(!reports[0].terminal());
        assert!(reports[3].terminal());
    }

    #[tokio::test]
    async fn test_dispatch_skips_foreign_endpoints() {
        let owner = Uuid::new_v4();
        let mine = endpoint(owner, "https://push.example.com/mine");
        let theirs = endpoint(Uuid::new_v4(), "https://push.example.com/theirs");
        let sender = Arc::new(MockPushSender::new());
        let dispatcher = NotificationDispatcher::new(sender.clone());

        let reports = dispatcher.dispatch(&event(owner), &[mine.clone(), theirs]).await;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].endpoint_id, mine.id);
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, mine.endpoint);
        assert_eq!(sent[0].1.body, "Buy milk");
    }

    #[tokio::test]
    async fn test_log_sender_delivers_and_keeps_nothing() {
        assert_eq!(std::mem::size_of::<LogPushSender>(), 0);

        let owner = Uuid::new_v4();
        let endpoints: Vec<_> = (0..20)
            .map(|i| endpoint(owner, &format!("https://push.example.com/{}", i)))
            .collect();
        let dispatcher = NotificationDispatcher::new(Arc::new(LogPushSender));

        for _ in 0..50 {
            let reports = dispatcher.dispatch(&event(owner), &endpoints).await;
            assert_eq!(reports.len(), 20);
            assert!(reports.iter().all(DeliveryReport::success));
        }
    }

    #[tokio::test]
    async fn test_dispatch_with_no_endpoints() {
        let dispatcher = NotificationDispatcher::new(Arc::new(MockPushSender::new()));
        let reports = dispatcher.dispatch(&event(Uuid::new_v4()), &[]).await;
        assert!(reports.is_empty());
    }
}
