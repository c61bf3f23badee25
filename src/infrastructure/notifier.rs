use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BadgeAction {
    UpdateBadge,
}

/// Outbound signal consumed by the badge display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeMessage {
    pub action: BadgeAction,
    pub count: usize,
}

impl BadgeMessage {
    pub fn update(count: usize) -> Self {
        Self {
            action: BadgeAction::UpdateBadge,
            count,
        }
    }
}

/// Sending half handed to the pipeline; sending never blocks.
#[derive(Clone)]
pub struct BadgeNotifier {
    sender: mpsc::UnboundedSender<BadgeMessage>,
}

impl BadgeNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BadgeMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn update_badge(&self, count: usize) {
        if self.sender.send(BadgeMessage::update(count)).is_err() {
            tracing::warn!(target: "badge", count, "badge display is gone; update dropped");
        }
    }
}

/// Keeps the badge text of one page context.
pub struct BadgeDisplay {
    page: String,
    text: watch::Sender<String>,
}

impl BadgeDisplay {
    pub fn new(page: impl Into<String>) -> (Self, watch::Receiver<String>) {
        let (text, receiver) = watch::channel(String::new());
        (
            Self {
                page: page.into(),
                text,
            },
            receiver,
        )
    }

    pub fn spawn(self, mut messages: mpsc::UnboundedReceiver<BadgeMessage>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = messages.recv().await {
                self.apply(&message);
            }
            tracing::debug!(target: "badge", page = %self.page, "badge display stopped");
        })
    }

    fn apply(&self, message: &BadgeMessage) {
        match message.action {
            BadgeAction::UpdateBadge => {
                let text = message.count.to_string();
                tracing::info!(target: "badge", page = %self.page, badge = %text, "badge updated");
                self.text.send_replace(text);
            }
        }
    }
}
