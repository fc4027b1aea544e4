use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error};

use super::conversation_state::{ConversationState, Sender};
use super::reply::{parse_reply, service_error_text};
use crate::config::{error_bubble, ChatConfig, CONNECTION_ERROR_TEXT};
use crate::webhook_client::ReplyService;

/// Owns the conversation and drives every exchange with the reply service.
///
/// State is published through a watch channel; the presentation layer only
/// ever holds receivers.
pub struct ConversationController {
    state: watch::Sender<ConversationState>,
    service: Arc<dyn ReplyService>,
    delivery_delay: Duration,
}

impl ConversationController {
    pub fn new(config: &ChatConfig, service: Arc<dyn ReplyService>) -> Self {
        let (state, _) = watch::channel(ConversationState::new(&config.greeting));

        Self {
            state,
            service,
            delivery_delay: config.delivery_delay,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Records the text currently typed into the input.
    pub fn set_input(&self, text: &str) {
        self.state.send_if_modified(|state| {
            if !state.accepts_input() || state.pending_input == text {
                return false;
            }
            state.pending_input = text.to_string();
            true
        });
    }

    /// Sends whatever is currently typed into the input.
    pub async fn submit(&self) {
        let text = self.state.borrow().pending_input.clone();
        self.send(&text).await;
    }

    /// Sends `text` and waits until the reply has been fully delivered.
    ///
    /// Blank text, or a call made while another exchange is still running,
    /// is ignored.
    pub async fn send(&self, text: &str) {
        let accepted = self.state.send_if_modified(|state| {
            if text.trim().is_empty() || !state.accepts_input() {
                return false;
            }
            state.push(Sender::User, text);
            state.pending_input.clear();
            state.busy = true;
            true
        });

        if !accepted {
            debug!("Ignoring send: blank input or exchange in progress");
            return;
        }

        match self.service.exchange(text).await {
            Ok(response) if response.is_success() => {
                let segments = parse_reply(&response.body);
                debug!("Reply split into {} segment(s)", segments.len());
                self.deliver(segments).await;
            }
            Ok(response) => {
                let message = service_error_text(&response.body);
                error!("Reply service returned {}: {}", response.status, message);
                self.finish_with_error(&message);
            }
            Err(e) => {
                error!("Webhook error: {}", e);
                self.finish_with_error(CONNECTION_ERROR_TEXT);
            }
        }
    }

    /// Appends the first segment right away and every following one after
    /// the delivery delay, with `busy` raised while each one is pending.
    async fn deliver(&self, segments: Vec<String>) {
        let mut segments = segments.into_iter();

        let Some(first) = segments.next() else {
            self.state.send_modify(|state| state.busy = false);
            return;
        };

        let remaining: Vec<String> = segments.collect();
        self.state.send_modify(|state| {
            state.push(Sender::Assistant, &first);
            state.busy = false;
            state.pending_segments = remaining.len();
        });

        for segment in remaining {
            self.state.send_modify(|state| state.busy = true);
            tokio::time::sleep(self.delivery_delay).await;
            self.state.send_modify(|state| {
                let message = state.push(Sender::Assistant, &segment);
                debug!(
                    "Delivered segment {}",
                    serde_json::to_string(message).unwrap_or_default()
                );
                state.busy = false;
                state.pending_segments -= 1;
            });
        }
    }

    fn finish_with_error(&self, text: &str) {
        self.state.send_modify(|state| {
            state.push(Sender::Assistant, &error_bubble(text));
            state.busy = false;
            state.pending_segments = 0;
        });
    }
}
