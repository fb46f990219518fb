//! Subscription topic state machine.
//!
//! The push channel carries events for exactly one topic at a time.
//! Switching topics is a three-step sequence: unsubscribe the old topic
//! (skipped when there is none), reset all local graph state, subscribe
//! the new topic — so the stores are empty before the new topic's
//! bootstrap burst arrives.

use pb_core::{decode_frame, Event, EventBus};
use serde::Serialize;
use std::rc::Rc;

/// A control frame to send over the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OutboundFrame {
    Subscribe { id: String },
    Unsubscribe { id: String },
}

impl OutboundFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub struct SubscriptionRouter {
    topic: Option<String>,
    bus: Rc<EventBus>,
}

impl SubscriptionRouter {
    pub fn new(bus: Rc<EventBus>) -> Self {
        Self { topic: None, bus }
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Switch to `topic`. Returns the control frames to send, in order;
    /// local graph state is reset before this returns, so callers must
    /// send the frames before pumping any further inbound frames.
    ///
    /// Re-requesting the current topic skips the unsubscribe frame but
    /// still resets and re-subscribes, forcing a fresh bootstrap.
    pub fn request_subscribe(&mut self, topic: &str) -> Vec<OutboundFrame> {
        let mut frames = Vec::new();
        if let Some(current) = self.topic.as_deref() {
            if current != topic {
                frames.push(OutboundFrame::Unsubscribe { id: current.to_string() });
            }
        }
        self.bus.dispatch(&Event::ResetGraph);
        self.topic = Some(topic.to_string());
        frames.push(OutboundFrame::Subscribe { id: topic.to_string() });
        frames
    }

    /// Re-establish the subscription after a reconnect. The server
    /// forgot us with the connection and answers the new subscribe
    /// with a full snapshot, so this goes through the same
    /// reset-then-subscribe path as any other request — replaying the
    /// snapshot onto stale stores would leave outage-time updates and
    /// deletes unapplied.
    pub fn resubscribe(&mut self) -> Vec<OutboundFrame> {
        match self.topic.clone() {
            Some(topic) => self.request_subscribe(&topic),
            None => Vec::new(),
        }
    }

    /// Route one inbound text frame: decode and dispatch. A frame that
    /// fails to decode is logged and dropped; the channel stays open.
    pub fn handle_frame(&self, text: &str) {
        match decode_frame(text) {
            Ok(event) => self.bus.dispatch(&event),
            Err(err) => log::warn!("dropping inbound frame: {err}"),
        }
    }
}
