//! Response publisher.
//!
//! Serialises [`Reply`] envelopes to JSON and hands them to a
//! [`MessageTransport`] on the configured response topic.  Replies to
//! commands are always attempted; click notifications are best-effort and
//! skipped while the link is down.

use log::{info, warn};

use crate::error::CommsError;

use super::events::Reply;
use super::ports::MessageTransport;

pub struct ResponsePublisher {
    topic: String,
}

impl ResponsePublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serialise and publish `reply`.
    pub fn publish(&self, transport: &mut impl MessageTransport, reply: &Reply) -> Result<(), CommsError> {
        let json = serde_json::to_vec(reply).map_err(|_| CommsError::EncodeFailed)?;
        info!("{} -> {}", self.topic, String::from_utf8_lossy(&json));
        transport.publish(&self.topic, &json)
    }

    /// Publish an unsolicited notification if a session is up.
    /// Returns `true` if it was handed to the transport.  Never queued.
    pub fn notify(&self, transport: &mut impl MessageTransport, reply: &Reply) -> bool {
        if !transport.is_connected() {
            return false;
        }
        match self.publish(transport, reply) {
            Ok(()) => true,
            Err(e) => {
                warn!("notification dropped: {}", e);
                false
            }
        }
    }
}
