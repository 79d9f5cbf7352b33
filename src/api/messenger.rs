use async_trait::async_trait;

use crate::{api::twilio::MessageStatus, prelude::*};

/// Sends text messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, to: &str, from: &str, body: &str) -> Result<MessageStatus>;
}
