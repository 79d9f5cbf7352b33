//! [Twilio Messages](https://www.twilio.com/docs/messaging/api/message-resource) client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{api::Messenger, prelude::*};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct Api {
    client: Client,
    base_url: Url,
    account_sid: String,
    auth_token: String,
}

impl Api {
    pub fn new(account_sid: String, auth_token: String, base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("callgate/", env!("CARGO_PKG_VERSION")))
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self { client, base_url, account_sid, auth_token })
    }

    #[instrument(skip_all, fields(to = to, from = from))]
    pub async fn create_message(&self, to: &str, from: &str, body: &str) -> Result<Message> {
        let url = self
            .base_url
            .join(&format!("2010-04-01/Accounts/{}/Messages.json", self.account_sid))
            .context("failed to build the Messages URL")?;
        info!(n_chars = body.chars().count(), "sending…");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", from), ("Body", body)])
            .send()
            .await
            .context("failed to call the Messages API")?;

        let status = response.status();
        if !status.is_success() {
            let error = response
                .json::<ErrorResponse>()
                .await
                .with_context(|| format!("the Messages API responded with `{status}`"))?;
            return Err(error.into_error());
        }

        let message = response
            .json::<Message>()
            .await
            .context("failed to deserialize the Messages API response")?;
        info!(sid = %message.sid, status = ?message.status, "sent");
        Ok(message)
    }
}

#[async_trait]
impl Messenger for Api {
    async fn send_text(&self, to: &str, from: &str, body: &str) -> Result<MessageStatus> {
        Ok(self.create_message(to, from, body).await?.status)
    }
}

#[must_use]
#[derive(Deserialize)]
pub struct Message {
    pub sid: String,
    pub status: MessageStatus,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Sending,
    Sent,
    Delivered,
    Undelivered,
    Failed,
    Receiving,
    Received,
    Accepted,
    Scheduled,
    Read,
    PartiallyDelivered,

    #[serde(alias = "cancelled")]
    Canceled,

    #[serde(other)]
    Unknown,
}

impl MessageStatus {
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Canceled | Self::Failed | Self::Undelivered)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    code: Option<u32>,
    message: String,
}

impl ErrorResponse {
    fn into_error(self) -> Error {
        match self.code {
            Some(code) => anyhow::anyhow!(r#"Twilio error {code} ("{}")"#, self.message),
            None => anyhow::anyhow!(r#"Twilio error ("{}")"#, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Form,
        Json,
        Router,
        extract::Path,
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        routing::post,
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    const ACCOUNT_SID: &str = "AC0123456789abcdef0123456789abcdef";

    async fn create_message(
        Path(account_sid): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let is_authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("Basic "));
        if account_sid != ACCOUNT_SID || !is_authorized {
            let body = json!({
                "code": 20404,
                "message": "The requested resource was not found",
                "more_info": "https://www.twilio.com/docs/errors/20404",
                "status": 404,
            });
            return (StatusCode::NOT_FOUND, Json(body));
        }
        let status = if form["Body"].is_empty() { "failed" } else { "queued" };
        let body = json!({
            "account_sid": account_sid,
            "body": form["Body"],
            "from": form["From"],
            "to": form["To"],
            "num_segments": "1",
            "sid": "SM0123456789abcdef0123456789abcdef",
            "status": status,
        });
        (StatusCode::CREATED, Json(body))
    }

    async fn serve_fake_api() -> Result<Url> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let app = Router::new()
            .route("/2010-04-01/Accounts/{account_sid}/Messages.json", post(create_message));
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(format!("http://{address}/").parse()?)
    }

    #[tokio::test]
    async fn test_create_message_ok() -> Result {
        let api = Api::new(ACCOUNT_SID.to_string(), "token".to_string(), serve_fake_api().await?)?;
        let message = api.create_message("+31201234567", "+31612345678", "Call me back").await?;
        assert_eq!(message.sid, "SM0123456789abcdef0123456789abcdef");
        assert_eq!(message.status, MessageStatus::Queued);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_text_reports_failure_status() -> Result {
        let api = Api::new(ACCOUNT_SID.to_string(), "token".to_string(), serve_fake_api().await?)?;
        let status = api.send_text("+31201234567", "+31612345678", "").await?;
        assert!(status.is_failure());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_message_error() -> Result {
        let api = Api::new("ACunknown".to_string(), "token".to_string(), serve_fake_api().await?)?;
        let error = api
            .create_message("+31201234567", "+31612345678", "Call me back")
            .await
            .err()
            .context("the request should have failed")?;
        assert_eq!(
            error.to_string(),
            r#"Twilio error 20404 ("The requested resource was not found")"#,
        );
        Ok(())
    }

    #[test]
    fn test_message_status_ok() -> Result {
        // language=json
        let body = r#"{
            "account_sid": "AC0123456789abcdef0123456789abcdef",
            "api_version": "2010-04-01",
            "body": "Hello",
            "date_created": "Thu, 24 Aug 2023 05:01:45 +0000",
            "direction": "outbound-api",
            "error_code": null,
            "error_message": null,
            "from": "+14155552345",
            "num_segments": "1",
            "price": null,
            "sid": "SM0123456789abcdef0123456789abcdef",
            "status": "undelivered",
            "to": "+14155552344"
        }"#;
        let message = serde_json::from_str::<Message>(body)?;
        assert_eq!(message.status, MessageStatus::Undelivered);
        assert!(message.status.is_failure());
        Ok(())
    }

    fn parse_status(status: &str) -> Result<MessageStatus> {
        Ok(serde_json::from_value(Value::String(status.to_string()))?)
    }

    #[test]
    fn test_message_status_spellings() -> Result {
        assert_eq!(parse_status("canceled")?, MessageStatus::Canceled);
        assert_eq!(parse_status("cancelled")?, MessageStatus::Canceled);
        assert_eq!(parse_status("partially_delivered")?, MessageStatus::PartiallyDelivered);
        assert_eq!(parse_status("teleported")?, MessageStatus::Unknown);
        assert!(!MessageStatus::Unknown.is_failure());
        assert!(!MessageStatus::Sent.is_failure());
        Ok(())
    }
}
