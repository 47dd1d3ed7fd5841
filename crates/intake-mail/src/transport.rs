//! [`Mailer`] implementations.

use std::time::Duration;

use intake_core::mail::{Mailer, OutboundMessage};
use reqwest::Client;

use crate::{Error, Result};

// ─── HTTP relay ──────────────────────────────────────────────────────────────

/// Delivers messages by POSTing them as JSON to a mail relay.
///
/// Clones share one [`reqwest::Client`].
#[derive(Clone)]
pub struct HttpMailer {
  client:    Client,
  relay_url: String,
  api_token: Option<String>,
}

impl HttpMailer {
  /// Every send is bounded by `timeout`.
  pub fn new(
    relay_url: impl Into<String>,
    api_token: Option<String>,
    timeout: Duration,
  ) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      relay_url: relay_url.into(),
      api_token,
    })
  }
}

impl Mailer for HttpMailer {
  type Error = Error;

  async fn send(&self, message: &OutboundMessage) -> Result<()> {
    let mut req = self.client.post(&self.relay_url).json(message);
    if let Some(token) = &self.api_token {
      req = req.bearer_auth(token);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Relay {
        status: status.as_u16(),
        body,
      });
    }

    tracing::debug!(subject = %message.subject, recipients = message.to.len(), "relayed message");
    Ok(())
  }
}

// ─── Log only ────────────────────────────────────────────────────────────────

/// Writes messages to the log instead of sending them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
  type Error = Error;

  async fn send(&self, message: &OutboundMessage) -> Result<()> {
    tracing::info!(
      to = %message.to.join(", "),
      reply_to = ?message.reply_to,
      subject = %message.subject,
      "mail relay not configured; message logged only"
    );
    tracing::debug!(body = %message.text_body, "message body");
    Ok(())
  }
}

// ─── Selected at startup ─────────────────────────────────────────────────────

/// The transport chosen by configuration.
#[derive(Clone)]
pub enum AnyMailer {
  Http(HttpMailer),
  Log(LogMailer),
}

impl AnyMailer {
  /// An HTTP relay when `relay_url` is set, otherwise the log transport.
  pub fn from_settings(
    relay_url: Option<&str>,
    api_token: Option<String>,
    timeout: Duration,
  ) -> Result<Self> {
    match relay_url {
      Some(url) if !url.trim().is_empty() => {
        Ok(Self::Http(HttpMailer::new(url.trim(), api_token, timeout)?))
      }
      _ => Ok(Self::Log(LogMailer)),
    }
  }
}

impl Mailer for AnyMailer {
  type Error = Error;

  async fn send(&self, message: &OutboundMessage) -> Result<()> {
    match self {
      AnyMailer::Http(m) => m.send(message).await,
      AnyMailer::Log(m) => m.send(message).await,
    }
  }
}
