//! Outbound messages and the `Mailer` trait.

use std::future::Future;

use serde::Serialize;

/// One email-like message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
  pub to:          Vec<String>,
  pub subject:     String,
  pub text_body:   String,
  pub html_body:   Option<String>,
  pub reply_to:    Option<String>,
  /// Display name shown as the sender.
  pub sender_name: String,
}

/// A transport that delivers [`OutboundMessage`]s.
///
/// Delivery is best-effort. Callers decide what a failure means.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    message: &'a OutboundMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
