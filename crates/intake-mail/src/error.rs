//! Error type for `intake-mail`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The relay answered with a non-success status.
  #[error("mail relay rejected message ({status}): {body}")]
  Relay { status: u16, body: String },

  #[error("template error: {0}")]
  Template(#[from] askama::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
