//! Notification messages for accepted submissions, and the transports that
//! deliver them.
//!
//! [`compose`] turns a stored [`SubmissionRecord`](intake_core::record::SubmissionRecord)
//! into the submitter's receipt and the team alert. [`transport`] holds the
//! [`Mailer`](intake_core::mail::Mailer) implementations.

pub mod compose;
pub mod error;
pub mod transport;

pub use compose::Brand;
pub use error::{Error, Result};
pub use transport::{AnyMailer, HttpMailer, LogMailer};
