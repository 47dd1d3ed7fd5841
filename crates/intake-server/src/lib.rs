//! HTTP front end for the lead intake pipeline.
//!
//! Exposes an axum [`Router`] with the two verbs the site uses: `GET` for a
//! health probe and `POST` for form submissions. Both are mounted at `/` and
//! at `/exec`.

pub mod error;
pub mod lock;
pub mod pipeline;
pub mod response;

pub use error::IntakeError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Form, Router,
  extract::{State, rejection::FormRejection},
  http::{Method, StatusCode},
  response::{IntoResponse, Response},
  routing::get,
};
use intake_core::{
  layout::SheetLayout,
  mail::Mailer,
  store::SheetStore,
  validate::{PolicyKind, RawFields},
};
use intake_mail::Brand;
use serde::Deserialize;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use lock::WriteLock;
use pipeline::{IntakeService, IntakeSettings};
use response::{SUBMIT_FAILED_MESSAGE, SUBMIT_OK_MESSAGE, StatusBody};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `INTAKE__*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  #[serde(default = "default_collection")]
  pub collection:        String,
  #[serde(default)]
  pub policy:            PolicyKind,
  #[serde(default)]
  pub layout:            SheetLayout,
  #[serde(default = "default_lock_timeout_secs")]
  pub lock_timeout_secs: u64,
  pub brand:             Brand,
  #[serde(default)]
  pub mail:              MailConfig,
}

/// Outbound notification settings.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MailConfig {
  /// Relay endpoint. Messages are only logged when unset.
  pub relay_url:            Option<String>,
  pub api_token:            Option<String>,
  pub timeout_secs:         u64,
  pub confirmation_enabled: bool,
  pub team_enabled:         bool,
}

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      relay_url:            None,
      api_token:            None,
      timeout_secs:         10,
      confirmation_enabled: true,
      team_enabled:         true,
    }
  }
}

fn default_collection() -> String { "Contacts".to_owned() }

fn default_lock_timeout_secs() -> u64 { 20 }

impl ServerConfig {
  pub fn intake_settings(&self) -> IntakeSettings {
    IntakeSettings {
      policy:               self.policy.into(),
      layout:               self.layout,
      collection:           self.collection.clone(),
      lock_timeout:         Duration::from_secs(self.lock_timeout_secs),
      notify_timeout:       Duration::from_secs(self.mail.timeout_secs),
      confirmation_enabled: self.mail.confirmation_enabled,
      team_enabled:         self.mail.team_enabled,
      brand:                self.brand.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, M> {
  pub service: Arc<IntakeService<S, M>>,
}

impl<S, M> Clone for AppState<S, M> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
    }
  }
}

impl<S, M> AppState<S, M>
where
  S: SheetStore,
  M: Mailer,
{
  /// Wire a store and a mailer to a fresh deployment-wide write lock.
  pub fn new(store: Arc<S>, mailer: Arc<M>, settings: IntakeSettings) -> Self {
    Self {
      service: Arc::new(IntakeService::new(
        store,
        mailer,
        WriteLock::new(),
        settings,
      )),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the intake endpoints.
pub fn router<S, M>(state: AppState<S, M>) -> Router
where
  S: SheetStore + 'static,
  M: Mailer + 'static,
{
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

  Router::new()
    .route("/",     get(health::<S, M>).post(submit::<S, M>))
    .route("/exec", get(health::<S, M>).post(submit::<S, M>))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /`: liveness probe. Never touches the store.
async fn health<S, M>(State(state): State<AppState<S, M>>) -> StatusBody
where
  S: SheetStore,
  M: Mailer,
{
  let brand = &state.service.settings().brand.name;
  StatusBody::ok(format!("{brand} contact intake is running"))
}

/// `POST /`: url-encoded form submission.
///
/// The submission runs on its own task so it completes, notifications
/// included, even when the client goes away before the response is written.
async fn submit<S, M>(
  State(state): State<AppState<S, M>>,
  form: Result<Form<RawFields>, FormRejection>,
) -> Response
where
  S: SheetStore + 'static,
  M: Mailer + 'static,
{
  let fields = match form {
    Ok(Form(fields)) => Some(fields),
    Err(rejection) => {
      tracing::debug!(%rejection, "form body not readable");
      None
    }
  };

  let service = Arc::clone(&state.service);
  let outcome =
    tokio::spawn(async move { service.submit(fields.as_ref()).await }).await;

  match outcome {
    Ok(Ok(_)) => StatusBody::success(SUBMIT_OK_MESSAGE).with_status(StatusCode::OK),
    Ok(Err(e)) => e.into_response(),
    Err(e) => {
      tracing::error!(error = %e, "submission task aborted");
      StatusBody::error(SUBMIT_FAILED_MESSAGE)
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }
  }
}
