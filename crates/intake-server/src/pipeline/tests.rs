//! Pipeline tests against an in-memory SQLite sheet and fake mailers.

use std::{
  io,
  sync::{Arc, Mutex},
  time::Duration,
};

use intake_core::{
  Field,
  layout::SheetLayout,
  mail::{Mailer, OutboundMessage},
  record::INITIAL_STATUS,
  store::{Collection, HeaderState, SheetStore},
  validate::{RawFields, ValidationPolicy},
  ValidationError,
};
use intake_mail::Brand;
use intake_store_sqlite::SqliteSheetStore;
use uuid::Uuid;

use super::{Delivery, IntakeService, IntakeSettings};
use crate::{
  error::{IntakeError, NotificationFailure, StoreStage},
  lock::WriteLock,
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// Records every message; fails for recipients listed in `reject`.
#[derive(Default)]
struct RecordingMailer {
  sent:   Mutex<Vec<OutboundMessage>>,
  reject: Vec<String>,
}

impl RecordingMailer {
  fn rejecting(address: &str) -> Self {
    Self {
      sent:   Mutex::default(),
      reject: vec![address.to_owned()],
    }
  }

  fn sent(&self) -> Vec<OutboundMessage> { self.sent.lock().unwrap().clone() }
}

impl Mailer for RecordingMailer {
  type Error = io::Error;

  async fn send(&self, message: &OutboundMessage) -> Result<(), io::Error> {
    if message.to.iter().any(|to| self.reject.contains(to)) {
      return Err(io::Error::other("mailbox unavailable"));
    }
    self.sent.lock().unwrap().push(message.clone());
    Ok(())
  }
}

/// Never answers within any reasonable timeout.
struct HangingMailer;

impl Mailer for HangingMailer {
  type Error = io::Error;

  async fn send(&self, _message: &OutboundMessage) -> Result<(), io::Error> {
    tokio::time::sleep(Duration::from_secs(60)).await;
    Ok(())
  }
}

/// A store whose backing file cannot be opened.
struct UnreachableStore;

impl SheetStore for UnreachableStore {
  type Error = io::Error;

  async fn open_collection(&self, _name: String) -> Result<Collection, io::Error> {
    Err(io::Error::other("disk /var/secret/sheet.db is read-only"))
  }

  async fn first_row(&self, _id: Uuid) -> Result<Option<Vec<String>>, io::Error> {
    Err(io::Error::other("unreachable"))
  }

  async fn write_header(&self, _id: Uuid, _header: Vec<String>) -> Result<(), io::Error> {
    Err(io::Error::other("unreachable"))
  }

  async fn append_row(&self, _id: Uuid, _cells: Vec<String>) -> Result<u64, io::Error> {
    Err(io::Error::other("unreachable"))
  }

  async fn row_count(&self, _id: Uuid) -> Result<u64, io::Error> {
    Err(io::Error::other("unreachable"))
  }

  async fn rows(&self, _id: Uuid) -> Result<Vec<Vec<String>>, io::Error> {
    Err(io::Error::other("unreachable"))
  }
}

/// Delegates to SQLite but refuses every append.
struct ReadOnlyStore(SqliteSheetStore);

fn other(e: intake_store_sqlite::Error) -> io::Error { io::Error::other(e.to_string()) }

impl SheetStore for ReadOnlyStore {
  type Error = io::Error;

  async fn open_collection(&self, name: String) -> Result<Collection, io::Error> {
    self.0.open_collection(name).await.map_err(other)
  }

  async fn first_row(&self, id: Uuid) -> Result<Option<Vec<String>>, io::Error> {
    self.0.first_row(id).await.map_err(other)
  }

  async fn write_header(&self, id: Uuid, header: Vec<String>) -> Result<(), io::Error> {
    self.0.write_header(id, header).await.map_err(other)
  }

  async fn append_row(&self, _id: Uuid, _cells: Vec<String>) -> Result<u64, io::Error> {
    Err(io::Error::other("quota exceeded"))
  }

  async fn row_count(&self, id: Uuid) -> Result<u64, io::Error> {
    self.0.row_count(id).await.map_err(other)
  }

  async fn rows(&self, id: Uuid) -> Result<Vec<Vec<String>>, io::Error> {
    self.0.rows(id).await.map_err(other)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn brand() -> Brand {
  Brand {
    name:          "B-Cosmetic".into(),
    phone:         "(27) 99999-9999".into(),
    team_emails:   "team@example.com, admin@example.com".into(),
    country_code:  "55".into(),
    store_url:     None,
    opening_hours: "Mon-Fri 8-18".into(),
  }
}

fn settings() -> IntakeSettings {
  IntakeSettings {
    policy:               ValidationPolicy::STRICT,
    layout:               SheetLayout::Timestamped,
    collection:           "Contacts".into(),
    lock_timeout:         Duration::from_secs(2),
    notify_timeout:       Duration::from_millis(200),
    confirmation_enabled: true,
    team_enabled:         true,
    brand:                brand(),
  }
}

fn service<S: SheetStore, M: Mailer>(
  store: Arc<S>,
  mailer: Arc<M>,
  settings: IntakeSettings,
) -> IntakeService<S, M> {
  IntakeService::new(store, mailer, WriteLock::new(), settings)
}

async fn sqlite() -> Arc<SqliteSheetStore> {
  Arc::new(SqliteSheetStore::open_in_memory().await.unwrap())
}

async fn sheet_rows(store: &SqliteSheetStore) -> Vec<Vec<String>> {
  let c = store.open_collection("Contacts".into()).await.unwrap();
  store.rows(c.collection_id).await.unwrap()
}

fn fields(pairs: &[(&str, &str)]) -> RawFields {
  pairs
    .iter()
    .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
    .collect()
}

fn ana() -> RawFields {
  fields(&[
    ("name", "Ana Silva"),
    ("email", "ana@example.com"),
    ("phone", "(21) 99999-0000"),
    ("subject", "suporte"),
    ("message", "Preciso de ajuda com meu pedido."),
  ])
}

async fn lock_is_free<S: SheetStore, M: Mailer>(svc: &IntakeService<S, M>) -> bool {
  svc.lock().acquire(Duration::from_millis(10)).await.is_ok()
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_submission_appends_one_normalised_row() {
  let store = sqlite().await;
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(store.clone(), mailer.clone(), settings());

  let receipt = svc.submit(Some(&ana())).await.unwrap();

  assert_eq!(receipt.header, HeaderState::Created);
  assert_eq!(receipt.row_number, 2);
  assert_eq!(receipt.record.phone, "21999990000");

  let rows = sheet_rows(&store).await;
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0], SheetLayout::Timestamped.header());
  assert_eq!(
    rows[1][1..],
    [
      "Ana Silva",
      "ana@example.com",
      "21999990000",
      "Not informed",
      "suporte",
      "Preciso de ajuda com meu pedido.",
      INITIAL_STATUS,
    ]
  );
  assert_eq!(rows[1][0], receipt.record.created_at.to_rfc3339());
}

#[tokio::test]
async fn valid_submission_notifies_submitter_and_team() {
  let store = sqlite().await;
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(store, mailer.clone(), settings());

  let receipt = svc.submit(Some(&ana())).await.unwrap();

  assert_eq!(receipt.notifications.confirmation, Delivery::Sent);
  assert_eq!(receipt.notifications.team, Delivery::Sent);
  let sent = mailer.sent();
  assert_eq!(sent.len(), 2);
  assert_eq!(sent[0].to, vec!["ana@example.com".to_owned()]);
  assert_eq!(sent[1].reply_to.as_deref(), Some("ana@example.com"));
}

#[tokio::test]
async fn second_submission_reuses_header() {
  let store = sqlite().await;
  let svc = service(store.clone(), Arc::new(RecordingMailer::default()), settings());

  svc.submit(Some(&ana())).await.unwrap();
  let second = svc.submit(Some(&ana())).await.unwrap();

  assert_eq!(second.header, HeaderState::Present);
  assert_eq!(second.row_number, 3);
  assert_eq!(sheet_rows(&store).await.len(), 3);
}

#[tokio::test]
async fn legacy_layout_writes_type_column() {
  let store = sqlite().await;
  let svc = service(
    store.clone(),
    Arc::new(RecordingMailer::default()),
    IntakeSettings {
      layout: SheetLayout::Legacy,
      ..settings()
    },
  );

  let mut f = ana();
  f.insert("type".into(), "distribuidor".into());
  svc.submit(Some(&f)).await.unwrap();

  let rows = sheet_rows(&store).await;
  assert_eq!(rows[0], SheetLayout::Legacy.header());
  assert_eq!(rows[1][3], "");
  assert_eq!(rows[1][6], "distribuidor");
}

#[tokio::test]
async fn init_sheet_writes_header_once() {
  let store = sqlite().await;
  let svc = service(store.clone(), Arc::new(RecordingMailer::default()), settings());

  assert_eq!(svc.init_sheet().await.unwrap(), HeaderState::Created);
  assert_eq!(svc.init_sheet().await.unwrap(), HeaderState::Present);
  assert_eq!(sheet_rows(&store).await.len(), 1);
}

// ─── Rejections ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_required_fields_store_nothing() {
  let store = sqlite().await;
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(store.clone(), mailer.clone(), settings());

  for missing in ["name", "email", "phone"] {
    let mut f = ana();
    f.remove(missing);
    let err = svc.submit(Some(&f)).await.unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)), "{missing}: {err}");
  }

  assert!(sheet_rows(&store).await.is_empty());
  assert!(mailer.sent().is_empty());
  assert!(lock_is_free(&svc).await);
}

#[tokio::test]
async fn short_and_malformed_fields_are_all_reported() {
  let store = sqlite().await;
  let svc = service(store.clone(), Arc::new(RecordingMailer::default()), settings());

  let f = fields(&[("name", "Jo"), ("email", "bad-email"), ("phone", "123")]);
  let err = svc.submit(Some(&f)).await.unwrap_err();

  let IntakeError::Validation(ValidationError::InvalidFields(violations)) = &err else {
    panic!("unexpected error: {err}");
  };
  let failed: Vec<Field> = violations.iter().map(|v| v.field).collect();
  assert!(failed.starts_with(&[Field::Name, Field::Email, Field::Phone]));
  assert!(sheet_rows(&store).await.is_empty());
}

#[tokio::test]
async fn absent_body_is_invalid_request() {
  let store = sqlite().await;
  let svc = service(store, Arc::new(RecordingMailer::default()), settings());

  let err = svc.submit(None).await.unwrap_err();
  assert!(matches!(
    err,
    IntakeError::Validation(ValidationError::InvalidRequest)
  ));
}

#[tokio::test]
async fn lenient_policy_accepts_short_phone() {
  let store = sqlite().await;
  let svc = service(
    store.clone(),
    Arc::new(RecordingMailer::default()),
    IntakeSettings {
      policy: ValidationPolicy::LENIENT,
      ..settings()
    },
  );

  let f = fields(&[("name", "Jo"), ("email", "jo@example.com"), ("phone", "123")]);
  svc.submit(Some(&f)).await.unwrap();
  assert_eq!(sheet_rows(&store).await.len(), 2);
}

// ─── Store failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_store_fails_without_leaking_cause() {
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(Arc::new(UnreachableStore), mailer.clone(), settings());

  let err = svc.submit(Some(&ana())).await.unwrap_err();

  assert!(matches!(
    err,
    IntakeError::StoreUnavailable { stage: StoreStage::OpenCollection, .. }
  ));
  assert!(!err.public_message().contains("/var/secret"));
  assert!(mailer.sent().is_empty(), "no notification after a failed write");
  assert!(lock_is_free(&svc).await);
}

#[tokio::test]
async fn failed_append_releases_lock() {
  let store = Arc::new(ReadOnlyStore(SqliteSheetStore::open_in_memory().await.unwrap()));
  let svc = service(store, Arc::new(RecordingMailer::default()), settings());

  let err = svc.submit(Some(&ana())).await.unwrap_err();

  assert!(matches!(
    err,
    IntakeError::StoreUnavailable { stage: StoreStage::AppendRow, .. }
  ));
  assert!(lock_is_free(&svc).await);
}

#[tokio::test]
async fn held_lock_times_out_and_stores_nothing() {
  let store = sqlite().await;
  let svc = service(
    store.clone(),
    Arc::new(RecordingMailer::default()),
    IntakeSettings {
      lock_timeout: Duration::from_millis(50),
      ..settings()
    },
  );

  let held = svc.lock().acquire(Duration::from_millis(10)).await.unwrap();
  let err = svc.submit(Some(&ana())).await.unwrap_err();
  drop(held);

  assert!(matches!(err, IntakeError::LockTimeout(_)));
  assert!(sheet_rows(&store).await.is_empty());
}

// ─── Notification isolation ──────────────────────────────────────────────────

#[tokio::test]
async fn notification_failure_does_not_fail_submission() {
  let store = sqlite().await;
  let mailer = Arc::new(RecordingMailer {
    sent:   Mutex::default(),
    reject: vec!["ana@example.com".into(), "team@example.com".into()],
  });
  let svc = service(store.clone(), mailer, settings());

  let receipt = svc.submit(Some(&ana())).await.unwrap();

  assert!(matches!(
    receipt.notifications.confirmation,
    Delivery::Failed(NotificationFailure::Transport(_))
  ));
  assert!(matches!(receipt.notifications.team, Delivery::Failed(_)));
  assert_eq!(sheet_rows(&store).await.len(), 2);
}

#[tokio::test]
async fn failed_confirmation_still_alerts_team() {
  let store = sqlite().await;
  let mailer = Arc::new(RecordingMailer::rejecting("ana@example.com"));
  let svc = service(store, mailer.clone(), settings());

  let receipt = svc.submit(Some(&ana())).await.unwrap();

  assert!(matches!(receipt.notifications.confirmation, Delivery::Failed(_)));
  assert_eq!(receipt.notifications.team, Delivery::Sent);
  assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn hanging_mailer_is_cut_off() {
  let store = sqlite().await;
  let svc = service(store.clone(), Arc::new(HangingMailer), settings());

  let receipt = svc.submit(Some(&ana())).await.unwrap();

  assert_eq!(
    receipt.notifications.team,
    Delivery::Failed(NotificationFailure::TimedOut(Duration::from_millis(200)))
  );
  assert_eq!(sheet_rows(&store).await.len(), 2);
}

#[tokio::test]
async fn disabled_notifications_are_skipped() {
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(
    sqlite().await,
    mailer.clone(),
    IntakeSettings {
      confirmation_enabled: false,
      team_enabled: false,
      ..settings()
    },
  );

  let receipt = svc.submit(Some(&ana())).await.unwrap();
  assert_eq!(receipt.notifications.confirmation, Delivery::Skipped);
  assert_eq!(receipt.notifications.team, Delivery::Skipped);
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn empty_team_list_skips_alert() {
  let mailer = Arc::new(RecordingMailer::default());
  let svc = service(
    sqlite().await,
    mailer.clone(),
    IntakeSettings {
      brand: Brand {
        team_emails: " , ".into(),
        ..brand()
      },
      ..settings()
    },
  );

  let receipt = svc.submit(Some(&ana())).await.unwrap();
  assert_eq!(receipt.notifications.confirmation, Delivery::Sent);
  assert_eq!(receipt.notifications.team, Delivery::Skipped);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_submissions_write_a_single_header() {
  let store = sqlite().await;
  let svc = Arc::new(service(
    store.clone(),
    Arc::new(RecordingMailer::default()),
    settings(),
  ));

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let svc = Arc::clone(&svc);
      tokio::spawn(async move { svc.submit(Some(&ana())).await.map(|r| r.row_number) })
    })
    .collect();

  let mut row_numbers = Vec::new();
  for handle in handles {
    row_numbers.push(handle.await.unwrap().unwrap());
  }
  row_numbers.sort_unstable();

  assert_eq!(row_numbers, (2..=9).collect::<Vec<u64>>());
  let rows = sheet_rows(&store).await;
  let header = SheetLayout::Timestamped.header();
  assert_eq!(rows.len(), 9);
  assert_eq!(rows.iter().filter(|r| r.as_slice() == header).count(), 1);
}
