//! Message composition.
//!
//! Both messages carry a plain-text body and an HTML body. The HTML bodies
//! are askama templates under `templates/`, which escape every interpolated
//! value.

use askama::Template;
use intake_core::{mail::OutboundMessage, record::SubmissionRecord};
use serde::Deserialize;

use crate::Result;

/// Response-time promise quoted in the receipt. Not enforced anywhere.
pub const RESPONSE_SLA: &str = "Average response time: within 24 business hours";

// ─── Brand ───────────────────────────────────────────────────────────────────

/// Static brand details used in message bodies and routing.
#[derive(Debug, Clone, Deserialize)]
pub struct Brand {
  pub name:          String,
  pub phone:         String,
  /// Comma-separated team distribution list.
  pub team_emails:   String,
  /// Prefix for WhatsApp links built from a submitter's phone digits.
  #[serde(default = "default_country_code")]
  pub country_code:  String,
  /// Link to the backing sheet, included in team alerts.
  #[serde(default)]
  pub store_url:     Option<String>,
  #[serde(default = "default_opening_hours")]
  pub opening_hours: String,
}

fn default_country_code() -> String { "55".to_owned() }

fn default_opening_hours() -> String {
  "Monday to Friday: 8am - 6pm | Saturday: 8am - 12pm".to_owned()
}

impl Brand {
  /// Team addresses, trimmed, empties dropped.
  pub fn team_list(&self) -> Vec<String> {
    self
      .team_emails
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect()
  }

  /// The address submitters are pointed to for urgent questions.
  pub fn contact_email(&self) -> Option<String> { self.team_list().into_iter().next() }

  /// `https://wa.me/…` link for a digits-only phone number.
  pub fn whatsapp_link(&self, phone_digits: &str) -> String {
    let already_prefixed = phone_digits.len() > 11
      && phone_digits.starts_with(self.country_code.as_str());
    if already_prefixed {
      format!("https://wa.me/{phone_digits}")
    } else {
      format!("https://wa.me/{}{phone_digits}", self.country_code)
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationHtml<'a> {
  name:          &'a str,
  brand:         &'a str,
  email:         &'a str,
  phone:         &'a str,
  company:       &'a str,
  subject:       &'a str,
  message:       &'a str,
  sla:           &'a str,
  contact_email: &'a str,
  brand_phone:   &'a str,
  hours:         &'a str,
}

#[derive(Template)]
#[template(path = "team_alert.html")]
struct TeamAlertHtml<'a> {
  received:      &'a str,
  high_priority: bool,
  name:          &'a str,
  mailto:        &'a str,
  email:         &'a str,
  phone:         &'a str,
  company:       &'a str,
  subject:       &'a str,
  kind:          &'a str,
  message:       &'a str,
  whatsapp:      &'a str,
  store_url:     Option<&'a str>,
  brand:         &'a str,
}

fn received_at(record: &SubmissionRecord) -> String {
  record.created_at.format("%d/%m/%Y %H:%M UTC").to_string()
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// Receipt sent to the submitter, echoing back what they sent.
pub fn confirmation(record: &SubmissionRecord, brand: &Brand) -> Result<OutboundMessage> {
  let subject_label = record.subject_code().label().to_owned();
  let contact_email = brand.contact_email().unwrap_or_default();

  let mut text = vec![
    format!("Hello, {}!", record.name),
    String::new(),
    format!("Thank you for contacting {}!", brand.name),
    String::new(),
    format!(
      "We received your message and our team will get back to you at {}.",
      record.email
    ),
    String::new(),
    "Summary of your message:".to_owned(),
    format!("- Name: {}", record.name),
    format!("- Email: {}", record.email),
    format!("- Phone: {}", record.phone),
  ];
  if !record.company.is_empty() {
    text.push(format!("- Company: {}", record.company));
  }
  text.extend([
    format!("- Subject: {subject_label}"),
    format!("- Message: {}", record.message),
    String::new(),
    RESPONSE_SLA.to_owned(),
    String::new(),
    "Need help right away?".to_owned(),
    format!("Email: {contact_email}"),
    format!("Phone/WhatsApp: {}", brand.phone),
    format!("Hours: {}", brand.opening_hours),
    String::new(),
    brand.name.clone(),
  ]);

  let html = ConfirmationHtml {
    name:          &record.name,
    brand:         &brand.name,
    email:         &record.email,
    phone:         &record.phone,
    company:       &record.company,
    subject:       &subject_label,
    message:       &record.message,
    sla:           RESPONSE_SLA,
    contact_email: &contact_email,
    brand_phone:   &brand.phone,
    hours:         &brand.opening_hours,
  }
  .render()?;

  Ok(OutboundMessage {
    to:          vec![record.email.clone()],
    subject:     format!("We received your message - {}", brand.name),
    text_body:   text.join("\n"),
    html_body:   Some(html),
    reply_to:    None,
    sender_name: brand.name.clone(),
  })
}

// ─── Team alert ──────────────────────────────────────────────────────────────

/// Alert sent to the team distribution list. Replies go to the submitter.
pub fn team_alert(record: &SubmissionRecord, brand: &Brand) -> Result<OutboundMessage> {
  let code = record.subject_code();
  let subject_label = code.label().to_owned();
  let whatsapp = brand.whatsapp_link(&record.phone);
  let mailto = format!("mailto:{}", record.email);

  let mut text = vec![
    format!("NEW CONTACT - {}", brand.name.to_uppercase()),
    received_at(record),
    String::new(),
  ];
  if code.is_high_priority() {
    text.push("HIGH PRIORITY".to_owned());
    text.push(String::new());
  }
  text.extend([
    "CONTACT DETAILS:".to_owned(),
    format!("- Name: {}", record.name),
    format!("- Email: {}", record.email),
    format!("- Phone: {}", record.phone),
  ]);
  if !record.company.is_empty() {
    text.push(format!("- Company: {}", record.company));
  }
  text.extend([
    format!("- Subject: {subject_label}"),
    format!("- Type: {}", record.submission_type),
    String::new(),
  ]);
  if !record.message.is_empty() {
    text.extend(["MESSAGE:".to_owned(), record.message.clone(), String::new()]);
  }
  text.extend([
    "ACTIONS:".to_owned(),
    format!("- Reply by email: {mailto}"),
    format!("- WhatsApp: {whatsapp}"),
  ]);
  if let Some(url) = &brand.store_url {
    text.push(format!("- Open sheet: {url}"));
  }
  text.extend([
    String::new(),
    "Reply within 24 hours.".to_owned(),
    String::new(),
    "---".to_owned(),
    format!("Lead system - {}", brand.name),
  ]);

  let received = received_at(record);
  let html = TeamAlertHtml {
    received:      &received,
    high_priority: code.is_high_priority(),
    name:          &record.name,
    mailto:        &mailto,
    email:         &record.email,
    phone:         &record.phone,
    company:       &record.company,
    subject:       &subject_label,
    kind:          &record.submission_type,
    message:       &record.message,
    whatsapp:      &whatsapp,
    store_url:     brand.store_url.as_deref(),
    brand:         &brand.name,
  }
  .render()?;

  Ok(OutboundMessage {
    to:          brand.team_list(),
    subject:     format!("New contact - {} [{subject_label}]", record.name),
    text_body:   text.join("\n"),
    html_body:   Some(html),
    reply_to:    Some(record.email.clone()),
    sender_name: format!("{} Contact System", brand.name),
  })
}
