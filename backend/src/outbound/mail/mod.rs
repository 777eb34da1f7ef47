//! Transactional email outbound adapters.

mod smtp;

pub use smtp::{SmtpMailer, SmtpMailerError, SmtpSecurity, SmtpSettings, UnknownSmtpSecurity};
