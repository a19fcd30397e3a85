//! One-Time Password Subsystem
//!
//! Code generation, storage with lazy expiry, single-use consumption and
//! out-of-band delivery of codes to email addresses.

pub mod code;
pub mod mailer;
pub mod service;
pub mod sqlite;
pub mod store;

pub use code::CodeGenerator;
pub use mailer::{HttpMailer, LogMailer, OtpMailer};
pub use service::OtpService;
pub use sqlite::SqliteOtpStore;
pub use store::{MemoryOtpStore, OtpStore};
