pub mod api;
pub mod app;
pub mod chain;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod otp;
pub mod registration;
pub mod validation;

pub use error::{ClientError, OnboardingError};
