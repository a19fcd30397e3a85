//! Registration Orchestrator
//!
//! Drives OTP consumption, hat minting, group admission and the ledger write
//! in strict order to a single terminal outcome.
//!
//! The four steps are independent side effects with no shared transaction.
//! A mint or an admission cannot be undone from here, so a failure after the
//! OTP is consumed leaves partial progress behind. That is an accepted
//! tradeoff: such failures are not reconciled automatically, they are logged
//! and journaled with the email, address and transaction references so an
//! operator can finish or repair them.
//!
//! The flow is not safely retriable end to end. The OTP is consumed by the
//! first step, so resubmitting the same request is rejected at OTP
//! verification. A fresh OTP after a later failure would mint again for the
//! same address, and whether that is harmless depends on the Hats contract,
//! not on this service.

pub mod orchestrator;
pub mod state;
pub mod timeouts;

pub use orchestrator::{RegistrationOrchestrator, RegistrationRequest};
pub use state::{
    AdmissionPhase, RegistrationOutcome, RegistrationReceipt, RegistrationReport,
    RegistrationState,
};
pub use timeouts::StepTimeouts;
