//! Chain Client Adapters
//!
//! Boundary adapters around the Ethereum node: hat minting through the Hats
//! contract and identity-commitment admission through a Semaphore gatekeeper.
//! Adapters never retry; they report one outcome per call.

pub mod abi;
pub mod hats;
pub mod rpc;
pub mod semaphore;
pub mod types;

pub use hats::{CredentialIssuer, HatsCredentialIssuer};
pub use rpc::JsonRpcClient;
pub use semaphore::{GroupAdmissionClient, SemaphoreGatekeeperClient};
pub use types::{Address, ChainOutcome, PreparedCall, Uint256};
