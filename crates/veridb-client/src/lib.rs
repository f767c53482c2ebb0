//! # veridb-client
//!
//! Verifying client for the tamper-evident log.
//!
//! The client keeps its own [`TrustedRootCache`] and checks every server
//! claim against it with pure offline proof verification. Reads and
//! writes come in two tiers: [`RawClient`] (the server's word, taken at
//! face value) and [`VerifiedClient`] (nothing returned until inclusion
//! and consistency proofs check out against trusted history).

pub mod error;
pub mod root_cache;
pub mod verified;

pub use error::{ClientError, ClientResult};
pub use root_cache::{TrustedRoot, TrustedRootCache};
pub use verified::{RawClient, VerifiedClient, VerifiedIndex, VerifiedItem};
