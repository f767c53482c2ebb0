//! # veridb-server
//!
//! Server-side operation surface for the tamper-evident log: the
//! [`LedgerService`] trait, its in-process [`LedgerHandle`]
//! implementation, and authorization.
//!
//! The server produces claims (receipts, snapshots, proofs); it is the
//! client's verifier that decides whether to believe them.

pub mod auth;
pub mod error;
pub mod service;

pub use auth::{AllowAll, Authorizer, Permission, StaticAclAuthorizer};
pub use error::{ServiceError, ServiceResult};
pub use service::{AppendReceipt, ItemReceipt, LedgerHandle, LedgerService, Session};
