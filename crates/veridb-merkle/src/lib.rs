//! # veridb-merkle
//!
//! Merkle tree core for veridb's authenticated append-only log.
//!
//! This crate provides the pieces of the tamper-evidence guarantee that
//! must agree with each other bit for bit:
//!
//! - [`hash`]: SHA-256 leaf/node hashing with domain separation
//! - [`tree`]: the deterministic tree shape, root computation, and
//!   server-side inclusion/consistency path construction over a persisted
//!   node cache
//! - [`proof`]: proof types and pure, offline client-side verification
//!
//! ## Design Philosophy
//!
//! Proof generation and verification share one split rule, defined once in
//! [`tree`]. The generators walk a [`tree::NodeSource`] (the server's
//! interior-node cache); the verifiers fold sibling hashes with no state
//! at all, so a client can check proofs against its own trusted root
//! without believing anything the server says.

pub mod error;
pub mod hash;
pub mod proof;
pub mod tree;

pub use error::{MerkleError, MerkleResult};
pub use hash::{empty_root, leaf_hash, node_hash, HashValue};
pub use proof::{ConsistencyProof, InclusionProof};
pub use tree::NodeSource;

/// The length of hash digests (32 bytes = 256 bits)
pub const HASH_LENGTH: usize = 32;
