// ========== Core Modules ==========
pub mod entry;
pub mod snapshot;

pub use entry::Entry;
pub use snapshot::TreeSnapshot;

use serde::{Deserialize, Serialize};

/// The action a caller wants to perform against a database, consulted by
/// the authorization collaborator before the log store is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Read,
    Write,
    Admin,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Write => write!(f, "write"),
            Action::Admin => write!(f, "admin"),
        }
    }
}
