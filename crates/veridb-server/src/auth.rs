//! Authorization for service operations.
//!
//! The service consults an [`Authorizer`] before touching storage. The
//! check is per (identity, database, action); tamper-evidence does not
//! depend on it, so a misconfigured ACL can deny service but never forge
//! a proof.

use std::collections::HashMap;

use veridb_types::Action;

/// Permission level granted to an identity on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    ReadWrite,
    Admin,
}

impl Permission {
    pub fn allows(&self, action: Action) -> bool {
        match (self, action) {
            (_, Action::Read) => true,
            (Permission::ReadWrite | Permission::Admin, Action::Write) => true,
            (Permission::Admin, Action::Admin) => true,
            _ => false,
        }
    }
}

pub trait Authorizer: Send + Sync {
    /// Whether `identity` may perform `action` on `database`.
    fn is_allowed(&self, identity: &str, database: &str, action: Action) -> bool;
}

/// Permits everything. For tests and single-tenant embedded use.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_allowed(&self, _identity: &str, _database: &str, _action: Action) -> bool {
        true
    }
}

/// Fixed grant table loaded at startup. Unknown (identity, database)
/// pairs are denied.
#[derive(Debug, Default)]
pub struct StaticAclAuthorizer {
    grants: HashMap<(String, String), Permission>,
}

impl StaticAclAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(
        mut self,
        identity: impl Into<String>,
        database: impl Into<String>,
        permission: Permission,
    ) -> Self {
        self.grants
            .insert((identity.into(), database.into()), permission);
        self
    }
}

impl Authorizer for StaticAclAuthorizer {
    fn is_allowed(&self, identity: &str, database: &str, action: Action) -> bool {
        self.grants
            .get(&(identity.to_string(), database.to_string()))
            .map(|permission| permission.allows(action))
            .unwrap_or(false)
    }
}
