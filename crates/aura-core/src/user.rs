//! Register users and their permissions.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    /// 4-6 digit sign-in PIN.
    pub pin: String,
    pub permissions: Vec<Permission>,
    pub is_admin: bool,
}

impl User {
    pub fn new(name: impl Into<String>, pin: impl Into<String>) -> Self {
        User {
            id: crate::new_id(),
            name: name.into(),
            pin: pin.into(),
            permissions: Vec::new(),
            is_admin: false,
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Admins and holders of `Permission::All` pass every check.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_admin
            || self
                .permissions
                .iter()
                .any(|p| *p == Permission::All || *p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_permission() {
        let cashier = User::new("Sam", "1234").with_permissions([Permission::VoidItems]);
        assert!(cashier.has_permission(Permission::VoidItems));
        assert!(!cashier.has_permission(Permission::PriceOverride));

        let manager = User::new("Robin", "9999").with_permissions([Permission::All]);
        assert!(manager.has_permission(Permission::ProcessReturns));

        let owner = User::new("Alex", "0000").admin();
        assert!(owner.has_permission(Permission::VoidTransactions));
    }
}
