//! The one place that decides who counts as an administrator.
//!
//! Accounts created through "add employee" carry the staff flag, accounts
//! promoted through their user details carry the `admin` role. Either one
//! grants access to every administrative page.

use crate::choices::ADMIN_ROLE;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    #[error("No tienes permiso para ver esta página.")]
    NotAdmin,
    #[error("No puedes eliminar tu propia cuenta.")]
    OwnAccount,
}

pub fn is_admin(is_staff: bool, role: Option<&str>) -> bool {
    is_staff || role == Some(ADMIN_ROLE)
}

pub fn require_admin(is_staff: bool, role: Option<&str>) -> Result<(), Denied> {
    if is_admin(is_staff, role) {
        Ok(())
    } else {
        Err(Denied::NotAdmin)
    }
}

/// Rejects destructive actions on the record linked to the account performing them.
pub fn ensure_not_own_account(current_user_id: i32, target_user_id: Option<i32>) -> Result<(), Denied> {
    if target_user_id == Some(current_user_id) {
        Err(Denied::OwnAccount)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_flag_grants_admin() {
        assert!(is_admin(true, None));
        assert!(is_admin(true, Some("empleado")));
    }

    #[test]
    fn admin_role_grants_admin() {
        assert!(is_admin(false, Some("admin")));
    }

    #[test]
    fn everyone_else_is_denied() {
        assert!(!is_admin(false, None));
        assert!(!is_admin(false, Some("empleado")));
        assert!(!is_admin(false, Some("Admin")));
        assert_eq!(require_admin(false, Some("empleado")), Err(Denied::NotAdmin));
        assert_eq!(require_admin(false, None), Err(Denied::NotAdmin));
    }

    #[test]
    fn deleting_the_record_linked_to_the_current_account_is_denied() {
        assert_eq!(ensure_not_own_account(7, Some(7)), Err(Denied::OwnAccount));
    }

    #[test]
    fn deleting_other_or_unlinked_records_is_allowed() {
        assert_eq!(ensure_not_own_account(7, Some(8)), Ok(()));
        assert_eq!(ensure_not_own_account(7, None), Ok(()));
    }
}
