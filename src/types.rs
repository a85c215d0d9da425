//! Type-safe domain enums for Rollbook
//!
//! Roles, menu actions and sort orders are proper Rust enums instead of the
//! raw tokens found in the credential file and typed at the menu prompt.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Access role resolved from the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Staff,
    User,
    #[default]
    Guest,
}

impl Role {
    /// Resolve a credential-file role token.
    ///
    /// Matching is exact (`ADMIN`, `STAFF`, `USER`); anything else,
    /// including lowercase spellings, is read as `Guest`.
    pub fn from_token(token: &str) -> Self {
        match token.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                tracing::debug!("Unrecognized role token {:?}, treating as GUEST", token);
                Role::Guest
            }
        }
    }

    /// Whether this role may perform `action`
    pub fn allows(self, action: Action) -> bool {
        use Action::*;
        match self {
            Role::Admin => true,
            Role::Staff => matches!(
                action,
                ViewStudents | Search | TakeAttendance | ChangePassword | Logout
            ),
            Role::User => matches!(
                action,
                ViewStudents | Search | Statistics | ChangePassword | Logout
            ),
            Role::Guest => matches!(action, ViewStudents),
        }
    }

    /// Whether this role gets an interactive menu loop (guests get one view)
    pub fn has_menu(self) -> bool {
        self != Role::Guest
    }

    /// Numbered menu entries for this role, in display order
    pub fn menu(self) -> Vec<Action> {
        Action::iter().filter(|a| self.allows(*a)).collect()
    }
}

/// Menu-level operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumIter)]
pub enum Action {
    #[strum(serialize = "Add Student")]
    AddStudent,
    #[strum(serialize = "View Students")]
    ViewStudents,
    #[strum(serialize = "Update Student")]
    UpdateStudent,
    #[strum(serialize = "Delete Student")]
    DeleteStudent,
    #[strum(serialize = "Search (roll/name)")]
    Search,
    #[strum(serialize = "Sort Students")]
    Sort,
    #[strum(serialize = "Class Statistics")]
    Statistics,
    #[strum(serialize = "Take Attendance")]
    TakeAttendance,
    #[strum(serialize = "Export to CSV")]
    Export,
    #[strum(serialize = "Change Password")]
    ChangePassword,
    #[strum(serialize = "Logout")]
    Logout,
}

/// One-time reordering applied by `RecordStore::sort`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Display, EnumString, EnumIter)]
pub enum SortKey {
    #[default]
    #[strum(serialize = "Roll (asc)")]
    RollAscending,
    #[strum(serialize = "Name (A-Z)")]
    NameAlphabetical,
    #[strum(serialize = "Marks (high->low)")]
    MarksDescending,
}
