//! Listing visibility workflow.
//!
//! ```text
//!            approve            suspend
//!   Pending ─────────▶ Public ─────────▶ Suspended
//!      │                                    ▲
//!      └────────────── reject ──────────────┘
//! ```
//!
//! Admins may also send a listing back to `Pending` for re-review, or
//! reinstate a suspended listing. Writes are not guarded by the current
//! state: any admin-issued target is persisted. [`classify`] only names the
//! move so it can be logged and audited.

use serde::Serialize;

use crate::types::Visibility;

/// The named edge a visibility change travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityChange {
    Approve,
    Reject,
    Suspend,
    Reinstate,
    Reopen,
    Unchanged,
}

impl VisibilityChange {
    /// `true` for the three edges of the documented workflow.
    pub fn is_standard(&self) -> bool {
        matches!(
            self,
            VisibilityChange::Approve | VisibilityChange::Reject | VisibilityChange::Suspend
        )
    }
}

/// Visibility assigned to a listing created by its owner.
pub fn initial_visibility() -> Visibility {
    Visibility::Pending
}

pub fn classify(current: Visibility, target: Visibility) -> VisibilityChange {
    use Visibility::*;

    match (current, target) {
        (a, b) if a == b => VisibilityChange::Unchanged,
        (Pending, Public) => VisibilityChange::Approve,
        (Pending, Suspended) => VisibilityChange::Reject,
        (Public, Suspended) => VisibilityChange::Suspend,
        (Suspended, Public) => VisibilityChange::Reinstate,
        (_, Pending) => VisibilityChange::Reopen,
        _ => VisibilityChange::Unchanged,
    }
}
