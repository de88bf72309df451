//! Booking status transition policies.
//!
//! The default is [`TransitionPolicy::Permissive`]: the listing owner may move
//! a booking from any status to any other. [`TransitionPolicy::Strict`] is an
//! opt-in layer that enforces a lifecycle graph on top of the ownership check.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::types::BookingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    /// Pending -> Confirmed | Cancelled, Confirmed -> Completed | Cancelled.
    /// Cancelled and Completed are terminal. Re-asserting the current status
    /// is always allowed.
    Strict,
}

impl TransitionPolicy {
    pub fn allows(&self, from: BookingStatus, to: BookingStatus) -> bool {
        use BookingStatus::*;

        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Confirmed)
                            | (Pending, Cancelled)
                            | (Confirmed, Completed)
                            | (Confirmed, Cancelled)
                    )
            }
        }
    }

    pub fn check(&self, from: BookingStatus, to: BookingStatus) -> DomainResult<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(DomainError::TransitionRejected { from, to })
        }
    }
}
