//! Back-office reads for administrators.

use std::sync::Arc;

use serde::Serialize;
use studio_shared::constants::RECENT_ACTIVITY_LIMIT;
use studio_shared::error::DomainResult;
use studio_shared::models::{AccountSummary, BookingDetails};
use studio_shared::repository::{BookingQuery, ListingQuery, Repositories};
use studio_shared::{Actor, BookingStatus, DomainError, Role, Visibility};

use crate::bookings::BookingEngine;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingCounts {
    pub total: usize,
    pub pending: usize,
    pub public: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountCounts {
    pub total: usize,
    pub owners: usize,
    pub clients: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub listings: ListingCounts,
    pub accounts: AccountCounts,
    pub bookings: usize,
    /// Sum of `totalPrice` over completed bookings.
    pub revenue: f64,
    pub recent_bookings: Vec<BookingDetails>,
}

#[derive(Clone)]
pub struct AdminService {
    repo: Arc<dyn Repositories>,
    bookings: BookingEngine,
}

impl AdminService {
    pub fn new(repo: Arc<dyn Repositories>, bookings: BookingEngine) -> Self {
        Self { repo, bookings }
    }

    fn require_admin(actor: &Actor) -> DomainResult<()> {
        if actor.is_admin() {
            Ok(())
        } else {
            Err(DomainError::forbidden("Admin access required"))
        }
    }

    pub fn stats(&self, actor: &Actor) -> DomainResult<AdminStats> {
        Self::require_admin(actor)?;

        let listings = self.repo.query_listings(&ListingQuery::default())?;
        let count_visibility =
            |v: Visibility| listings.iter().filter(|l| l.visibility == v).count();

        let accounts = self.repo.list_accounts(None)?;
        let count_role = |r: Role| accounts.iter().filter(|a| a.role == r).count();

        let bookings = self.repo.query_bookings(&BookingQuery::default())?;
        let revenue: f64 = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .map(|b| b.total_price)
            .sum();
        let recent: Vec<_> = bookings.iter().take(RECENT_ACTIVITY_LIMIT).cloned().collect();

        Ok(AdminStats {
            listings: ListingCounts {
                total: listings.len(),
                pending: count_visibility(Visibility::Pending),
                public: count_visibility(Visibility::Public),
            },
            accounts: AccountCounts {
                total: accounts.len(),
                owners: count_role(Role::ListingOwner),
                clients: count_role(Role::Client),
            },
            bookings: bookings.len(),
            revenue,
            recent_bookings: self.bookings.with_listings(recent)?,
        })
    }

    pub fn bookings(&self, actor: &Actor) -> DomainResult<Vec<BookingDetails>> {
        Self::require_admin(actor)?;
        let bookings = self.repo.query_bookings(&BookingQuery::default())?;
        self.bookings.with_listings(bookings)
    }

    pub fn accounts(&self, actor: &Actor, role: Option<Role>) -> DomainResult<Vec<AccountSummary>> {
        Self::require_admin(actor)?;
        Ok(self
            .repo
            .list_accounts(role)?
            .iter()
            .map(AccountSummary::from)
            .collect())
    }
}
