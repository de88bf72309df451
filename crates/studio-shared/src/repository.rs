//! Storage capabilities injected into the server's services.
//!
//! Each entity gets its own trait with the `{get, create, update, query}`
//! operations the services need. Implementations live in `studio-store`
//! (SQLite and in-memory). All methods are synchronous.

use crate::error::RepoResult;
use crate::models::{Account, Booking, Listing, Message, Review};
use crate::types::{AccountId, BookingId, BookingStatus, ListingId, Role, Visibility};

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

/// Filter for listing queries. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub visibility: Option<Visibility>,
    pub owner_id: Option<AccountId>,
    /// Case-insensitive substring match.
    pub location: Option<String>,
    /// Case-insensitive substring match.
    pub name: Option<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
}

impl ListingQuery {
    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Self::default()
        }
    }

    pub fn owned_by(owner_id: AccountId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_deref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(true)
        }

        self.visibility.map_or(true, |v| listing.visibility == v)
            && self.owner_id.map_or(true, |o| listing.owner_id == o)
            && contains(&listing.location, &self.location)
            && contains(&listing.name, &self.name)
            && self.min_rate.map_or(true, |min| listing.hourly_rate >= min)
            && self.max_rate.map_or(true, |max| listing.hourly_rate <= max)
    }
}

/// Filter for booking queries. Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    /// Bookings authored by this account.
    pub booker: Option<AccountId>,
    /// Bookings on listings owned by this account.
    pub listing_owner: Option<AccountId>,
    pub listing_id: Option<ListingId>,
    pub status: Option<BookingStatus>,
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

pub trait AccountRepository {
    /// Fails with `Conflict` when the email is already taken.
    fn create_account(&self, account: &Account) -> RepoResult<()>;
    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn find_account_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    /// Newest first.
    fn list_accounts(&self, role: Option<Role>) -> RepoResult<Vec<Account>>;
}

pub trait ListingRepository {
    fn create_listing(&self, listing: &Listing) -> RepoResult<()>;
    fn get_listing(&self, id: ListingId) -> RepoResult<Option<Listing>>;
    /// Overwrite the owner-editable fields (name, description, location,
    /// rate, images, features). Returns `false` if no such listing.
    fn update_listing(&self, listing: &Listing) -> RepoResult<bool>;
    fn set_listing_visibility(&self, id: ListingId, visibility: Visibility) -> RepoResult<bool>;
    /// Deletes only if no active booking references the listing; fails with
    /// `Conflict` otherwise. Returns `false` if no such listing.
    fn delete_listing(&self, id: ListingId) -> RepoResult<bool>;
    /// Newest first.
    fn query_listings(&self, query: &ListingQuery) -> RepoResult<Vec<Listing>>;
    /// Distinct locations across every listing, alphabetical.
    fn listing_locations(&self) -> RepoResult<Vec<String>>;
}

pub trait BookingRepository {
    fn create_booking(&self, booking: &Booking) -> RepoResult<()>;
    fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>>;
    /// Last write wins; no optimistic-concurrency check.
    fn update_booking_status(&self, id: BookingId, status: BookingStatus) -> RepoResult<bool>;
    fn query_bookings(&self, query: &BookingQuery) -> RepoResult<Vec<Booking>>;
}

pub trait MessageRepository {
    fn create_message(&self, message: &Message) -> RepoResult<()>;
    /// Messages sent or received by `account`, newest first.
    fn messages_involving(&self, account: AccountId) -> RepoResult<Vec<Message>>;
    /// Messages exchanged between `a` and `b`, oldest first.
    fn conversation(&self, a: AccountId, b: AccountId) -> RepoResult<Vec<Message>>;
}

pub trait ReviewRepository {
    /// Insert the review and recompute the listing's average rating as one
    /// atomic step. Returns the new average.
    fn add_review(&self, review: &Review) -> RepoResult<f64>;
    /// Newest first.
    fn list_reviews(&self, listing_id: Option<ListingId>) -> RepoResult<Vec<Review>>;
}

/// The full capability set handed to the server.
pub trait Repositories:
    AccountRepository
    + ListingRepository
    + BookingRepository
    + MessageRepository
    + ReviewRepository
    + Send
    + Sync
{
}

impl<T> Repositories for T where
    T: AccountRepository
        + ListingRepository
        + BookingRepository
        + MessageRepository
        + ReviewRepository
        + Send
        + Sync
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(name: &str, location: &str, rate: f64, visibility: Visibility) -> Listing {
        Listing {
            id: ListingId::new(),
            owner_id: AccountId::new(),
            name: name.into(),
            description: "A quiet tracking room".into(),
            location: location.into(),
            hourly_rate: rate,
            images: vec![],
            features: vec![],
            visibility,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let l = listing("Blue", "Kicukiro", 10.0, Visibility::Suspended);
        assert!(ListingQuery::default().matches(&l));
    }

    #[test]
    fn filters_combine() {
        let l = listing("Blue Booth", "Kicukiro", 30.0, Visibility::Public);
        let query = ListingQuery {
            visibility: Some(Visibility::Public),
            location: Some("kicu".into()),
            name: Some("BOOTH".into()),
            min_rate: Some(20.0),
            max_rate: Some(30.0),
            ..ListingQuery::default()
        };
        assert!(query.matches(&l));

        let too_cheap = ListingQuery {
            min_rate: Some(31.0),
            ..query.clone()
        };
        assert!(!too_cheap.matches(&l));

        assert!(!ListingQuery::with_visibility(Visibility::Pending).matches(&l));
    }
}
