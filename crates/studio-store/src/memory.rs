//! In-memory repository used as a test double for the server's services.
//!
//! All state sits behind one mutex, so every trait method (including the
//! review + rating update) is atomic. Ordering matches [`SqliteStore`]:
//! newest first unless documented otherwise, insertion order breaking ties.
//!
//! [`SqliteStore`]: crate::SqliteStore

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use studio_shared::error::RepoResult;
use studio_shared::models::{Account, Booking, Listing, Message, Review};
use studio_shared::repository::{
    AccountRepository, BookingQuery, BookingRepository, ListingQuery, ListingRepository,
    MessageRepository, ReviewRepository,
};
use studio_shared::{
    AccountId, BookingId, BookingStatus, ListingId, RepositoryError, Role, Visibility,
};

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    listings: Vec<Listing>,
    bookings: Vec<Booking>,
    messages: Vec<Message>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Backend("memory store lock poisoned".into()))
    }
}

/// Stable newest-first ordering: later insertions win ties.
fn newest_first<T: Clone>(items: &[T], created: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    let mut indexed: Vec<(usize, &T)> = items.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| created(b).cmp(&created(a)).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, item)| item.clone()).collect()
}

impl AccountRepository for MemoryStore {
    fn create_account(&self, account: &Account) -> RepoResult<()> {
        let mut state = self.lock()?;
        let email = account.email.to_lowercase();
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(RepositoryError::Conflict(format!("email {email} already registered")));
        }
        state.accounts.push(Account {
            email,
            ..account.clone()
        });
        Ok(())
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        Ok(self.lock()?.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn find_account_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let email = email.to_lowercase();
        Ok(self
            .lock()?
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    fn list_accounts(&self, role: Option<Role>) -> RepoResult<Vec<Account>> {
        let state = self.lock()?;
        let mut accounts = newest_first(&state.accounts, |a| a.created_at);
        accounts.retain(|a| role.map_or(true, |r| a.role == r));
        Ok(accounts)
    }
}

impl ListingRepository for MemoryStore {
    fn create_listing(&self, listing: &Listing) -> RepoResult<()> {
        let mut state = self.lock()?;
        if !state.accounts.iter().any(|a| a.id == listing.owner_id) {
            return Err(RepositoryError::Conflict("unknown listing owner".into()));
        }
        state.listings.push(listing.clone());
        Ok(())
    }

    fn get_listing(&self, id: ListingId) -> RepoResult<Option<Listing>> {
        Ok(self.lock()?.listings.iter().find(|l| l.id == id).cloned())
    }

    fn update_listing(&self, listing: &Listing) -> RepoResult<bool> {
        let mut state = self.lock()?;
        let Some(stored) = state.listings.iter_mut().find(|l| l.id == listing.id) else {
            return Ok(false);
        };
        stored.name = listing.name.clone();
        stored.description = listing.description.clone();
        stored.location = listing.location.clone();
        stored.hourly_rate = listing.hourly_rate;
        stored.images = listing.images.clone();
        stored.features = listing.features.clone();
        Ok(true)
    }

    fn set_listing_visibility(&self, id: ListingId, visibility: Visibility) -> RepoResult<bool> {
        let mut state = self.lock()?;
        match state.listings.iter_mut().find(|l| l.id == id) {
            Some(listing) => {
                listing.visibility = visibility;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_listing(&self, id: ListingId) -> RepoResult<bool> {
        let mut state = self.lock()?;
        let active = state
            .bookings
            .iter()
            .filter(|b| b.listing_id == id && b.status.is_active())
            .count();
        if active > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Listing has {active} active booking(s)"
            )));
        }

        let before = state.listings.len();
        state.listings.retain(|l| l.id != id);
        if state.listings.len() == before {
            return Ok(false);
        }
        state.bookings.retain(|b| b.listing_id != id);
        state.reviews.retain(|r| r.listing_id != id);
        Ok(true)
    }

    fn query_listings(&self, query: &ListingQuery) -> RepoResult<Vec<Listing>> {
        let state = self.lock()?;
        let mut listings = newest_first(&state.listings, |l| l.created_at);
        listings.retain(|l| query.matches(l));
        Ok(listings)
    }

    fn listing_locations(&self) -> RepoResult<Vec<String>> {
        let state = self.lock()?;
        let locations: BTreeSet<String> =
            state.listings.iter().map(|l| l.location.clone()).collect();
        Ok(locations.into_iter().collect())
    }
}

impl BookingRepository for MemoryStore {
    fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
        let mut state = self.lock()?;
        if !state.listings.iter().any(|l| l.id == booking.listing_id) {
            return Err(RepositoryError::Conflict("unknown listing".into()));
        }
        if booking.start >= booking.end {
            return Err(RepositoryError::Conflict("booking range is empty".into()));
        }
        if booking.user_id.is_none() && booking.guest_name.is_none() {
            return Err(RepositoryError::Conflict("guest booking without a name".into()));
        }
        state.bookings.push(booking.clone());
        Ok(())
    }

    fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        Ok(self.lock()?.bookings.iter().find(|b| b.id == id).cloned())
    }

    fn update_booking_status(&self, id: BookingId, status: BookingStatus) -> RepoResult<bool> {
        let mut state = self.lock()?;
        match state.bookings.iter_mut().find(|b| b.id == id) {
            Some(booking) => {
                booking.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn query_bookings(&self, query: &BookingQuery) -> RepoResult<Vec<Booking>> {
        let state = self.lock()?;
        let owners: HashMap<ListingId, AccountId> =
            state.listings.iter().map(|l| (l.id, l.owner_id)).collect();

        let mut bookings = newest_first(&state.bookings, |b| b.created_at);
        bookings.retain(|b| {
            query.booker.map_or(true, |u| b.user_id == Some(u))
                && query
                    .listing_owner
                    .map_or(true, |o| owners.get(&b.listing_id) == Some(&o))
                && query.listing_id.map_or(true, |l| b.listing_id == l)
                && query.status.map_or(true, |s| b.status == s)
        });
        if let Some(limit) = query.limit {
            bookings.truncate(limit);
        }
        Ok(bookings)
    }
}

impl MessageRepository for MemoryStore {
    fn create_message(&self, message: &Message) -> RepoResult<()> {
        let mut state = self.lock()?;
        if !state.accounts.iter().any(|a| a.id == message.receiver_id) {
            return Err(RepositoryError::Conflict("unknown receiver".into()));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    fn messages_involving(&self, account: AccountId) -> RepoResult<Vec<Message>> {
        let state = self.lock()?;
        let mut messages = newest_first(&state.messages, |m| m.created_at);
        messages.retain(|m| m.sender_id == Some(account) || m.receiver_id == account);
        Ok(messages)
    }

    fn conversation(&self, a: AccountId, b: AccountId) -> RepoResult<Vec<Message>> {
        let state = self.lock()?;
        let mut messages = newest_first(&state.messages, |m| m.created_at);
        messages.retain(|m| {
            (m.sender_id == Some(a) && m.receiver_id == b)
                || (m.sender_id == Some(b) && m.receiver_id == a)
        });
        messages.reverse();
        Ok(messages)
    }
}

impl ReviewRepository for MemoryStore {
    fn add_review(&self, review: &Review) -> RepoResult<f64> {
        let mut state = self.lock()?;
        if !state.listings.iter().any(|l| l.id == review.listing_id) {
            return Err(RepositoryError::NotFound);
        }
        state.reviews.push(review.clone());

        let ratings: Vec<f64> = state
            .reviews
            .iter()
            .filter(|r| r.listing_id == review.listing_id)
            .map(|r| f64::from(r.rating))
            .collect();
        let average = ratings.iter().sum::<f64>() / ratings.len() as f64;

        if let Some(listing) = state.listings.iter_mut().find(|l| l.id == review.listing_id) {
            listing.rating = average;
        }
        Ok(average)
    }

    fn list_reviews(&self, listing_id: Option<ListingId>) -> RepoResult<Vec<Review>> {
        let state = self.lock()?;
        let mut reviews = newest_first(&state.reviews, |r| r.created_at);
        reviews.retain(|r| listing_id.map_or(true, |l| r.listing_id == l));
        Ok(reviews)
    }
}
