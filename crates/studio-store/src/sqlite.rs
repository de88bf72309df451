//! Thread-safe repository adapter over [`Database`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use studio_shared::error::RepoResult;
use studio_shared::models::{Account, Booking, Listing, Message, Review};
use studio_shared::repository::{
    AccountRepository, BookingQuery, BookingRepository, ListingQuery, ListingRepository,
    MessageRepository, ReviewRepository,
};
use studio_shared::{AccountId, BookingId, BookingStatus, ListingId, Role, Visibility};

use crate::database::Database;
use crate::error::{optional, Result, StoreError};

/// A [`Database`] behind a mutex, shareable across request handlers.
///
/// Each call holds the connection for one statement or one transaction.
/// Multi-step writes that must be atomic (review + rating, guarded listing
/// deletion) run inside a single SQLite transaction.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut Database) -> Result<T>) -> RepoResult<T> {
        let mut guard = self.lock()?;
        f(&mut guard).map_err(Into::into)
    }
}

impl AccountRepository for SqliteStore {
    fn create_account(&self, account: &Account) -> RepoResult<()> {
        self.with_db(|db| db.create_account(account))
    }

    fn get_account(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.with_db(|db| optional(db.get_account(id)))
    }

    fn find_account_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        self.with_db(|db| optional(db.get_account_by_email(email)))
    }

    fn list_accounts(&self, role: Option<Role>) -> RepoResult<Vec<Account>> {
        self.with_db(|db| db.list_accounts(role))
    }
}

impl ListingRepository for SqliteStore {
    fn create_listing(&self, listing: &Listing) -> RepoResult<()> {
        self.with_db(|db| db.create_listing(listing))
    }

    fn get_listing(&self, id: ListingId) -> RepoResult<Option<Listing>> {
        self.with_db(|db| optional(db.get_listing(id)))
    }

    fn update_listing(&self, listing: &Listing) -> RepoResult<bool> {
        self.with_db(|db| db.update_listing(listing))
    }

    fn set_listing_visibility(&self, id: ListingId, visibility: Visibility) -> RepoResult<bool> {
        self.with_db(|db| db.set_listing_visibility(id, visibility))
    }

    fn delete_listing(&self, id: ListingId) -> RepoResult<bool> {
        self.with_db(|db| db.delete_listing(id))
    }

    fn query_listings(&self, query: &ListingQuery) -> RepoResult<Vec<Listing>> {
        self.with_db(|db| db.query_listings(query))
    }

    fn listing_locations(&self) -> RepoResult<Vec<String>> {
        self.with_db(|db| db.list_locations())
    }
}

impl BookingRepository for SqliteStore {
    fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
        self.with_db(|db| db.create_booking(booking))
    }

    fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        self.with_db(|db| optional(db.get_booking(id)))
    }

    fn update_booking_status(&self, id: BookingId, status: BookingStatus) -> RepoResult<bool> {
        self.with_db(|db| db.update_booking_status(id, status))
    }

    fn query_bookings(&self, query: &BookingQuery) -> RepoResult<Vec<Booking>> {
        self.with_db(|db| db.query_bookings(query))
    }
}

impl MessageRepository for SqliteStore {
    fn create_message(&self, message: &Message) -> RepoResult<()> {
        self.with_db(|db| db.insert_message(message))
    }

    fn messages_involving(&self, account: AccountId) -> RepoResult<Vec<Message>> {
        self.with_db(|db| db.get_messages_involving(account))
    }

    fn conversation(&self, a: AccountId, b: AccountId) -> RepoResult<Vec<Message>> {
        self.with_db(|db| db.get_conversation(a, b))
    }
}

impl ReviewRepository for SqliteStore {
    fn add_review(&self, review: &Review) -> RepoResult<f64> {
        self.with_db(|db| db.add_review(review))
    }

    fn list_reviews(&self, listing_id: Option<ListingId>) -> RepoResult<Vec<Review>> {
        self.with_db(|db| db.list_reviews(listing_id))
    }
}
