//! Shared setup for the service and router tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use studio_shared::models::{Account, Listing};
use studio_shared::repository::Repositories;
use studio_shared::{AccountId, Actor, ListingId, Role, Visibility};
use studio_store::MemoryStore;

pub fn store() -> Arc<dyn Repositories> {
    Arc::new(MemoryStore::new())
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0).unwrap()
}

pub fn seed_account(repo: &Arc<dyn Repositories>, email: &str, role: Role) -> Actor {
    let account = Account {
        id: AccountId::new(),
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: String::new(),
        role,
        avatar: None,
        created_at: Utc::now(),
    };
    repo.create_account(&account).unwrap();
    Actor::new(account.id, role)
}

pub fn seed_listing(
    repo: &Arc<dyn Repositories>,
    owner: &Actor,
    rate: f64,
    visibility: Visibility,
) -> Listing {
    let listing = Listing {
        id: ListingId::new(),
        owner_id: owner.id,
        name: "Echo Room".into(),
        description: "Treated live room with a grand piano".into(),
        location: "Kigali, Gasabo".into(),
        hourly_rate: rate,
        images: vec![],
        features: vec!["piano".into()],
        visibility,
        rating: 0.0,
        created_at: Utc::now(),
    };
    repo.create_listing(&listing).unwrap();
    listing
}
