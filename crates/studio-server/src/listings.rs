//! Listing management, discovery and visibility moderation.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use studio_shared::constants::MIN_DESCRIPTION_LEN;
use studio_shared::error::DomainResult;
use studio_shared::models::Listing;
use studio_shared::policy;
use studio_shared::repository::{ListingQuery, Repositories};
use studio_shared::visibility::{classify, initial_visibility};
use studio_shared::{AccountId, Actor, DomainError, ListingId, RepositoryError, Role, Visibility};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    pub name: String,
    pub description: String,
    pub location: String,
    pub hourly_rate: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Admin-created listing: may be assigned to another owner and published
/// immediately.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualListing {
    #[serde(flatten)]
    pub listing: ListingInput,
    #[serde(default)]
    pub owner_id: Option<AccountId>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub hourly_rate: Option<f64>,
    pub images: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryFilter {
    pub location: Option<String>,
    pub name: Option<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
}

fn validate_text(name: &str, description: &str, location: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Name is required"));
    }
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(DomainError::validation(format!(
            "Description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }
    if location.trim().is_empty() {
        return Err(DomainError::validation("Location is required"));
    }
    Ok(())
}

fn validate_rate(rate: f64) -> DomainResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(DomainError::validation("Hourly rate must be greater than zero"));
    }
    Ok(())
}

fn validate(input: &ListingInput) -> DomainResult<()> {
    validate_text(&input.name, &input.description, &input.location)?;
    validate_rate(input.hourly_rate)
}

#[derive(Clone)]
pub struct ListingService {
    repo: Arc<dyn Repositories>,
}

impl ListingService {
    pub fn new(repo: Arc<dyn Repositories>) -> Self {
        Self { repo }
    }

    fn build(owner: AccountId, input: ListingInput, visibility: Visibility) -> Listing {
        Listing {
            id: ListingId::new(),
            owner_id: owner,
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            location: input.location.trim().to_string(),
            hourly_rate: input.hourly_rate,
            images: input.images,
            features: input.features,
            visibility,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }

    fn require_admin(actor: &Actor) -> DomainResult<()> {
        if policy::can_moderate_listings(actor) {
            Ok(())
        } else {
            Err(DomainError::forbidden("Admin access required"))
        }
    }

    /// Owner-created listings always start out awaiting review.
    pub fn create(&self, actor: &Actor, input: ListingInput) -> DomainResult<Listing> {
        if !matches!(actor.role, Role::ListingOwner | Role::Admin) {
            return Err(DomainError::forbidden("Only listing owners can create listings"));
        }
        validate(&input)?;

        let listing = Self::build(actor.id, input, initial_visibility());
        self.repo.create_listing(&listing)?;
        info!(listing_id = %listing.id, owner = %actor.id, "Listing submitted for review");
        Ok(listing)
    }

    pub fn create_manual(&self, actor: &Actor, input: ManualListing) -> DomainResult<Listing> {
        Self::require_admin(actor)?;
        validate(&input.listing)?;

        let owner = input.owner_id.unwrap_or(actor.id);
        if self.repo.get_account(owner)?.is_none() {
            return Err(DomainError::not_found("Owner not found"));
        }

        let visibility = input.visibility.unwrap_or(Visibility::Public);
        let listing = Self::build(owner, input.listing, visibility);
        self.repo.create_listing(&listing)?;
        info!(listing_id = %listing.id, owner = %owner, %visibility, "Listing created by admin");
        Ok(listing)
    }

    pub fn get(&self, id: ListingId) -> DomainResult<Listing> {
        self.repo
            .get_listing(id)?
            .ok_or_else(|| DomainError::not_found("Listing not found"))
    }

    pub fn update(&self, actor: &Actor, id: ListingId, patch: ListingPatch) -> DomainResult<Listing> {
        let mut listing = self.get(id)?;
        if !policy::can_mutate_listing(actor, &listing) {
            return Err(DomainError::forbidden("Only the owner can edit this listing"));
        }

        if let Some(name) = patch.name {
            listing.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            listing.description = description.trim().to_string();
        }
        if let Some(location) = patch.location {
            listing.location = location.trim().to_string();
        }
        if let Some(rate) = patch.hourly_rate {
            validate_rate(rate)?;
            listing.hourly_rate = rate;
        }
        if let Some(images) = patch.images {
            listing.images = images;
        }
        if let Some(features) = patch.features {
            listing.features = features;
        }
        validate_text(&listing.name, &listing.description, &listing.location)?;

        if !self.repo.update_listing(&listing)? {
            return Err(DomainError::not_found("Listing not found"));
        }
        Ok(listing)
    }

    pub fn delete(&self, actor: &Actor, id: ListingId) -> DomainResult<()> {
        let listing = self.get(id)?;
        if !policy::can_mutate_listing(actor, &listing) {
            return Err(DomainError::forbidden("Only the owner can delete this listing"));
        }

        match self.repo.delete_listing(id) {
            Ok(true) => {
                info!(listing_id = %id, "Listing deleted");
                Ok(())
            }
            Ok(false) => Err(DomainError::not_found("Listing not found")),
            Err(RepositoryError::Conflict(msg)) => {
                warn!(listing_id = %id, reason = %msg, "Listing deletion refused");
                Err(DomainError::Conflict(msg))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open discovery: public listings only.
    pub fn discover(&self, filter: DiscoveryFilter) -> DomainResult<Vec<Listing>> {
        let query = ListingQuery {
            location: filter.location.filter(|s| !s.trim().is_empty()),
            name: filter.name.filter(|s| !s.trim().is_empty()),
            min_rate: filter.min_rate,
            max_rate: filter.max_rate,
            ..ListingQuery::with_visibility(Visibility::Public)
        };
        Ok(self.repo.query_listings(&query)?)
    }

    /// Values offered to the discovery location filter.
    pub fn locations(&self) -> DomainResult<Vec<String>> {
        Ok(self.repo.listing_locations()?)
    }

    pub fn mine(&self, actor: &Actor) -> DomainResult<Vec<Listing>> {
        Ok(self.repo.query_listings(&ListingQuery::owned_by(actor.id))?)
    }

    pub fn pending(&self, actor: &Actor) -> DomainResult<Vec<Listing>> {
        Self::require_admin(actor)?;
        Ok(self
            .repo
            .query_listings(&ListingQuery::with_visibility(Visibility::Pending))?)
    }

    pub fn all(&self, actor: &Actor) -> DomainResult<Vec<Listing>> {
        Self::require_admin(actor)?;
        Ok(self.repo.query_listings(&ListingQuery::default())?)
    }

    /// Persist any admin-issued visibility. The current state is not
    /// checked; the move is only classified for the log.
    pub fn set_visibility(
        &self,
        id: ListingId,
        target: Visibility,
        actor: &Actor,
    ) -> DomainResult<Listing> {
        Self::require_admin(actor)?;
        let mut listing = self.get(id)?;

        let change = classify(listing.visibility, target);
        if !self.repo.set_listing_visibility(id, target)? {
            return Err(DomainError::not_found("Listing not found"));
        }
        info!(
            listing_id = %id,
            from = %listing.visibility,
            to = %target,
            ?change,
            standard = change.is_standard(),
            admin = %actor.id,
            "Listing visibility changed"
        );
        listing.visibility = target;
        Ok(listing)
    }

    pub fn approve(&self, id: ListingId, actor: &Actor) -> DomainResult<Listing> {
        self.set_visibility(id, Visibility::Public, actor)
    }

    pub fn reject(&self, id: ListingId, actor: &Actor) -> DomainResult<Listing> {
        self.set_visibility(id, Visibility::Suspended, actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_account, seed_listing, store};
    use studio_shared::models::Booking;
    use studio_shared::{BookingId, BookingStatus, PriceSource};

    fn input(name: &str, rate: f64) -> ListingInput {
        ListingInput {
            name: name.into(),
            description: "Isolation booth with Neumann U87".into(),
            location: "Nyarugenge".into(),
            hourly_rate: rate,
            images: vec![],
            features: vec!["vocal".into()],
        }
    }

    #[test]
    fn owner_created_listing_is_pending_and_hidden() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let svc = ListingService::new(repo);

        let listing = svc.create(&owner, input("Booth A", 20.0)).unwrap();
        assert_eq!(listing.visibility, Visibility::Pending);
        assert!(svc.discover(DiscoveryFilter::default()).unwrap().is_empty());
        assert_eq!(svc.mine(&owner).unwrap().len(), 1);
    }

    #[test]
    fn create_validates_input_and_role() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let client = seed_account(&repo, "client@example.com", Role::Client);
        let svc = ListingService::new(repo);

        assert!(matches!(
            svc.create(&client, input("Booth", 20.0)),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.create(&owner, input("Booth", 0.0)),
            Err(DomainError::Validation(_))
        ));
        let short = ListingInput {
            description: "tiny".into(),
            ..input("Booth", 20.0)
        };
        assert!(matches!(svc.create(&owner, short), Err(DomainError::Validation(_))));
    }

    #[test]
    fn visibility_controls_discovery() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let admin = seed_account(&repo, "admin@example.com", Role::Admin);
        let listing = seed_listing(&repo, &owner, 25.0, Visibility::Pending);
        let svc = ListingService::new(repo);

        assert!(matches!(
            svc.set_visibility(listing.id, Visibility::Public, &owner),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.set_visibility(ListingId::new(), Visibility::Public, &admin),
            Err(DomainError::NotFound(_))
        ));

        svc.set_visibility(listing.id, Visibility::Public, &admin).unwrap();
        assert_eq!(svc.discover(DiscoveryFilter::default()).unwrap().len(), 1);

        svc.set_visibility(listing.id, Visibility::Suspended, &admin)
            .unwrap();
        assert!(svc.discover(DiscoveryFilter::default()).unwrap().is_empty());

        let reopened = svc
            .set_visibility(listing.id, Visibility::Pending, &admin)
            .unwrap();
        assert_eq!(reopened.visibility, Visibility::Pending);
        assert_eq!(svc.pending(&admin).unwrap().len(), 1);
        assert!(svc.pending(&owner).is_err());
    }

    #[test]
    fn locations_cover_every_listing_once() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        seed_listing(&repo, &owner, 20.0, Visibility::Public);
        seed_listing(&repo, &owner, 30.0, Visibility::Pending);
        let svc = ListingService::new(repo.clone());
        assert_eq!(svc.locations().unwrap().len(), 1);

        let admin = seed_account(&repo, "admin@example.com", Role::Admin);
        let mut other = input("Loft", 40.0);
        other.location = "Gasabo".into();
        svc.create_manual(
            &admin,
            ManualListing {
                listing: other,
                owner_id: Some(owner.id),
                visibility: None,
            },
        )
        .unwrap();

        let locations = svc.locations().unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0], "Gasabo");
    }

    #[test]
    fn discovery_filters() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let admin = seed_account(&repo, "admin@example.com", Role::Admin);
        let svc = ListingService::new(repo);

        for (name, rate) in [("Cheap Booth", 10.0), ("Grand Hall", 80.0)] {
            svc.create_manual(
                &admin,
                ManualListing {
                    listing: input(name, rate),
                    owner_id: Some(owner.id),
                    visibility: None,
                },
            )
            .unwrap();
        }

        let found = svc
            .discover(DiscoveryFilter {
                min_rate: Some(50.0),
                ..DiscoveryFilter::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grand Hall");
        assert_eq!(found[0].owner_id, owner.id);

        let by_name = svc
            .discover(DiscoveryFilter {
                name: Some("booth".into()),
                location: Some("nyaru".into()),
                ..DiscoveryFilter::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(svc.all(&admin).unwrap().len(), 2);
    }

    #[test]
    fn update_is_owner_only_and_keeps_visibility() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let other = seed_account(&repo, "other@example.com", Role::ListingOwner);
        let listing = seed_listing(&repo, &owner, 25.0, Visibility::Public);
        let svc = ListingService::new(repo);

        let patch = ListingPatch {
            hourly_rate: Some(30.0),
            ..ListingPatch::default()
        };
        assert!(matches!(
            svc.update(&other, listing.id, patch.clone()),
            Err(DomainError::Forbidden(_))
        ));
        let updated = svc.update(&owner, listing.id, patch).unwrap();
        assert_eq!(updated.hourly_rate, 30.0);
        assert_eq!(updated.visibility, Visibility::Public);

        assert!(matches!(
            svc.update(
                &owner,
                listing.id,
                ListingPatch {
                    hourly_rate: Some(-1.0),
                    ..ListingPatch::default()
                }
            ),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn delete_is_refused_while_bookings_are_active() {
        let repo = store();
        let owner = seed_account(&repo, "owner@example.com", Role::ListingOwner);
        let listing = seed_listing(&repo, &owner, 25.0, Visibility::Public);
        let start = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            listing_id: listing.id,
            user_id: None,
            guest_name: Some("Walk-in".into()),
            start,
            end: start + chrono::Duration::hours(1),
            status: BookingStatus::Confirmed,
            total_price: 25.0,
            price_source: PriceSource::Computed,
            message: None,
            payment_method: None,
            payer_phone: None,
            created_at: start,
        };
        repo.create_booking(&booking).unwrap();
        let svc = ListingService::new(repo.clone());

        assert!(matches!(
            svc.delete(&owner, listing.id),
            Err(DomainError::Conflict(_))
        ));
        repo.update_booking_status(booking.id, BookingStatus::Completed)
            .unwrap();
        svc.delete(&owner, listing.id).unwrap();
        assert!(matches!(svc.get(listing.id), Err(DomainError::NotFound(_))));
    }
}
