//! Capability checks for bookings, listings and moderation.
//!
//! Booking reads use a capability-by-possession-of-id model: anyone who holds
//! a booking id may read it anonymously (guest receipt page), and a guest
//! booking stays readable by any signed-in account. [`ViewerRelation`] makes
//! that trade-off explicit instead of hiding it in boolean conditions.

use serde::Serialize;

use crate::models::{Booking, Listing};
use crate::types::{AccountId, Actor};

/// How a requester relates to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRelation {
    /// No credential presented.
    Anonymous,
    Booker,
    /// Owns the booked listing.
    Owner,
    /// Signed in, neither booker nor owner.
    Unrelated,
}

pub fn relation(
    booking: &Booking,
    listing_owner: AccountId,
    requester: Option<&Actor>,
) -> ViewerRelation {
    match requester {
        None => ViewerRelation::Anonymous,
        Some(actor) if booking.user_id == Some(actor.id) => ViewerRelation::Booker,
        Some(actor) if actor.id == listing_owner => ViewerRelation::Owner,
        Some(_) => ViewerRelation::Unrelated,
    }
}

pub fn can_view_booking(
    booking: &Booking,
    listing_owner: AccountId,
    requester: Option<&Actor>,
) -> bool {
    match relation(booking, listing_owner, requester) {
        ViewerRelation::Anonymous | ViewerRelation::Booker | ViewerRelation::Owner => true,
        ViewerRelation::Unrelated => booking.is_guest(),
    }
}

pub fn can_moderate_listings(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Only the owner of the booked listing may change a booking. The booker
/// cannot, and neither can an admin.
pub fn can_mutate_booking(actor: &Actor, listing: &Listing) -> bool {
    actor.id == listing.owner_id
}

pub fn can_mutate_listing(actor: &Actor, listing: &Listing) -> bool {
    actor.id == listing.owner_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingId, BookingStatus, ListingId, PriceSource, Role, Visibility};
    use chrono::{Duration, Utc};

    fn listing(owner: AccountId) -> Listing {
        Listing {
            id: ListingId::new(),
            owner_id: owner,
            name: "Echo Room".into(),
            description: "Treated live room".into(),
            location: "Gasabo".into(),
            hourly_rate: 25.0,
            images: vec![],
            features: vec![],
            visibility: Visibility::Public,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }

    fn booking(listing: &Listing, user_id: Option<AccountId>) -> Booking {
        let start = Utc::now();
        Booking {
            id: BookingId::new(),
            listing_id: listing.id,
            user_id,
            guest_name: user_id.is_none().then(|| "Guest".to_string()),
            start,
            end: start + Duration::hours(1),
            status: BookingStatus::Pending,
            total_price: 25.0,
            price_source: PriceSource::Computed,
            message: None,
            payment_method: None,
            payer_phone: None,
            created_at: start,
        }
    }

    fn client() -> Actor {
        Actor::new(AccountId::new(), Role::Client)
    }

    #[test]
    fn anonymous_requester_can_always_view() {
        let owner = AccountId::new();
        let l = listing(owner);
        let b = booking(&l, Some(AccountId::new()));
        assert_eq!(relation(&b, owner, None), ViewerRelation::Anonymous);
        assert!(can_view_booking(&b, owner, None));
    }

    #[test]
    fn booker_and_owner_can_view() {
        let owner = Actor::new(AccountId::new(), Role::ListingOwner);
        let booker = client();
        let l = listing(owner.id);
        let b = booking(&l, Some(booker.id));

        assert_eq!(relation(&b, owner.id, Some(&booker)), ViewerRelation::Booker);
        assert_eq!(relation(&b, owner.id, Some(&owner)), ViewerRelation::Owner);
        assert!(can_view_booking(&b, owner.id, Some(&booker)));
        assert!(can_view_booking(&b, owner.id, Some(&owner)));
    }

    #[test]
    fn unrelated_account_sees_guest_bookings_only() {
        let owner = AccountId::new();
        let l = listing(owner);
        let stranger = client();

        let guest = booking(&l, None);
        assert_eq!(relation(&guest, owner, Some(&stranger)), ViewerRelation::Unrelated);
        assert!(can_view_booking(&guest, owner, Some(&stranger)));

        let member = booking(&l, Some(AccountId::new()));
        assert!(!can_view_booking(&member, owner, Some(&stranger)));
    }

    #[test]
    fn admin_role_does_not_grant_booking_view() {
        let owner = AccountId::new();
        let l = listing(owner);
        let b = booking(&l, Some(AccountId::new()));
        let admin = Actor::new(AccountId::new(), Role::Admin);
        assert!(!can_view_booking(&b, owner, Some(&admin)));
    }

    #[test]
    fn only_listing_owner_mutates() {
        let owner = Actor::new(AccountId::new(), Role::ListingOwner);
        let l = listing(owner.id);
        let admin = Actor::new(AccountId::new(), Role::Admin);

        assert!(can_mutate_booking(&owner, &l));
        assert!(can_mutate_listing(&owner, &l));
        assert!(!can_mutate_booking(&admin, &l));
        assert!(!can_mutate_listing(&client(), &l));
    }

    #[test]
    fn moderation_requires_admin() {
        assert!(can_moderate_listings(&Actor::new(AccountId::new(), Role::Admin)));
        assert!(!can_moderate_listings(&Actor::new(
            AccountId::new(),
            Role::ListingOwner
        )));
    }
}
