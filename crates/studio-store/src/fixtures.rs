//! Record builders shared by the store's unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use studio_shared::models::{Account, Booking, Listing, Message, Review};
use studio_shared::{
    AccountId, BookingId, BookingStatus, ListingId, MessageId, PriceSource, ReviewId, Role,
    Visibility,
};

pub fn account(email: &str, role: Role) -> Account {
    Account {
        id: AccountId::new(),
        name: "Aline".into(),
        email: email.into(),
        password_hash: "$argon2id$stub".into(),
        role,
        avatar: None,
        created_at: Utc::now(),
    }
}

pub fn listing(owner: AccountId, name: &str, rate: f64, visibility: Visibility) -> Listing {
    Listing {
        id: ListingId::new(),
        owner_id: owner,
        name: name.into(),
        description: "Vocal booth with treated walls".into(),
        location: "Kicukiro".into(),
        hourly_rate: rate,
        images: vec!["https://cdn.example/1.jpg".into()],
        features: vec!["mic".into(), "monitors".into()],
        visibility,
        rating: 0.0,
        created_at: Utc::now(),
    }
}

pub fn slot(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
}

pub fn booking(listing: ListingId, user: Option<AccountId>, status: BookingStatus) -> Booking {
    Booking {
        id: BookingId::new(),
        listing_id: listing,
        user_id: user,
        guest_name: user.is_none().then(|| "Walk-in".to_string()),
        start: slot(10),
        end: slot(10) + Duration::minutes(150),
        status,
        total_price: 62.5,
        price_source: PriceSource::Computed,
        message: None,
        payment_method: Some("MoMo".into()),
        payer_phone: None,
        created_at: Utc::now(),
    }
}

pub fn message(sender: Option<AccountId>, receiver: AccountId, content: &str) -> Message {
    Message {
        id: MessageId::new(),
        sender_id: sender,
        receiver_id: receiver,
        guest_name: sender.is_none().then(|| "Walk-in".to_string()),
        content: content.into(),
        created_at: Utc::now(),
    }
}

pub fn review(listing: ListingId, author: AccountId, rating: u8) -> Review {
    Review {
        id: ReviewId::new(),
        listing_id: listing,
        author_id: author,
        rating,
        comment: None,
        created_at: Utc::now(),
    }
}
