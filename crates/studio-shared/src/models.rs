//! Domain records exchanged between the store and the server.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be returned
//! directly as a JSON response body. Field names use camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountId, BookingId, BookingStatus, ListingId, MessageId, PriceSource, ReviewId, Role,
    Visibility,
};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A registered identity. The role never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Unique, stored lower-cased.
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of an [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            avatar: account.avatar.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A bookable studio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: AccountId,
    pub name: String,
    pub description: String,
    pub location: String,
    /// Price per hour, always positive.
    pub hourly_rate: f64,
    pub images: Vec<String>,
    pub features: Vec<String>,
    pub visibility: Visibility,
    /// Average review rating, `0.0` until the first review.
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

/// The slice of a listing embedded in booking responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: ListingId,
    pub name: String,
    pub location: String,
    pub owner_id: AccountId,
}

impl From<&Listing> for ListingSummary {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id,
            name: listing.name.clone(),
            location: listing.location.clone(),
            owner_id: listing.owner_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// A reservation of a listing over the half-open interval `[start, end)`.
///
/// `user_id == None` marks a guest booking, which always carries a
/// `guest_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub listing_id: ListingId,
    pub user_id: Option<AccountId>,
    pub guest_name: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: f64,
    pub price_source: PriceSource,
    pub message: Option<String>,
    pub payment_method: Option<String>,
    pub payer_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }
}

/// A booking together with the listing it reserves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub listing: ListingSummary,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A one-directional note. `sender_id == None` marks a guest sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: Option<AccountId>,
    pub receiver_id: AccountId,
    pub guest_name: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One row of the inbox overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Id of the latest message in the conversation.
    pub id: MessageId,
    /// `None` for guest conversations.
    pub participant_id: Option<AccountId>,
    pub participant_name: String,
    pub participant_avatar: Option<String>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub listing_id: ListingId,
    pub author_id: AccountId,
    /// Whole stars, 1 to 5.
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
