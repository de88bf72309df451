//! Booking creation, retrieval and status changes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use studio_shared::error::DomainResult;
use studio_shared::models::{Booking, BookingDetails, Listing, ListingSummary};
use studio_shared::policy;
use studio_shared::pricing::compute_price;
use studio_shared::repository::{BookingQuery, Repositories};
use studio_shared::transitions::TransitionPolicy;
use studio_shared::{Actor, BookingId, BookingStatus, DomainError, ListingId, Perspective};
use tracing::{info, warn};

use crate::messaging::MessageSideEffect;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    pub listing_id: ListingId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payer_phone: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Note delivered to the listing owner: the booking message, with the payer
/// phone on a second line when one was given.
pub fn owner_note(message: &str, payer_phone: Option<&str>) -> String {
    match payer_phone {
        Some(phone) => format!("{message}\nPhone: {phone}"),
        None => message.to_string(),
    }
}

#[derive(Clone)]
pub struct BookingEngine {
    repo: Arc<dyn Repositories>,
    messages: MessageSideEffect,
    transitions: TransitionPolicy,
}

impl BookingEngine {
    pub fn new(
        repo: Arc<dyn Repositories>,
        messages: MessageSideEffect,
        transitions: TransitionPolicy,
    ) -> Self {
        Self {
            repo,
            messages,
            transitions,
        }
    }

    fn listing(&self, id: ListingId) -> DomainResult<Listing> {
        self.repo
            .get_listing(id)?
            .ok_or(DomainError::ListingNotFound(id))
    }

    fn booking(&self, id: BookingId) -> DomainResult<Booking> {
        self.repo
            .get_booking(id)?
            .ok_or_else(|| DomainError::not_found("Booking not found"))
    }

    pub fn create_booking(&self, input: CreateBooking, actor: Option<&Actor>) -> DomainResult<Booking> {
        if input.start >= input.end {
            return Err(DomainError::InvalidRange);
        }

        let guest_name = non_empty(input.guest_name);
        if actor.is_none() && guest_name.is_none() {
            return Err(DomainError::validation("Guest name is required"));
        }

        let listing = self.listing(input.listing_id)?;
        let quote = compute_price(input.start, input.end, input.total_price, || {
            Ok(listing.hourly_rate)
        })?;

        let message = non_empty(input.message);
        let payer_phone = non_empty(input.payer_phone);
        let booking = Booking {
            id: BookingId::new(),
            listing_id: listing.id,
            user_id: actor.map(|a| a.id),
            guest_name: guest_name.clone(),
            start: input.start,
            end: input.end,
            status: BookingStatus::Pending,
            total_price: quote.total,
            price_source: quote.source,
            message: message.clone(),
            payment_method: non_empty(input.payment_method),
            payer_phone: payer_phone.clone(),
            created_at: Utc::now(),
        };
        self.repo.create_booking(&booking)?;
        info!(
            booking_id = %booking.id,
            listing_id = %listing.id,
            guest = booking.is_guest(),
            total = booking.total_price,
            source = %booking.price_source,
            "Booking created"
        );

        if let Some(message) = message {
            let content = owner_note(&message, payer_phone.as_deref());
            let sender_guest_name = if actor.is_some() { None } else { guest_name };
            if let Err(e) = self.messages.record(
                actor.map(|a| a.id),
                listing.owner_id,
                content,
                sender_guest_name,
            ) {
                warn!(booking_id = %booking.id, error = %e, "Booking message was not delivered");
            }
        }

        Ok(booking)
    }

    pub fn get_booking(&self, id: BookingId, requester: Option<&Actor>) -> DomainResult<BookingDetails> {
        let booking = self.booking(id)?;
        let listing = self.listing(booking.listing_id)?;

        if !policy::can_view_booking(&booking, listing.owner_id, requester) {
            return Err(DomainError::forbidden("Not authorized to view this booking"));
        }

        Ok(BookingDetails {
            booking,
            listing: ListingSummary::from(&listing),
        })
    }

    pub fn list_bookings_for_requester(
        &self,
        actor: Option<&Actor>,
        perspective: Perspective,
    ) -> DomainResult<Vec<BookingDetails>> {
        let actor = actor.ok_or(DomainError::Unauthorized)?;
        let query = match perspective {
            Perspective::AsBooker => BookingQuery {
                booker: Some(actor.id),
                ..BookingQuery::default()
            },
            Perspective::AsOwner => BookingQuery {
                listing_owner: Some(actor.id),
                ..BookingQuery::default()
            },
        };
        self.with_listings(self.repo.query_bookings(&query)?)
    }

    /// Attach a listing summary to each booking.
    pub fn with_listings(&self, bookings: Vec<Booking>) -> DomainResult<Vec<BookingDetails>> {
        let mut summaries: HashMap<ListingId, ListingSummary> = HashMap::new();
        let mut details = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let listing = match summaries.get(&booking.listing_id) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = ListingSummary::from(&self.listing(booking.listing_id)?);
                    summaries.insert(booking.listing_id, summary.clone());
                    summary
                }
            };
            details.push(BookingDetails { booking, listing });
        }
        Ok(details)
    }

    pub fn update_status(
        &self,
        id: BookingId,
        target: BookingStatus,
        actor: &Actor,
    ) -> DomainResult<Booking> {
        let mut booking = self.booking(id)?;
        let listing = self.listing(booking.listing_id)?;

        if !policy::can_mutate_booking(actor, &listing) {
            return Err(DomainError::forbidden(
                "Only the listing owner can update this booking",
            ));
        }
        self.transitions.check(booking.status, target)?;

        if !self.repo.update_booking_status(id, target)? {
            return Err(DomainError::not_found("Booking not found"));
        }
        info!(booking_id = %id, from = %booking.status, to = %target, "Booking status updated");
        booking.status = target;
        Ok(booking)
    }
}
