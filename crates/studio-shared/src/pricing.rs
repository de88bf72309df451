//! Booking price derivation.
//!
//! A non-zero price supplied by the caller is trusted verbatim; there is no
//! cross-check against `hours x rate`. The returned [`Quote`] records which
//! path produced the figure so the booking can carry a [`PriceSource`] tag.

use chrono::{DateTime, Utc};

use crate::constants::MILLIS_PER_HOUR;
use crate::error::{DomainError, DomainResult};
use crate::types::PriceSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub total: f64,
    pub source: PriceSource,
}

/// Length of `[start, end)` in fractional hours.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Compute the charge for a booking.
///
/// `hourly_rate` is only invoked when no usable explicit price was given, so
/// callers can defer the listing lookup (and its `ListingNotFound` failure)
/// to the case where the rate is actually needed.
pub fn compute_price<F>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    explicit_price: Option<f64>,
    hourly_rate: F,
) -> DomainResult<Quote>
where
    F: FnOnce() -> DomainResult<f64>,
{
    if let Some(price) = explicit_price {
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::validation(
                "Total price must be a non-negative number",
            ));
        }
        // Zero means "not supplied".
        if price != 0.0 {
            return Ok(Quote {
                total: price,
                source: PriceSource::CallerSupplied,
            });
        }
    }

    let rate = hourly_rate()?;
    Ok(Quote {
        total: hours_between(start, end) * rate,
        source: PriceSource::Computed,
    })
}
