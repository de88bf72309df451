//! CRUD operations for [`Booking`] records.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};
use studio_shared::models::Booking;
use studio_shared::repository::BookingQuery;
use studio_shared::{AccountId, BookingId, BookingStatus, ListingId};

use crate::database::{format_ts, not_found, parse_label, parse_ts, parse_uuid, Database};
use crate::error::{Result, StoreError};

const BOOKING_COLUMNS: &str = "b.id, b.listing_id, b.user_id, b.guest_name, b.start_at, \
                               b.end_at, b.status, b.total_price, b.price_source, b.message, \
                               b.payment_method, b.payer_phone, b.created_at";

impl Database {
    pub fn create_booking(&self, booking: &Booking) -> Result<()> {
        self.conn().execute(
            "INSERT INTO bookings (id, listing_id, user_id, guest_name, start_at, end_at, status,
                                   total_price, price_source, message, payment_method,
                                   payer_phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                booking.id.to_string(),
                booking.listing_id.to_string(),
                booking.user_id.map(|u| u.to_string()),
                booking.guest_name,
                format_ts(&booking.start),
                format_ts(&booking.end),
                booking.status.as_str(),
                booking.total_price,
                booking.price_source.as_str(),
                booking.message,
                booking.payment_method,
                booking.payer_phone,
                format_ts(&booking.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.conn()
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?1"),
                params![id.to_string()],
                row_to_booking,
            )
            .map_err(not_found)
    }

    /// Overwrite the status unconditionally. Returns `true` if a row changed.
    pub fn update_booking_status(&self, id: BookingId, status: BookingStatus) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE bookings SET status = ?2 WHERE id = ?1",
            params![id.to_string(), status.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Bookings matching `query`, newest first.
    pub fn query_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(booker) = query.booker {
            clauses.push("b.user_id = ?");
            values.push(Value::Text(booker.to_string()));
        }
        if let Some(owner) = query.listing_owner {
            clauses.push("l.owner_id = ?");
            values.push(Value::Text(owner.to_string()));
        }
        if let Some(listing) = query.listing_id {
            clauses.push("b.listing_id = ?");
            values.push(Value::Text(listing.to_string()));
        }
        if let Some(status) = query.status {
            clauses.push("b.status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let limit_sql = match query.limit {
            Some(n) => {
                values.push(Value::Integer(n as i64));
                "LIMIT ?"
            }
            None => "",
        };

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BOOKING_COLUMNS}
             FROM bookings b JOIN listings l ON l.id = b.listing_id
             {where_sql}
             ORDER BY b.created_at DESC, b.rowid DESC
             {limit_sql}"
        ))?;

        let rows = stmt.query_map(params_from_iter(values), row_to_booking)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn list_bookings_for_user(&self, user: AccountId) -> Result<Vec<Booking>> {
        self.query_bookings(&BookingQuery {
            booker: Some(user),
            ..BookingQuery::default()
        })
    }

    pub fn list_bookings_for_listing(&self, listing: ListingId) -> Result<Vec<Booking>> {
        self.query_bookings(&BookingQuery {
            listing_id: Some(listing),
            ..BookingQuery::default()
        })
    }
}

fn row_to_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
    let id_str: String = row.get(0)?;
    let listing_str: String = row.get(1)?;
    let user_str: Option<String> = row.get(2)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let source_str: String = row.get(8)?;
    let created_str: String = row.get(12)?;

    let user_id = user_str
        .map(|s| parse_uuid(2, &s).map(AccountId))
        .transpose()?;

    Ok(Booking {
        id: BookingId(parse_uuid(0, &id_str)?),
        listing_id: ListingId(parse_uuid(1, &listing_str)?),
        user_id,
        guest_name: row.get(3)?,
        start: parse_ts(4, &start_str)?,
        end: parse_ts(5, &end_str)?,
        status: parse_label(6, &status_str)?,
        total_price: row.get(7)?,
        price_source: parse_label(8, &source_str)?,
        message: row.get(9)?,
        payment_method: row.get(10)?,
        payer_phone: row.get(11)?,
        created_at: parse_ts(12, &created_str)?,
    })
}
