//! CRUD operations for [`Listing`] records.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, TransactionBehavior};
use studio_shared::models::Listing;
use studio_shared::repository::ListingQuery;
use studio_shared::{AccountId, ListingId, Visibility};

use crate::database::{
    format_ts, not_found, parse_label, parse_string_list, parse_ts, parse_uuid, Database,
};
use crate::error::{Result, StoreError};

const LISTING_COLUMNS: &str = "id, owner_id, name, description, location, hourly_rate, \
                               images, features, visibility, rating, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create_listing(&self, listing: &Listing) -> Result<()> {
        self.conn().execute(
            "INSERT INTO listings (id, owner_id, name, description, location, hourly_rate,
                                   images, features, visibility, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                listing.id.to_string(),
                listing.owner_id.to_string(),
                listing.name,
                listing.description,
                listing.location,
                listing.hourly_rate,
                serde_json::to_string(&listing.images)?,
                serde_json::to_string(&listing.features)?,
                listing.visibility.as_str(),
                listing.rating,
                format_ts(&listing.created_at),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_listing(&self, id: ListingId) -> Result<Listing> {
        self.conn()
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
                params![id.to_string()],
                row_to_listing,
            )
            .map_err(not_found)
    }

    /// Listings matching `query`, newest first.
    pub fn query_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(visibility) = query.visibility {
            clauses.push("visibility = ?");
            values.push(Value::Text(visibility.as_str().to_string()));
        }
        if let Some(owner) = query.owner_id {
            clauses.push("owner_id = ?");
            values.push(Value::Text(owner.to_string()));
        }
        if let Some(location) = &query.location {
            clauses.push("instr(lower(location), lower(?)) > 0");
            values.push(Value::Text(location.clone()));
        }
        if let Some(name) = &query.name {
            clauses.push("instr(lower(name), lower(?)) > 0");
            values.push(Value::Text(name.clone()));
        }
        if let Some(min) = query.min_rate {
            clauses.push("hourly_rate >= ?");
            values.push(Value::Real(min));
        }
        if let Some(max) = query.max_rate {
            clauses.push("hourly_rate <= ?");
            values.push(Value::Real(max));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings {where_sql}
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params_from_iter(values), row_to_listing)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn list_listings_for_owner(&self, owner: AccountId) -> Result<Vec<Listing>> {
        self.query_listings(&ListingQuery::owned_by(owner))
    }

    pub fn list_locations(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT DISTINCT location FROM listings ORDER BY location")?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite the owner-editable columns. Visibility and rating are left
    /// alone. Returns `true` if a row was updated.
    pub fn update_listing(&self, listing: &Listing) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE listings
             SET name = ?2, description = ?3, location = ?4, hourly_rate = ?5,
                 images = ?6, features = ?7
             WHERE id = ?1",
            params![
                listing.id.to_string(),
                listing.name,
                listing.description,
                listing.location,
                listing.hourly_rate,
                serde_json::to_string(&listing.images)?,
                serde_json::to_string(&listing.features)?,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn set_listing_visibility(&self, id: ListingId, visibility: Visibility) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE listings SET visibility = ?2 WHERE id = ?1",
            params![id.to_string(), visibility.as_str()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a listing unless a pending or confirmed booking still
    /// references it. Finished bookings and reviews go with it
    /// (ON DELETE CASCADE).
    pub fn delete_listing(&mut self, id: ListingId) -> Result<bool> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let active: i64 = tx.query_row(
            "SELECT COUNT(*) FROM bookings
             WHERE listing_id = ?1 AND status IN ('PENDING', 'CONFIRMED')",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        if active > 0 {
            return Err(StoreError::Conflict(format!(
                "Listing has {active} active booking(s)"
            )));
        }

        let affected = tx.execute("DELETE FROM listings WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<Listing> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let images_str: String = row.get(6)?;
    let features_str: String = row.get(7)?;
    let visibility_str: String = row.get(8)?;
    let created_str: String = row.get(10)?;

    Ok(Listing {
        id: ListingId(parse_uuid(0, &id_str)?),
        owner_id: AccountId(parse_uuid(1, &owner_str)?),
        name: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        hourly_rate: row.get(5)?,
        images: parse_string_list(6, &images_str)?,
        features: parse_string_list(7, &features_str)?,
        visibility: parse_label(8, &visibility_str)?,
        rating: row.get(9)?,
        created_at: parse_ts(10, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{account, booking, listing};
    use studio_shared::{BookingStatus, Role};

    fn seeded() -> (Database, AccountId) {
        let db = Database::open_in_memory().unwrap();
        let owner = account("owner@example.com", Role::ListingOwner);
        db.create_account(&owner).unwrap();
        (db, owner.id)
    }

    #[test]
    fn create_and_fetch_preserves_lists() {
        let (db, owner) = seeded();
        let l = listing(owner, "Echo", 25.0, Visibility::Pending);
        db.create_listing(&l).unwrap();

        let fetched = db.get_listing(l.id).unwrap();
        assert_eq!(fetched, Listing { created_at: fetched.created_at, ..l });
        assert_eq!(fetched.features, vec!["mic".to_string(), "monitors".to_string()]);
    }

    #[test]
    fn discovery_query_only_returns_requested_visibility() {
        let (db, owner) = seeded();
        let public = listing(owner, "Public Room", 25.0, Visibility::Public);
        let pending = listing(owner, "Pending Room", 25.0, Visibility::Pending);
        db.create_listing(&public).unwrap();
        db.create_listing(&pending).unwrap();

        let found = db
            .query_listings(&ListingQuery::with_visibility(Visibility::Public))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, public.id);

        db.set_listing_visibility(public.id, Visibility::Suspended)
            .unwrap();
        assert!(db
            .query_listings(&ListingQuery::with_visibility(Visibility::Public))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rate_and_text_filters() {
        let (db, owner) = seeded();
        db.create_listing(&listing(owner, "Cheap Booth", 10.0, Visibility::Public))
            .unwrap();
        db.create_listing(&listing(owner, "Grand Hall", 80.0, Visibility::Public))
            .unwrap();

        let query = ListingQuery {
            name: Some("hall".into()),
            min_rate: Some(50.0),
            ..ListingQuery::default()
        };
        let found = db.query_listings(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Grand Hall");

        assert_eq!(db.list_listings_for_owner(owner).unwrap().len(), 2);
    }

    #[test]
    fn locations_are_distinct_and_sorted() {
        let (db, owner) = seeded();
        for (name, location) in [("A", "Remera"), ("B", "Kicukiro"), ("C", "Remera")] {
            let mut l = listing(owner, name, 20.0, Visibility::Public);
            l.location = location.into();
            db.create_listing(&l).unwrap();
        }
        db.create_listing(&listing(owner, "D", 20.0, Visibility::Pending))
            .unwrap();

        assert_eq!(db.list_locations().unwrap(), vec!["Kicukiro", "Remera"]);
    }

    #[test]
    fn update_leaves_visibility_untouched() {
        let (db, owner) = seeded();
        let mut l = listing(owner, "Echo", 25.0, Visibility::Public);
        db.create_listing(&l).unwrap();

        l.name = "Echo II".into();
        l.hourly_rate = 30.0;
        l.visibility = Visibility::Suspended;
        assert!(db.update_listing(&l).unwrap());

        let fetched = db.get_listing(l.id).unwrap();
        assert_eq!(fetched.name, "Echo II");
        assert_eq!(fetched.hourly_rate, 30.0);
        assert_eq!(fetched.visibility, Visibility::Public);
    }

    #[test]
    fn delete_refuses_while_bookings_are_active() {
        let (mut db, owner) = seeded();
        let l = listing(owner, "Echo", 25.0, Visibility::Public);
        db.create_listing(&l).unwrap();
        let b = booking(l.id, None, BookingStatus::Confirmed);
        db.create_booking(&b).unwrap();

        assert!(matches!(
            db.delete_listing(l.id),
            Err(StoreError::Conflict(_))
        ));

        db.update_booking_status(b.id, BookingStatus::Completed)
            .unwrap();
        assert!(db.delete_listing(l.id).unwrap());
        assert!(matches!(db.get_booking(b.id), Err(StoreError::NotFound)));
    }
}
