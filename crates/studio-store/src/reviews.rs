//! Reviews and the denormalized listing rating.

use rusqlite::{params, TransactionBehavior};
use studio_shared::models::Review;
use studio_shared::{AccountId, ListingId, ReviewId};

use crate::database::{format_ts, parse_ts, parse_uuid, Database};
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a review and refresh the listing's average rating in one
    /// IMMEDIATE transaction, so concurrent reviewers cannot lose each
    /// other's update. Returns the new average.
    pub fn add_review(&mut self, review: &Review) -> Result<f64> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM listings WHERE id = ?1)",
            params![review.listing_id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        tx.execute(
            "INSERT INTO reviews (id, listing_id, author_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.id.to_string(),
                review.listing_id.to_string(),
                review.author_id.to_string(),
                review.rating,
                review.comment,
                format_ts(&review.created_at),
            ],
        )?;

        tx.execute(
            "UPDATE listings
             SET rating = (SELECT COALESCE(AVG(rating), 0) FROM reviews WHERE listing_id = ?1)
             WHERE id = ?1",
            params![review.listing_id.to_string()],
        )?;

        let average: f64 = tx.query_row(
            "SELECT rating FROM listings WHERE id = ?1",
            params![review.listing_id.to_string()],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(average)
    }

    /// Reviews, newest first, optionally for one listing.
    pub fn list_reviews(&self, listing: Option<ListingId>) -> Result<Vec<Review>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, listing_id, author_id, rating, comment, created_at
             FROM reviews
             WHERE ?1 IS NULL OR listing_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map(params![listing.map(|l| l.to_string())], |row| {
            let id_str: String = row.get(0)?;
            let listing_str: String = row.get(1)?;
            let author_str: String = row.get(2)?;
            let ts_str: String = row.get(5)?;

            Ok(Review {
                id: ReviewId(parse_uuid(0, &id_str)?),
                listing_id: ListingId(parse_uuid(1, &listing_str)?),
                author_id: AccountId(parse_uuid(2, &author_str)?),
                rating: row.get(3)?,
                comment: row.get(4)?,
                created_at: parse_ts(5, &ts_str)?,
            })
        })?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{account, listing, review};
    use studio_shared::{Role, Visibility};

    #[test]
    fn rating_tracks_running_average() {
        let mut db = Database::open_in_memory().unwrap();
        let owner = account("owner@example.com", Role::ListingOwner);
        let critic = account("critic@example.com", Role::Client);
        db.create_account(&owner).unwrap();
        db.create_account(&critic).unwrap();
        let l = listing(owner.id, "Echo", 25.0, Visibility::Public);
        db.create_listing(&l).unwrap();

        assert_eq!(db.add_review(&review(l.id, critic.id, 5)).unwrap(), 5.0);
        assert_eq!(db.add_review(&review(l.id, critic.id, 2)).unwrap(), 3.5);
        assert_eq!(db.get_listing(l.id).unwrap().rating, 3.5);
        assert_eq!(db.list_reviews(Some(l.id)).unwrap().len(), 2);
        assert_eq!(db.list_reviews(None).unwrap().len(), 2);
    }

    #[test]
    fn review_for_missing_listing_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let critic = account("critic@example.com", Role::Client);
        db.create_account(&critic).unwrap();

        assert!(matches!(
            db.add_review(&review(ListingId::new(), critic.id, 4)),
            Err(StoreError::NotFound)
        ));
        assert!(db.list_reviews(None).unwrap().is_empty());
    }
}
