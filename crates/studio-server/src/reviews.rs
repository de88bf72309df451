use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use studio_shared::constants::{MAX_RATING, MIN_RATING};
use studio_shared::error::DomainResult;
use studio_shared::models::Review;
use studio_shared::repository::Repositories;
use studio_shared::{Actor, DomainError, ListingId, RepositoryError, ReviewId};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub listing_id: ListingId,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct ReviewService {
    repo: Arc<dyn Repositories>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn Repositories>) -> Self {
        Self { repo }
    }

    /// Store the review and refresh the listing's average in one storage
    /// operation.
    pub fn add(&self, actor: &Actor, input: NewReview) -> DomainResult<Review> {
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(DomainError::validation(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let review = Review {
            id: ReviewId::new(),
            listing_id: input.listing_id,
            author_id: actor.id,
            rating: input.rating,
            comment: input
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        };

        let average = match self.repo.add_review(&review) {
            Ok(average) => average,
            Err(RepositoryError::NotFound) => {
                return Err(DomainError::ListingNotFound(input.listing_id))
            }
            Err(e) => return Err(e.into()),
        };
        info!(listing_id = %review.listing_id, rating = review.rating, average, "Review added");
        Ok(review)
    }

    pub fn list(&self, listing_id: Option<ListingId>) -> DomainResult<Vec<Review>> {
        Ok(self.repo.list_reviews(listing_id)?)
    }
}
