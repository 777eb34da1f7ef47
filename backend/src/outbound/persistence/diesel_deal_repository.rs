//! PostgreSQL-backed `DealRepository` implementation using Diesel ORM.
//!
//! Creation relies on the `(book_id, buyer_id)` unique constraint: the insert
//! uses `ON CONFLICT DO NOTHING` and a losing writer re-reads the winner.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{DealInsertOutcome, DealRepository, DealRepositoryError};
use crate::domain::{
    BookId, Deal, DealId, DealRecord, DealStatus, HandoffMethod, Rating, Stars, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{DealRow, DealUpdate, NewDealRow};
use super::pool::{DbPool, PoolError};
use super::schema::deals;

/// Diesel-backed implementation of the `DealRepository` port.
#[derive(Clone)]
pub struct DieselDealRepository {
    pool: DbPool,
}

impl DieselDealRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> DealRepositoryError {
    map_pool_error(error, DealRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> DealRepositoryError {
    map_diesel_error(
        error,
        DealRepositoryError::query,
        DealRepositoryError::connection,
    )
}

fn row_to_deal(row: DealRow) -> Result<Deal, DealRepositoryError> {
    let status = row
        .status
        .parse::<DealStatus>()
        .map_err(|err| DealRepositoryError::query(err.to_string()))?;
    let method = row
        .method
        .parse::<HandoffMethod>()
        .map_err(|err| DealRepositoryError::query(err.to_string()))?;

    let rating = match (row.rating_stars, row.rated_by) {
        (Some(stars), Some(by)) => Some(Rating {
            stars: Stars::try_from(i64::from(stars))
                .map_err(|err| DealRepositoryError::query(err.to_string()))?,
            comment: row.rating_comment,
            by: UserId::from_uuid(by),
        }),
        (Some(_), None) => {
            warn!(deal_id = %row.id, "dropping rating without a rater");
            None
        }
        (None, _) => None,
    };

    Ok(Deal::restore(DealRecord {
        id: DealId::from_uuid(row.id),
        book_id: BookId::from_uuid(row.book_id),
        buyer_id: UserId::from_uuid(row.buyer_id),
        seller_id: UserId::from_uuid(row.seller_id),
        status,
        method,
        scheduled_time: row.scheduled_time,
        rating,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn rows_to_deals(rows: Vec<DealRow>) -> Result<Vec<Deal>, DealRepositoryError> {
    rows.into_iter().map(row_to_deal).collect()
}

#[async_trait]
impl DealRepository for DieselDealRepository {
    async fn find_by_id(&self, id: &DealId) -> Result<Option<Deal>, DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        deals::table
            .find(id.as_uuid())
            .select(DealRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_deal)
            .transpose()
    }

    async fn find_by_book_and_buyer(
        &self,
        book_id: &BookId,
        buyer_id: &UserId,
    ) -> Result<Option<Deal>, DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        deals::table
            .filter(deals::book_id.eq(book_id.as_uuid()))
            .filter(deals::buyer_id.eq(buyer_id.as_uuid()))
            .select(DealRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(row_to_deal)
            .transpose()
    }

    async fn insert_if_absent(
        &self,
        deal: &Deal,
    ) -> Result<DealInsertOutcome, DealRepositoryError> {
        let row = NewDealRow {
            id: *deal.id().as_uuid(),
            book_id: *deal.book_id().as_uuid(),
            buyer_id: *deal.buyer_id().as_uuid(),
            seller_id: *deal.seller_id().as_uuid(),
            status: deal.status().as_str(),
            method: deal.method().as_str(),
            scheduled_time: deal.scheduled_time(),
            created_at: deal.created_at(),
            updated_at: deal.updated_at(),
        };

        let inserted = {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            diesel::insert_into(deals::table)
                .values(&row)
                .on_conflict((deals::book_id, deals::buyer_id))
                .do_nothing()
                .execute(&mut conn)
                .await
                .map_err(diesel_error)?
        };

        if inserted == 1 {
            return Ok(DealInsertOutcome::Created(deal.clone()));
        }

        self.find_by_book_and_buyer(&deal.book_id(), &deal.buyer_id())
            .await?
            .map(DealInsertOutcome::Existing)
            .ok_or_else(|| DealRepositoryError::query("conflicting deal disappeared"))
    }

    async fn save(&self, deal: &Deal) -> Result<(), DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rating = deal.rating();
        let update = DealUpdate {
            status: deal.status().as_str(),
            rating_stars: rating.map(|rating| i16::from(rating.stars.get())),
            rating_comment: rating.and_then(|rating| rating.comment.as_deref()),
            rated_by: rating.map(|rating| *rating.by.as_uuid()),
            updated_at: deal.updated_at(),
        };

        let updated = diesel::update(deals::table.find(deal.id().as_uuid()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(DealRepositoryError::query("deal not found for update"));
        }
        Ok(())
    }

    async fn list_for_seller(
        &self,
        seller_id: &UserId,
    ) -> Result<Vec<Deal>, DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = deals::table
            .filter(deals::seller_id.eq(seller_id.as_uuid()))
            .order(deals::created_at.desc())
            .select(DealRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_deals(rows)
    }

    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = deals::table
            .filter(deals::buyer_id.eq(buyer_id.as_uuid()))
            .order(deals::created_at.desc())
            .select(DealRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_deals(rows)
    }

    async fn count_for_seller(
        &self,
        seller_id: &UserId,
        status: DealStatus,
    ) -> Result<u64, DealRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = deals::table
            .filter(deals::seller_id.eq(seller_id.as_uuid()))
            .filter(deals::status.eq(status.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn row() -> DealRow {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        DealRow {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            status: "In Transit".to_owned(),
            method: "pickup".to_owned(),
            scheduled_time: None,
            rating_stars: None,
            rating_comment: None,
            rated_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[rstest]
    fn restores_status_with_spaces(row: DealRow) {
        let deal = row_to_deal(row).expect("valid row");
        assert_eq!(deal.status(), DealStatus::InTransit);
        assert!(deal.rating().is_none());
    }

    #[rstest]
    fn restores_rating_with_rater(mut row: DealRow) {
        let rater = Uuid::new_v4();
        row.status = "Completed".to_owned();
        row.rating_stars = Some(4);
        row.rating_comment = Some("smooth hand-off".to_owned());
        row.rated_by = Some(rater);

        let deal = row_to_deal(row).expect("valid row");
        let rating = deal.rating().expect("rating");
        assert_eq!(rating.stars.get(), 4);
        assert_eq!(rating.by, UserId::from_uuid(rater));
    }

    #[rstest]
    fn rejects_unknown_status(mut row: DealRow) {
        row.status = "Lost".to_owned();
        let error = row_to_deal(row).expect_err("unknown status");
        assert!(matches!(error, DealRepositoryError::Query { .. }));
    }

    #[rstest]
    fn rejects_out_of_range_stars(mut row: DealRow) {
        row.rating_stars = Some(9);
        row.rated_by = Some(Uuid::new_v4());
        assert!(row_to_deal(row).is_err());
    }
}
