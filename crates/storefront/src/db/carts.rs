//! `PostgreSQL` cart snapshot repository.
//!
//! Each signed-in user has at most one row in `storefront.user_cart`; the
//! `items` column holds the cart lines as a JSON array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use stride_core::{CartLineItem, CartSnapshot, UserId};

use crate::cart::{RemoteCartError, RemoteCartStore};

/// [`RemoteCartStore`] backed by `storefront.user_cart`.
///
/// Owns a pool handle (cheap to clone) so it can live behind an
/// `Arc<dyn RemoteCartStore>` shared by every cart session.
#[derive(Debug, Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List the most recently updated carts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteCartError::Database` if the query fails.
    pub async fn recent(
        &self,
        limit: u32,
    ) -> Result<Vec<(UserId, DateTime<Utc>)>, RemoteCartError> {
        let rows: Vec<(UserId, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT user_id, updated_at
            FROM storefront.user_cart
            ORDER BY updated_at DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl RemoteCartStore for PgCartRepository {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get(&self, user_id: UserId) -> Result<Option<CartSnapshot>, RemoteCartError> {
        let row: Option<(serde_json::Value, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT items, updated_at
            FROM storefront.user_cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((items, updated_at)) => Ok(Some(decode_snapshot(items, updated_at)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, snapshot), fields(user_id = %user_id, items = snapshot.items.len()))]
    async fn upsert(
        &self,
        user_id: UserId,
        snapshot: &CartSnapshot,
    ) -> Result<(), RemoteCartError> {
        sqlx::query(
            r"
            INSERT INTO storefront.user_cart (user_id, items, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET items = EXCLUDED.items,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(user_id)
        .bind(Json(&snapshot.items))
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn delete(&self, user_id: UserId) -> Result<(), RemoteCartError> {
        let result = sqlx::query("DELETE FROM storefront.user_cart WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RemoteCartError::NotFound);
        }
        Ok(())
    }
}

/// Decode a stored `items` column into a snapshot.
fn decode_snapshot(
    items: serde_json::Value,
    updated_at: DateTime<Utc>,
) -> Result<CartSnapshot, serde_json::Error> {
    let items: Vec<CartLineItem> = serde_json::from_value(items)?;
    Ok(CartSnapshot { items, updated_at })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_snapshot() {
        let items = json!([{
            "productId": "air-runner",
            "name": "Air Runner",
            "priceDisplay": "$120.00",
            "imageUrl": "https://cdn.stride.shop/air-runner.jpg",
            "size": 42,
            "sizeSystem": "EU",
            "quantity": 2
        }]);

        let snapshot = decode_snapshot(items, Utc::now()).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity.get(), 2);
        assert_eq!(snapshot.items[0].product_id.as_str(), "air-runner");
    }

    #[test]
    fn test_decode_snapshot_empty_array() {
        let snapshot = decode_snapshot(json!([]), Utc::now()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_decode_snapshot_rejects_object() {
        assert!(decode_snapshot(json!({"items": []}), Utc::now()).is_err());
    }

    #[test]
    fn test_decode_snapshot_rejects_zero_quantity() {
        let items = json!([{
            "productId": "air-runner",
            "name": "Air Runner",
            "priceDisplay": "$120.00",
            "imageUrl": "",
            "size": "M",
            "sizeSystem": "US",
            "quantity": 0
        }]);
        assert!(decode_snapshot(items, Utc::now()).is_err());
    }
}
