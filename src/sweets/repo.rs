use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::Purchase;
use crate::error::ApiError;

/// Catalog item. `quantity` only ever changes through [`Sweet::purchase`]
/// and [`Sweet::restock`]; the DB CHECK keeps it non-negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sweet {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated input for a new catalog row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSweet {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i32,
    pub image: Option<String>,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweetChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub image: Option<String>,
}

/// Validated search filter; `None` means the dimension is unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Sweet {
    pub async fn insert(db: &PgPool, new: NewSweet) -> sqlx::Result<Sweet> {
        sqlx::query_as::<_, Sweet>(
            r#"
            INSERT INTO sweets (name, category, price, quantity, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, category, price, quantity, image, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.category)
        .bind(new.price)
        .bind(new.quantity)
        .bind(new.image)
        .fetch_one(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<Sweet>> {
        sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image, created_at
            FROM sweets
            ORDER BY name ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Case-insensitive substring match on name/category plus an inclusive
    /// price range. Absent filters are NULL binds and match everything.
    pub async fn search(db: &PgPool, filter: &SearchFilter) -> sqlx::Result<Vec<Sweet>> {
        sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image, created_at
            FROM sweets
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR category ILIKE '%' || $2 || '%')
              AND ($3::double precision IS NULL OR price >= $3)
              AND ($4::double precision IS NULL OR price <= $4)
            ORDER BY name ASC
            "#,
        )
        .bind(filter.name.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Sweet>> {
        sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image, created_at
            FROM sweets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn update(db: &PgPool, id: Uuid, changes: &SweetChanges) -> sqlx::Result<Option<Sweet>> {
        sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                price = COALESCE($4, price),
                quantity = COALESCE($5, quantity),
                image = COALESCE($6, image)
            WHERE id = $1
            RETURNING id, name, category, price, quantity, image, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.price)
        .bind(changes.quantity)
        .bind(changes.image.as_deref())
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM sweets WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically take `quantity` units of stock and append the purchase to
    /// the user's history. The decrement is conditional on sufficient stock,
    /// so concurrent purchases can never drive the quantity negative, and
    /// both writes share one transaction.
    pub async fn purchase(
        db: &PgPool,
        user_id: Uuid,
        sweet_id: Uuid,
        quantity: i32,
    ) -> Result<(Sweet, f64), ApiError> {
        let mut tx = db.begin().await?;

        let updated = sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
            SET quantity = quantity - $2
            WHERE id = $1 AND quantity >= $2
            RETURNING id, name, category, price, quantity, image, created_at
            "#,
        )
        .bind(sweet_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(sweet) = updated else {
            // No row matched: either the sweet is gone or the stock ran short.
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM sweets WHERE id = $1)")
                    .bind(sweet_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                ApiError::InsufficientStock
            } else {
                ApiError::NotFound("Sweet not found".into())
            });
        };

        let total = sweet.price * f64::from(quantity);
        Purchase::record(
            &mut tx,
            user_id,
            &sweet.name,
            sweet.price,
            quantity,
            total,
            sweet.image.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok((sweet, total))
    }

    /// Admin stock top-up.
    pub async fn restock(db: &PgPool, id: Uuid, quantity: i32) -> sqlx::Result<Option<Sweet>> {
        sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
            SET quantity = quantity + $2
            WHERE id = $1
            RETURNING id, name, category, price, quantity, image, created_at
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweet_json_uses_wire_names() {
        let sweet = Sweet {
            id: Uuid::new_v4(),
            name: "Ladoo".into(),
            category: Some("Indian".into()),
            price: 10.0,
            quantity: 5,
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&sweet).unwrap();
        assert_eq!(json["name"], "Ladoo");
        assert_eq!(json["category"], "Indian");
        assert_eq!(json["price"], 10.0);
        assert_eq!(json["quantity"], 5);
        assert!(json["createdAt"].is_string());
    }
}
