//! Restaurant CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Restaurant;

/// Create a new restaurant.
pub async fn create_restaurant(pool: &SqlitePool, restaurant: &Restaurant) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO restaurants (id, name, whatsapp_number, default_language, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&restaurant.id)
    .bind(&restaurant.name)
    .bind(&restaurant.whatsapp_number)
    .bind(&restaurant.default_language)
    .bind(restaurant.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Restaurant",
                    id: restaurant.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a restaurant by ID.
pub async fn get_restaurant(pool: &SqlitePool, id: &str) -> Result<Restaurant> {
    sqlx::query_as::<_, Restaurant>(
        r#"
        SELECT id, name, whatsapp_number, default_language, created_at
        FROM restaurants
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Restaurant",
        id: id.to_string(),
    })
}

/// List all restaurants.
pub async fn list_restaurants(pool: &SqlitePool) -> Result<Vec<Restaurant>> {
    let restaurants = sqlx::query_as::<_, Restaurant>(
        r#"
        SELECT id, name, whatsapp_number, default_language, created_at
        FROM restaurants
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(restaurants)
}
