//! PostgreSQL repository.

use crate::error::StoreError;
use crate::model::{Item, NewItem, NewOrder, NewUser, Order, User};
use crate::repository::Repository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use savannah_core::{ItemId, OrderId, UserId};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::fmt;

/// Maps a driver error onto the store's error kinds.
fn map_db_error(
    entity: &'static str,
    key: impl fmt::Display,
) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| match err {
        sqlx::Error::RowNotFound => StoreError::not_found(entity, key),
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
            entity,
            details: db.message().to_string(),
        },
        other => StoreError::Io {
            details: other.to_string(),
        },
    }
}

fn io_error(err: sqlx::Error) -> StoreError {
    match err {
        // `orders.qty` carries the only CHECK constraint in the schema.
        sqlx::Error::Database(db) if db.is_check_violation() => StoreError::Invalid {
            entity: "order",
            details: "quantity must be positive".to_string(),
        },
        other => StoreError::Io {
            details: other.to_string(),
        },
    }
}

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: i64,
    code: String,
    email: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            code: row.code,
            email: row.email,
        }
    }
}

/// Row type for item queries.
#[derive(FromRow)]
struct ItemRow {
    id: i64,
    price: Decimal,
    name: String,
    description: String,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.id),
            price: row.price,
            name: row.name,
            description: row.description,
        }
    }
}

/// Row type for order queries.
#[derive(FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    item_id: i64,
    qty: i32,
    placed_at: DateTime<Utc>,
    contact: String,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            item_id: ItemId::new(row.item_id),
            quantity: row.qty,
            placed_at: row.placed_at,
            contact: row.contact,
        }
    }
}

/// Repository backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the database cannot be reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(io_error)?;

        Ok(Self { pool })
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Io {
                details: e.to_string(),
            })
    }

    async fn delete_by_id(
        &self,
        sql: &'static str,
        entity: &'static str,
        id: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(io_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(entity, id));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (code, email)
            VALUES ($1, $2)
            RETURNING id, code, email
            "#,
        )
        .bind(&user.code)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("user", &user.email))?;

        Ok(row.into())
    }

    async fn find_or_create_user(&self, user: NewUser) -> Result<(User, bool), StoreError> {
        let inserted: Option<UserRow> = sqlx::query_as(
            r#"
            INSERT INTO users (code, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, code, email
            "#,
        )
        .bind(&user.code)
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(io_error)?;

        if let Some(row) = inserted {
            tracing::debug!(user_id = row.id, "provisioned user");
            return Ok((row.into(), true));
        }

        let existing = self.find_user_by_email(&user.email).await?;
        Ok((existing, false))
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r#"
            SELECT id, code, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("user", id))?;

        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            r#"
            SELECT id, code, email
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("user", email))?;

        Ok(row.into())
    }

    async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET code = $2, email = $3
            WHERE id = $1
            "#,
        )
        .bind(user.id.get())
        .bind(&user.code)
        .bind(&user.email)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("user", user.id))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user.id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM users WHERE id = $1", "user", id.get())
            .await
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        let row: ItemRow = sqlx::query_as(
            r#"
            INSERT INTO items (price, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, price, name, description
            "#,
        )
        .bind(item.price)
        .bind(&item.name)
        .bind(&item.description)
        .fetch_one(&self.pool)
        .await
        .map_err(io_error)?;

        Ok(row.into())
    }

    async fn find_item(&self, id: ItemId) -> Result<Item, StoreError> {
        let row: ItemRow = sqlx::query_as(
            r#"
            SELECT id, price, name, description
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("item", id))?;

        Ok(row.into())
    }

    async fn update_item(&self, item: Item) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET price = $2, name = $3, description = $4
            WHERE id = $1
            "#,
        )
        .bind(item.id.get())
        .bind(item.price)
        .bind(&item.name)
        .bind(&item.description)
        .execute(&self.pool)
        .await
        .map_err(io_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("item", item.id));
        }
        Ok(())
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM items WHERE id = $1", "item", id.get())
            .await
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        StoreError::check_quantity(order.quantity)?;
        let row: OrderRow = sqlx::query_as(
            r#"
            INSERT INTO orders (user_id, item_id, qty, placed_at, contact)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, item_id, qty, placed_at, contact
            "#,
        )
        .bind(order.user_id.get())
        .bind(order.item_id.get())
        .bind(order.quantity)
        .bind(order.placed_at)
        .bind(&order.contact)
        .fetch_one(&self.pool)
        .await
        .map_err(io_error)?;

        Ok(row.into())
    }

    async fn find_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let row: OrderRow = sqlx::query_as(
            r#"
            SELECT id, user_id, item_id, qty, placed_at, contact
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("order", id))?;

        Ok(row.into())
    }

    async fn update_order(&self, order: Order) -> Result<(), StoreError> {
        StoreError::check_quantity(order.quantity)?;
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET item_id = $2, qty = $3, contact = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.get())
        .bind(order.item_id.get())
        .bind(order.quantity)
        .bind(&order.contact)
        .execute(&self.pool)
        .await
        .map_err(io_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", order.id));
        }
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.delete_by_id("DELETE FROM orders WHERE id = $1", "order", id.get())
            .await
    }
}
