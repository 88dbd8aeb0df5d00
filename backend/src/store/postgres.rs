//! PostgreSQL-backed ledger store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | AppError | Scenario |
//! |----------------------|----------|----------|
//! | `23503` (foreign key) | `NotFound` / `LocationDeletion::InUse` | Unknown product or location, referenced location |
//! | `23505` (unique) | `Conflict` | Duplicate username |
//! | `23514` (check) | `Validation` | Non-positive quantity or invalid endpoints |
//! | Any other | `DatabaseError` | Connection failures, etc. |
//!
//! ## Guarded appends
//!
//! A movement with a source location is appended inside a transaction that
//! first takes `pg_advisory_xact_lock` keyed by (product, source location),
//! then computes the source balance, then inserts. Concurrent withdrawals from
//! the same location serialize on the lock; the lock is released on commit or
//! rollback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::ledger::{Endpoint, LocationFlow, MovementFilter, ProductFlow};
use shared::models::{
    EntityUpdate, Location, LocationDeletion, Movement, MovementView, NewMovement, NewProduct,
    NewUser, Product, StoredUser, User,
};
use shared::IdKind;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use super::{LedgerStore, StockGuard};
use crate::error::{AppError, AppResult};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    product_id: String,
    seq: i64,
    name: String,
    description: Option<String>,
    min_stock: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            min_stock: row.min_stock,
            seq: row.seq,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    location_id: String,
    seq: i64,
    name: String,
    description: Option<String>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            location_id: row.location_id,
            name: row.name,
            description: row.description,
            seq: row.seq,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    movement_id: i64,
    product_id: String,
    from_location: Option<String>,
    to_location: Option<String>,
    qty: i64,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        Movement {
            movement_id: row.movement_id,
            product_id: row.product_id,
            from_location: row.from_location,
            to_location: row.to_location,
            qty: row.qty,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    movement_id: i64,
    product_id: String,
    product_name: String,
    from_location: Option<String>,
    from_location_name: Option<String>,
    to_location: Option<String>,
    to_location_name: Option<String>,
    qty: i64,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for MovementView {
    fn from(row: HistoryRow) -> Self {
        let kind = shared::MovementKind::classify(
            row.from_location.as_deref(),
            row.to_location.as_deref(),
        );
        MovementView {
            movement_id: row.movement_id,
            product_id: row.product_id,
            product_name: row.product_name,
            from_location: row.from_location,
            from_location_name: row.from_location_name,
            to_location: row.to_location,
            to_location_name: row.to_location_name,
            qty: row.qty,
            kind,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LocationFlowRow {
    product_id: String,
    location_id: String,
    incoming: i64,
    outgoing: i64,
}

#[derive(Debug, FromRow)]
struct ProductFlowRow {
    product_id: String,
    incoming: i64,
    outgoing: i64,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        }
    }
}

fn error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn constraint_name(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// Map an insert failure on `movements` to the error a caller would expect
fn map_movement_error(err: sqlx::Error, movement: &NewMovement) -> AppError {
    match error_code(&err).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => {
            let constraint = constraint_name(&err).unwrap_or_default();
            if constraint.contains("from_location") {
                AppError::NotFound(format!(
                    "Location {}",
                    movement.from_location.as_deref().unwrap_or_default()
                ))
            } else if constraint.contains("to_location") {
                AppError::NotFound(format!(
                    "Location {}",
                    movement.to_location.as_deref().unwrap_or_default()
                ))
            } else {
                AppError::NotFound(format!("Product {}", movement.product_id))
            }
        }
        Some(CHECK_VIOLATION) => AppError::validation("movement", "Movement violates ledger rules"),
        _ => AppError::DatabaseError(err),
    }
}

fn push_endpoint(builder: &mut QueryBuilder<'_, Postgres>, column: &str, endpoint: &Endpoint) {
    match endpoint {
        Endpoint::Any => {}
        Endpoint::Present => {
            builder.push(format!(" AND {} IS NOT NULL", column));
        }
        Endpoint::Absent => {
            builder.push(format!(" AND {} IS NULL", column));
        }
        Endpoint::At(location_id) => {
            builder.push(format!(" AND {} = ", column));
            builder.push_bind(location_id.clone());
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT product_id, seq, name, description, min_stock FROM products ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, product_id: &str) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT product_id, seq, name, description, min_stock FROM products WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self, product), fields(name = %product.name), err)]
    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let mut tx = self.pool.begin().await?;

        let seq: i64 = sqlx::query_scalar("SELECT nextval('product_id_seq')")
            .fetch_one(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (product_id, seq, name, description, min_stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING product_id, seq, name, description, min_stock
            "#,
        )
        .bind(IdKind::Product.format(seq))
        .bind(seq)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.min_stock)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_product(
        &self,
        product_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET name = $2, description = $3
            WHERE product_id = $1
            RETURNING product_id, seq, name, description, min_stock
            "#,
        )
        .bind(product_id)
        .bind(&update.name)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    #[instrument(skip(self), err)]
    async fn delete_product_cascade(&self, product_id: &str) -> AppResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let movements = sqlx::query("DELETE FROM movements WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let products = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if products == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(movements))
    }

    async fn list_locations(&self) -> AppResult<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            "SELECT location_id, seq, name, description FROM locations ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn find_location(&self, location_id: &str) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            "SELECT location_id, seq, name, description FROM locations WHERE location_id = $1",
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Location::from))
    }

    #[instrument(skip(self, location), fields(name = %location.name), err)]
    async fn insert_location(&self, location: EntityUpdate) -> AppResult<Location> {
        let mut tx = self.pool.begin().await?;

        let seq: i64 = sqlx::query_scalar("SELECT nextval('location_id_seq')")
            .fetch_one(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (location_id, seq, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING location_id, seq, name, description
            "#,
        )
        .bind(IdKind::Location.format(seq))
        .bind(seq)
        .bind(&location.name)
        .bind(&location.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_location(
        &self,
        location_id: &str,
        update: EntityUpdate,
    ) -> AppResult<Option<Location>> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            UPDATE locations SET name = $2, description = $3
            WHERE location_id = $1
            RETURNING location_id, seq, name, description
            "#,
        )
        .bind(location_id)
        .bind(&update.name)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Location::from))
    }

    #[instrument(skip(self), err)]
    async fn delete_location(&self, location_id: &str) -> AppResult<LocationDeletion> {
        let result = sqlx::query("DELETE FROM locations WHERE location_id = $1")
            .bind(location_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(LocationDeletion::NotFound),
            Ok(_) => Ok(LocationDeletion::Deleted),
            // movements reference locations with ON DELETE RESTRICT
            Err(err) if error_code(&err).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                Ok(LocationDeletion::InUse)
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(
        skip(self, movement, guard),
        fields(
            product_id = %movement.product_id,
            from = ?movement.from_location,
            to = ?movement.to_location,
            qty = movement.qty
        ),
        err
    )]
    async fn append_movement(
        &self,
        movement: NewMovement,
        guard: Option<StockGuard>,
    ) -> AppResult<Movement> {
        let mut tx = self.pool.begin().await?;

        if let Some(guard) = &guard {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
                .bind(&movement.product_id)
                .bind(&guard.location_id)
                .execute(&mut *tx)
                .await?;

            let available: i64 = sqlx::query_scalar(
                r#"
                SELECT (COALESCE(SUM(qty) FILTER (WHERE to_location = $2), 0)
                      - COALESCE(SUM(qty) FILTER (WHERE from_location = $2), 0))::BIGINT
                FROM movements
                WHERE product_id = $1
                "#,
            )
            .bind(&movement.product_id)
            .bind(&guard.location_id)
            .fetch_one(&mut *tx)
            .await?;

            guard.check(available)?;
        }

        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            INSERT INTO movements (product_id, from_location, to_location, qty)
            VALUES ($1, $2, $3, $4)
            RETURNING movement_id, product_id, from_location, to_location, qty, created_at
            "#,
        )
        .bind(&movement.product_id)
        .bind(&movement.from_location)
        .bind(&movement.to_location)
        .bind(movement.qty)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_movement_error(e, &movement))?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_movement(&self, movement_id: i64) -> AppResult<bool> {
        let done = sqlx::query("DELETE FROM movements WHERE movement_id = $1")
            .bind(movement_id)
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn count_movements(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn movement_history(&self) -> AppResult<Vec<MovementView>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT
                m.movement_id,
                m.product_id,
                p.name AS product_name,
                m.from_location,
                fl.name AS from_location_name,
                m.to_location,
                tl.name AS to_location_name,
                m.qty,
                m.created_at
            FROM movements m
            JOIN products p ON p.product_id = m.product_id
            LEFT JOIN locations fl ON fl.location_id = m.from_location
            LEFT JOIN locations tl ON tl.location_id = m.to_location
            ORDER BY m.created_at DESC, m.movement_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MovementView::from).collect())
    }

    async fn sum_quantity(&self, filter: &MovementFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COALESCE(SUM(qty), 0)::BIGINT FROM movements WHERE product_id = ",
        );
        builder.push_bind(filter.product_id.clone());
        push_endpoint(&mut builder, "from_location", &filter.from);
        push_endpoint(&mut builder, "to_location", &filter.to);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn location_flows(&self, product_id: Option<&str>) -> AppResult<Vec<LocationFlow>> {
        let rows = sqlx::query_as::<_, LocationFlowRow>(
            r#"
            SELECT
                product_id,
                location_id,
                SUM(incoming)::BIGINT AS incoming,
                SUM(outgoing)::BIGINT AS outgoing
            FROM (
                SELECT product_id, to_location AS location_id, qty AS incoming, 0::BIGINT AS outgoing
                FROM movements WHERE to_location IS NOT NULL
                UNION ALL
                SELECT product_id, from_location AS location_id, 0::BIGINT AS incoming, qty AS outgoing
                FROM movements WHERE from_location IS NOT NULL
            ) flows
            WHERE ($1::TEXT IS NULL OR product_id = $1)
            GROUP BY product_id, location_id
            ORDER BY product_id, location_id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LocationFlow {
                product_id: r.product_id,
                location_id: r.location_id,
                incoming: r.incoming,
                outgoing: r.outgoing,
            })
            .collect())
    }

    async fn product_flows(&self) -> AppResult<Vec<ProductFlow>> {
        let rows = sqlx::query_as::<_, ProductFlowRow>(
            r#"
            SELECT
                product_id,
                COALESCE(SUM(qty) FILTER (WHERE to_location IS NOT NULL), 0)::BIGINT AS incoming,
                COALESCE(SUM(qty) FILTER (WHERE from_location IS NOT NULL AND to_location IS NULL), 0)::BIGINT AS outgoing
            FROM movements
            GROUP BY product_id
            ORDER BY product_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProductFlow {
                product_id: r.product_id,
                incoming: r.incoming,
                outgoing: r.outgoing,
            })
            .collect())
    }

    async fn count_users(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<StoredUser>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, email, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredUser::from))
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, email)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, email, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match error_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict {
                resource: "username".to_string(),
                message: format!("User {} already exists", user.username),
            },
            _ => AppError::DatabaseError(e),
        })?;

        Ok(StoredUser::from(row).user)
    }
}
