//! Generic index/show/create/update/delete over any [`Resource`].
//!
//! Write payloads are column maps bound as a single JSONB parameter and
//! expanded with `jsonb_populate_record`, so PostgreSQL does the per-column
//! type conversion and one statement shape serves every table.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres};
use ifdo_core::error::CoreError;
use ifdo_core::query::{render_predicate, validate_order_by, IndexQuery};
use ifdo_core::types::{DbId, ResourceKey};

use crate::error::DbError;
use crate::resource::{filter_payload, payload_from, Resource, WriteMode};

/// Quoted, comma-separated column list, each optionally prefixed with `alias.`.
pub(crate) fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>, alias: Option<&str>) -> String {
    columns
        .into_iter()
        .map(|column| match alias {
            Some(alias) => format!("{alias}.\"{column}\""),
            None => format!("\"{column}\""),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `WHERE` body addressing one row by id or UUID through placeholder `$n`.
pub(crate) fn key_clause(key: &ResourceKey, alias: Option<&str>, placeholder: usize) -> String {
    let column = match key {
        ResourceKey::Id(_) => "id",
        ResourceKey::Uuid(_) => "uuid",
    };
    match alias {
        Some(alias) => format!("{alias}.{column} = ${placeholder}"),
        None => format!("{column} = ${placeholder}"),
    }
}

pub(crate) fn bind_key<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    key: ResourceKey,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match key {
        ResourceKey::Id(id) => query.bind(id),
        ResourceKey::Uuid(uuid) => query.bind(uuid),
    }
}

/// Column named by a `uq_<table>_<column>` constraint.
fn unique_column<'c>(table: &str, constraint: &'c str) -> Option<&'c str> {
    constraint
        .strip_prefix("uq_")?
        .strip_prefix(table)?
        .strip_prefix('_')
}

/// Unique violations on insert or update become a `Conflict` naming the column.
fn conflict_or_sqlx<R: Resource>(err: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let column = db_err
                .constraint()
                .and_then(|constraint| unique_column(R::TABLE, constraint))
                .unwrap_or("value");
            return DbError::Core(CoreError::Conflict(format!(
                "{} with this {column} already exists",
                R::ENTITY
            )));
        }
    }
    DbError::Sqlx(err)
}

/// Generic repository. Every method is parameterized by the resource type.
pub struct CrudRepo;

impl CrudRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a row by id or UUID.
    pub async fn find<'e, R, E>(executor: E, key: ResourceKey) -> Result<Option<R>, sqlx::Error>
    where
        R: Resource,
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM {} WHERE {}",
            column_list(R::COLUMNS.iter().copied(), None),
            R::TABLE,
            key_clause(&key, None, 1)
        );
        bind_key(sqlx::query_as::<_, R>(&query), key)
            .fetch_optional(executor)
            .await
    }

    /// Like [`CrudRepo::find`] but a missing row is a `NotFound` error.
    pub async fn show<R: Resource>(pool: &PgPool, key: ResourceKey) -> Result<R, DbError> {
        Self::find::<R, _>(pool, key)
            .await?
            .ok_or_else(|| DbError::not_found(R::ENTITY, key))
    }

    /// List rows matching `query`, checking its columns before any SQL runs.
    pub async fn index<R: Resource>(pool: &PgPool, query: &IndexQuery) -> Result<Vec<R>, DbError> {
        validate_order_by(&query.order_by, R::COLUMNS)?;
        if let Some(filter) = query
            .filters
            .iter()
            .find(|filter| !R::COLUMNS.contains(&filter.column.as_str()))
        {
            return Err(DbError::validation(format!(
                "Invalid filter column: {}",
                filter.column
            )));
        }

        let predicate = render_predicate(&query.filters, 1);
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}, id",
            column_list(R::COLUMNS.iter().copied(), None),
            R::TABLE,
            predicate.sql,
            query.order_clause()
        );
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut statement = sqlx::query_as::<_, R>(&sql);
        for value in predicate.binds {
            statement = statement.bind(value);
        }
        Ok(statement.fetch_all(pool).await?)
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a row from a DTO in its own transaction.
    pub async fn create<R: Resource, T: Serialize>(pool: &PgPool, input: &T) -> Result<R, DbError> {
        let mut tx = pool.begin().await?;
        let row = Self::create_in::<R, T>(&mut tx, input).await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn create_in<R: Resource, T: Serialize>(
        conn: &mut PgConnection,
        input: &T,
    ) -> Result<R, DbError> {
        let payload = payload_from::<R, T>(input, WriteMode::Create)?;
        Self::create_map_in(conn, payload).await
    }

    /// Create a row from a column map. Nulls, empty lists and unknown keys are dropped.
    pub async fn create_map_in<R: Resource>(
        conn: &mut PgConnection,
        data: Map<String, Value>,
    ) -> Result<R, DbError> {
        let mut payload = filter_payload::<R>(data, WriteMode::Create);
        R::validate(&mut payload, None)?;
        let row = Self::insert_payload::<R>(&mut *conn, &payload)
            .await
            .map_err(conflict_or_sqlx::<R>)?;
        let row = Self::apply_derived(conn, row).await?;
        tracing::debug!(table = R::TABLE, id = row.id(), "Row created");
        Ok(row)
    }

    async fn insert_payload<R: Resource>(
        conn: &mut PgConnection,
        payload: &Map<String, Value>,
    ) -> Result<R, sqlx::Error> {
        let returning = column_list(R::COLUMNS.iter().copied(), None);
        if payload.is_empty() {
            let query = format!("INSERT INTO {} DEFAULT VALUES RETURNING {returning}", R::TABLE);
            return sqlx::query_as::<_, R>(&query).fetch_one(conn).await;
        }

        let columns = column_list(payload.keys().map(String::as_str), None);
        let query = format!(
            "INSERT INTO {table} ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING {returning}",
            table = R::TABLE,
        );
        sqlx::query_as::<_, R>(&query)
            .bind(Json(payload))
            .fetch_one(conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Get-or-create
    // -----------------------------------------------------------------------

    /// Return the row whose `unique` column matches `data`, inserting it first
    /// when absent. Without a unique column a new row is always created.
    ///
    /// The insert uses `ON CONFLICT DO NOTHING`, so a concurrent transaction
    /// inserting the same value makes this call return that row instead of
    /// failing on the constraint.
    pub async fn get_or_create_in<R: Resource>(
        conn: &mut PgConnection,
        unique: Option<&str>,
        data: Map<String, Value>,
    ) -> Result<R, DbError> {
        let Some(unique) = unique else {
            return Self::create_map_in(conn, data).await;
        };

        let mut payload = filter_payload::<R>(data, WriteMode::Create);
        R::validate(&mut payload, None)?;
        if !payload.contains_key(unique) {
            return Err(DbError::validation(format!(
                "{} requires a value for '{unique}'",
                R::ENTITY
            )));
        }

        let returning = column_list(R::COLUMNS.iter().copied(), None);
        let columns = column_list(payload.keys().map(String::as_str), None);
        let insert = format!(
            "INSERT INTO {table} ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             ON CONFLICT (\"{unique}\") DO NOTHING \
             RETURNING {returning}",
            table = R::TABLE,
        );
        let inserted = sqlx::query_as::<_, R>(&insert)
            .bind(Json(&payload))
            .fetch_optional(&mut *conn)
            .await?;
        if let Some(row) = inserted {
            tracing::debug!(table = R::TABLE, id = row.id(), "Lookup row created");
            return Ok(Self::apply_derived(conn, row).await?);
        }

        let select = format!(
            "SELECT {returning} FROM {table} \
             WHERE \"{unique}\" = (SELECT \"{unique}\" FROM jsonb_populate_record(NULL::{table}, $1))",
            table = R::TABLE,
        );
        Ok(sqlx::query_as::<_, R>(&select)
            .bind(Json(&payload))
            .fetch_one(conn)
            .await?)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Apply the fields present in `input` in its own transaction.
    pub async fn update<R: Resource, T: Serialize>(
        pool: &PgPool,
        key: ResourceKey,
        input: &T,
    ) -> Result<R, DbError> {
        let mut tx = pool.begin().await?;
        let row = Self::update_in::<R, T>(&mut tx, key, input).await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn update_in<R: Resource, T: Serialize>(
        conn: &mut PgConnection,
        key: ResourceKey,
        input: &T,
    ) -> Result<R, DbError> {
        let payload = payload_from::<R, T>(input, WriteMode::Update)?;
        Self::update_map_in(conn, key, payload).await
    }

    /// Update from a column map. Absent and null keys leave columns untouched;
    /// derived columns are recomputed from the result.
    pub async fn update_map_in<R: Resource>(
        conn: &mut PgConnection,
        key: ResourceKey,
        data: Map<String, Value>,
    ) -> Result<R, DbError> {
        let existing = Self::find::<R, _>(&mut *conn, key)
            .await?
            .ok_or_else(|| DbError::not_found(R::ENTITY, key))?;

        let mut payload = filter_payload::<R>(data, WriteMode::Update);
        if payload.is_empty() {
            return Ok(existing);
        }
        R::validate(&mut payload, Some(&existing))?;

        let row = Self::write_payload::<R>(&mut *conn, existing.id(), &payload)
            .await
            .map_err(conflict_or_sqlx::<R>)?;
        let row = Self::apply_derived(conn, row).await?;
        tracing::debug!(table = R::TABLE, id = row.id(), "Row updated");
        Ok(row)
    }

    async fn write_payload<R: Resource>(
        conn: &mut PgConnection,
        id: DbId,
        payload: &Map<String, Value>,
    ) -> Result<R, sqlx::Error> {
        let assignments = payload
            .keys()
            .map(|column| format!("\"{column}\" = src.\"{column}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE {table} AS target SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $2) AS src \
             WHERE target.id = $1 \
             RETURNING {returning}",
            table = R::TABLE,
            returning = column_list(R::COLUMNS.iter().copied(), Some("target")),
        );
        sqlx::query_as::<_, R>(&query)
            .bind(id)
            .bind(Json(payload))
            .fetch_one(conn)
            .await
    }

    /// Store the row's derived columns (geometry) when they are out of date.
    async fn apply_derived<R: Resource>(conn: &mut PgConnection, row: R) -> Result<R, sqlx::Error> {
        let derived = row.derived();
        if derived.is_empty() {
            return Ok(row);
        }
        Self::write_payload::<R>(conn, row.id(), &derived).await
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete a row and return it as it was.
    pub async fn delete<R: Resource>(pool: &PgPool, key: ResourceKey) -> Result<R, DbError> {
        let query = format!(
            "DELETE FROM {} WHERE {} RETURNING {}",
            R::TABLE,
            key_clause(&key, None, 1),
            column_list(R::COLUMNS.iter().copied(), None)
        );
        let deleted = bind_key(sqlx::query_as::<_, R>(&query), key)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::not_found(R::ENTITY, key))?;
        tracing::info!(table = R::TABLE, id = deleted.id(), "Row deleted");
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Helpers for other repositories
    // -----------------------------------------------------------------------

    /// Resolve a key to the primary key of a row in `table`.
    pub async fn find_id<'e, E: PgExecutor<'e>>(
        executor: E,
        table: &str,
        entity: &'static str,
        key: ResourceKey,
    ) -> Result<DbId, DbError> {
        let query = format!("SELECT id FROM {table} WHERE {}", key_clause(&key, None, 1));
        let row: Option<IdRow> = bind_key(sqlx::query_as::<_, IdRow>(&query), key)
            .fetch_optional(executor)
            .await?;
        row.map(|r| r.id).ok_or_else(|| DbError::not_found(entity, key))
    }
}

#[derive(Debug, FromRow)]
struct IdRow {
    id: DbId,
}
