// Bookstore
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Implementation of the database abstraction using PostgreSQL.

use crate::db::{BareTx, BooksTx, Db, DbError, DbResult};
use crate::env::{get_optional_var, get_required_var};
use crate::model::*;
use derivative::Derivative;
use futures::TryStreamExt;
use sqlx::postgres::{
    PgConnectOptions, PgDatabaseError, PgPool, PgPoolOptions, PgRow, PgSslMode, Postgres,
};
use sqlx::{Row, Transaction};
use std::marker::PhantomData;
use std::time::Duration;

/// Schema to use to initialize the production database.
const SCHEMA: &str = include_str!("postgres.sql");

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.downcast_ref::<PgDatabaseError>().code() {
            "23505" /* unique_violation */ => DbError::AlreadyExists,
            "53300" /* too_many_connections */ => DbError::Unavailable,
            number => DbError::BackendError(format!("pgsql error {}: {}", number, e)),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Options to establish a connection to a PostgreSQL database.
#[derive(Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Host to connect to.
    pub host: String,

    /// Port to connect to (typically 5432).
    pub port: u16,

    /// Database name to connect to.
    pub database: String,

    /// Username to establish the connection with.
    pub username: String,

    /// Password to establish the connection with.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Whether and how to negotiate a secure connection.  Uses the driver default if not set.
    #[cfg_attr(test, derivative(PartialEq = "ignore"))]
    pub ssl_mode: Option<PgSslMode>,
}

impl PostgresOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_HOST`, `<prefix>_PORT`, `<prefix>_NAME`,
    /// `<prefix>_USER`, `<prefix>_PASSWORD` and `<prefix>_SSLMODE`.  Only the last one is
    /// optional, and an empty value is the same as not setting it.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        let ssl_mode = match get_optional_var::<String>(prefix, "SSLMODE")? {
            Some(mode) if !mode.is_empty() => match mode.parse::<PgSslMode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    return Err(format!(
                        "Invalid value in environment variable {}_SSLMODE: {}",
                        prefix, e
                    ))
                }
            },
            _ => None,
        };

        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "NAME")?,
            username: get_required_var::<String>(prefix, "USER")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            ssl_mode,
        })
    }

    /// Converts these options into the type that `sqlx` understands.
    fn into_connect_options(self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password);
        match self.ssl_mode {
            Some(mode) => options.ssl_mode(mode),
            None => options,
        }
    }
}

/// A database instance backed by a PostgreSQL connection pool.
///
/// The pool is cloneable and all clones share the same connections, so a single instance can be
/// handed to every concurrent request.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub(crate) struct PostgresDb<T> {
    /// Shared PostgreSQL connection pool.
    pool: PgPool,

    /// Marker for the transaction type `T` handed out by `begin`.
    _phantom_tx: PhantomData<fn() -> T>,
}

impl<T> PostgresDb<T>
where
    T: BareTx + From<Transaction<'static, Postgres>> + Send + 'static,
{
    /// Creates a pool with `pool_options` without establishing any connection yet.
    fn connect_lazy_with(opts: PostgresOptions, pool_options: PgPoolOptions) -> Self {
        let pool = pool_options.connect_lazy_with(opts.into_connect_options());
        Self { pool, _phantom_tx: PhantomData }
    }

    /// Connects to the database described by `opts` and runs the schema migration.
    ///
    /// The migration is the first operation against the pool, so this is also what establishes
    /// the connection and fails if the database is unreachable.
    pub(crate) async fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let db = Self::connect_lazy_with(
            opts,
            PgPoolOptions::new().acquire_timeout(Duration::from_secs(2)),
        );

        let mut tx: T = db.begin().await?;
        tx.migrate().await?;
        tx.commit().await?;

        Ok(db)
    }
}

#[async_trait::async_trait]
impl<T> Db for PostgresDb<T>
where
    T: BareTx + From<Transaction<'static, Postgres>> + Send + 'static,
{
    type Tx = T;

    async fn begin(&self) -> DbResult<Self::Tx> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(T::from(tx))
    }
}

/// Helper function to initialize the database with a schema.
async fn run_schema(tx: &mut Transaction<'static, Postgres>, schema: &str) -> DbResult<()> {
    // Strip out comments from the schema so that we can safely separate the statements by
    // looking for semicolons.
    let comments = regex::RegexBuilder::new("--.*$")
        .multi_line(true)
        .build()
        .map_err(|e| DbError::BackendError(e.to_string()))?;
    let schema = comments.replace_all(schema, "");

    for query_str in schema.split(';') {
        if query_str.trim().is_empty() {
            continue;
        }
        sqlx::query(query_str).execute(&mut **tx).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Converts a row with all the columns of the `books` table into a `Book`.
fn book_from_row(row: &PgRow) -> DbResult<Book> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let author: String = row.try_get("author").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let publisher: String = row.try_get("publisher").map_err(map_sqlx_error)?;
    Ok(Book::new(BookId::from_i64(id), author, title, publisher))
}

/// A transaction backed by a PostgreSQL database.
pub(crate) struct PostgresTx {
    /// Inner transaction type to obtain access to the raw sqlx transaction.
    tx: Transaction<'static, Postgres>,
}

impl From<Transaction<'static, Postgres>> for PostgresTx {
    fn from(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl BareTx for PostgresTx {
    async fn commit(self) -> DbResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn migrate(&mut self) -> DbResult<()> {
        run_schema(&mut self.tx, SCHEMA).await
    }
}

#[async_trait::async_trait]
impl BooksTx for PostgresTx {
    async fn create_book(&mut self, details: NewBook) -> DbResult<Book> {
        let query_str = "
            INSERT INTO books (author, title, publisher)
            VALUES ($1, $2, $3)
            RETURNING id
        ";
        let row = sqlx::query(query_str)
            .bind(details.author())
            .bind(details.title())
            .bind(details.publisher())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;

        Ok(Book::from_new(BookId::from_i64(id), details))
    }

    async fn delete_book(&mut self, id: BookId) -> DbResult<()> {
        let query_str = "DELETE FROM books WHERE id = $1";
        let done = sqlx::query(query_str)
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        if done.rows_affected() > 1 {
            return Err(DbError::BackendError("Deletion affected more than one row".to_owned()));
        }
        Ok(())
    }

    async fn get_book(&mut self, id: BookId) -> DbResult<Book> {
        let query_str = "SELECT id, author, title, publisher FROM books WHERE id = $1";
        let maybe_row = sqlx::query(query_str)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        match maybe_row {
            None => Err(DbError::NotFound),
            Some(row) => book_from_row(&row),
        }
    }

    async fn get_books(&mut self) -> DbResult<Vec<Book>> {
        let query_str = "SELECT id, author, title, publisher FROM books";
        let mut rows = sqlx::query(query_str).fetch(&mut *self.tx);

        let mut books = vec![];
        while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
            books.push(book_from_row(&row)?);
        }
        Ok(books)
    }
}
