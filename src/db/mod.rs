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

//! Database abstraction in terms of the operations needed by the server.
//!
//! The PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests.  Both implement the same `BooksTx` operations and are exercised by the
//! same tests in the `tests` module.

use crate::model::*;

pub mod postgres;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

/// Result type for this module.
pub(crate) type DbResult<T> = Result<T, DbError>;

/// Operations that every transaction supports regardless of the data it manipulates.
#[async_trait::async_trait]
pub(crate) trait BareTx {
    /// Commits the transaction.  Dropping the transaction without calling this rolls it back.
    async fn commit(self) -> DbResult<()>;

    /// Creates the tables needed by the service if they do not exist yet.
    async fn migrate(&mut self) -> DbResult<()>;
}

/// Abstraction over a database connection pool that hands out transactions of type `Tx`.
#[async_trait::async_trait]
pub(crate) trait Db {
    /// The transaction type returned by `begin`.
    type Tx: BareTx + Send + 'static;

    /// Begins a new transaction.
    async fn begin(&self) -> DbResult<Self::Tx>;
}

/// A transaction with high-level operations that deal with our types.
///
/// Every operation maps to exactly one SQL statement.
#[async_trait::async_trait]
pub(crate) trait BooksTx: BareTx {
    /// Stores a new book with the given `details` and returns it with its assigned identifier.
    async fn create_book(&mut self, details: NewBook) -> DbResult<Book>;

    /// Deletes the book identified by `id`.
    ///
    /// Deleting a book that does not exist is not an error.
    async fn delete_book(&mut self, id: BookId) -> DbResult<()>;

    /// Gets the book identified by `id`.
    async fn get_book(&mut self, id: BookId) -> DbResult<Book>;

    /// Gets all existing books in the order in which the database returns them.
    async fn get_books(&mut self) -> DbResult<Vec<Book>>;
}
