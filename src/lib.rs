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

//! REST service to manage a collection of books.
//!
//! The service is structured in the following layers, each in its own module:
//!
//! 1.  `model`: High-level data types that represent books.  There is no logic in here.
//!
//! 1.  `db`: The persistence layer.  The `BooksTx` trait extends the bare transaction operations
//!     with the statements the service needs, and is implemented for PostgreSQL and, for tests,
//!     for SQLite.
//!
//! 1.  `driver`: The business logic layer.  Every operation runs in its own transaction.
//!
//! 1.  `rest`: The HTTP layer, offering the REST APIs on top of a `Driver`.
//!
//! 1.  `main`: The app launcher, which gathers configuration from the environment and calls the
//!     `serve` function.
//!
//! There are result and error types in every layer, such as `DbResult` and `DbError`.  Errors
//! float to the top of the app using the `?` operator, being translated to HTTP status codes once
//! returned from the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::db::postgres::{PostgresDb, PostgresOptions, PostgresTx};
use crate::driver::Driver;
use crate::rest::app;
use log::info;
use std::error::Error;
use std::net::SocketAddr;

pub mod db;
mod driver;
pub mod env;
pub(crate) mod model;
mod rest;

/// Instantiates all resources to serve the application on `bind_addr` backed by the PostgreSQL
/// database described by `db_opts`.
///
/// The database schema is created if it does not exist yet.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db_opts: PostgresOptions,
) -> Result<(), Box<dyn Error>> {
    let db = PostgresDb::<PostgresTx>::connect(db_opts)
        .await
        .map_err(|e| format!("Could not initialize the database: {}", e))?;
    let driver = Driver::new(db);
    let app = app(driver);

    let bind_addr = bind_addr.into();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
