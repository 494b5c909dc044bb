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

//! Entry point to the REST server.
//!
//! Every API lives in its own `<entity>_<method>.rs` file.  All responses, successful or not, are
//! JSON `Envelope`s with a human-readable message; failures never expose error details to the
//! client and are logged instead.

use crate::db::{BooksTx, Db};
use crate::driver::{Driver, DriverError};
use crate::model::BookId;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use log::warn;
use serde::Serialize;

mod book_delete;
mod book_get;
mod book_post;
mod books_get;
#[cfg(test)]
mod testutils;

/// Shape of every response body returned by the service.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
pub(crate) struct Envelope<T> {
    /// Human-readable description of the outcome of the request.
    message: String,

    /// Payload of successful read operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl Envelope<()> {
    /// Creates an envelope that only carries a `message`.
    pub(crate) fn message<M: Into<String>>(message: M) -> Self {
        Self { message: message.into(), data: None }
    }
}

impl<T> Envelope<T> {
    /// Creates an envelope that carries a `message` and some `data`.
    pub(crate) fn with_data<M: Into<String>>(message: M, data: T) -> Self {
        Self { message: message.into(), data: Some(data) }
    }
}

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
///
/// The message of each error is the only thing the client sees.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that the request body could not be parsed, with a description of why.
    #[error("request failed")]
    BadPayload(String),

    /// Indicates that the request did not carry the identifier of the book to operate on.
    ///
    /// This is reported as a server error and is not logged as a failure.
    #[error("id cannot be empty")]
    EmptyId,

    /// Indicates that the operation on the database failed for any reason, including the requested
    /// book not existing.
    #[error("{message}")]
    OperationFailed {
        /// Generic description of the operation that failed.
        message: &'static str,

        /// The underlying error, which is logged but never returned to the client.
        #[source]
        source: DriverError,
    },
}

impl RestError {
    /// Wraps the `source` error of an operation with the generic `message` to show to the client.
    pub(crate) fn failed<E: Into<DriverError>>(message: &'static str, source: E) -> Self {
        RestError::OperationFailed { message, source: source.into() }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RestError::BadPayload(e) => {
                warn!("{}: {}", self, e);
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RestError::EmptyId => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::OperationFailed { source, .. } => {
                warn!("{}: {}", self, source);
                StatusCode::BAD_REQUEST
            }
        };

        (status, Json(Envelope::message(self.to_string()))).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Extracts the identifier of a book from the optional `id` path parameter.
///
/// An absent or empty identifier yields `RestError::EmptyId`.  An identifier that is not a number
/// is reported as a failure of the operation, described by `failure`, because the database
/// cannot possibly match it.
pub(crate) fn book_id(id: Option<Path<String>>, failure: &'static str) -> RestResult<BookId> {
    let id = match id {
        Some(Path(id)) => id,
        None => String::new(),
    };
    if id.is_empty() {
        return Err(RestError::EmptyId);
    }
    id.parse::<BookId>().map_err(|e| RestError::failed(failure, e))
}

/// Creates the router for the application.
///
/// Operations on a single book are also bound without the identifier so that requests with an
/// empty identifier reach the handler and get the corresponding error.
pub(crate) fn app<D>(driver: Driver<D>) -> Router
where
    D: Db + Clone + Send + Sync + 'static,
    D::Tx: BooksTx,
{
    use axum::routing::{delete, get, post};
    Router::new()
        .route("/api/create_book", post(book_post::handler::<D>))
        .route("/api/delete_book/", delete(book_delete::handler::<D>))
        .route("/api/delete_book/:id", delete(book_delete::handler::<D>))
        .route("/api/get_book/", get(book_get::handler::<D>))
        .route("/api/get_book/:id", get(book_get::handler::<D>))
        .route("/api/get_books", get(books_get::handler::<D>))
        .with_state(driver)
}
