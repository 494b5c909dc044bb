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

//! API to get one book.

use crate::db::{BooksTx, Db};
use crate::driver::Driver;
use crate::rest::{book_id, Envelope, RestError, RestResult};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use log::debug;

/// Message returned to the client when the book cannot be fetched.
const FAILURE: &str = "could not get book";

/// API handler.
pub(crate) async fn handler<D>(
    State(driver): State<Driver<D>>,
    id: Option<Path<String>>,
) -> RestResult<impl IntoResponse>
where
    D: Db + Clone + Send + Sync + 'static,
    D::Tx: BooksTx,
{
    let id = book_id(id, FAILURE)?;
    debug!("Fetching book {}", id);
    let book = driver.get_book(id).await.map_err(|e| RestError::failed(FAILURE, e))?;
    Ok(Json(Envelope::with_data("book fetched successfully", book)))
}
