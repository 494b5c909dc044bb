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

//! Operations on the collection of books.

use crate::db::{BareTx, BooksTx, Db};
use crate::driver::{Driver, DriverResult};
use crate::model::*;

impl<D> Driver<D>
where
    D: Db + Clone + Send + Sync + 'static,
    D::Tx: BooksTx,
{
    /// Gets all existing books.  The order is whatever the database returns.
    pub(crate) async fn get_books(self) -> DriverResult<Vec<Book>> {
        let mut tx = self.db.begin().await?;
        let books = tx.get_books().await?;
        tx.commit().await?;
        Ok(books)
    }
}
