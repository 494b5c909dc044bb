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

//! Operations on one book.

use crate::db::{BareTx, BooksTx, Db};
use crate::driver::{Driver, DriverResult};
use crate::model::*;
use log::info;

impl<D> Driver<D>
where
    D: Db + Clone + Send + Sync + 'static,
    D::Tx: BooksTx,
{
    /// Stores a new book described by `details` and returns it with its assigned identifier.
    pub(crate) async fn create_book(self, details: NewBook) -> DriverResult<Book> {
        let mut tx = self.db.begin().await?;
        let book = tx.create_book(details).await?;
        tx.commit().await?;
        info!("Created book {}", book.id());
        Ok(book)
    }

    /// Deletes the book identified by `id`, which need not exist.
    pub(crate) async fn delete_book(self, id: BookId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        tx.delete_book(id).await?;
        tx.commit().await?;
        info!("Deleted book {}", id);
        Ok(())
    }

    /// Gets the book identified by `id`.
    pub(crate) async fn get_book(self, id: BookId) -> DriverResult<Book> {
        let mut tx = self.db.begin().await?;
        let book = tx.get_book(id).await?;
        tx.commit().await?;
        Ok(book)
    }
}
