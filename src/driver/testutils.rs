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

//! Test utilities for the business layer.

use crate::db::sqlite::{testutils, SqliteDb, SqliteTx};
use crate::db::{BareTx, BooksTx, Db};
use crate::driver::Driver;
use crate::model::*;

/// State of a test for the business layer: a fresh in-memory database and a driver on top of it.
pub(crate) struct TestContext {
    /// Database backing the driver, for direct manipulation of its contents.
    db: SqliteDb<SqliteTx>,

    /// Driver under test.
    driver: Driver<SqliteDb<SqliteTx>>,
}

impl TestContext {
    /// Initializes a new test context with an empty database.
    pub(crate) async fn setup() -> Self {
        let db = testutils::setup().await;
        let driver = Driver::new(db.clone());
        Self { db, driver }
    }

    /// Returns a copy of the driver under test.
    pub(crate) fn driver(&self) -> Driver<SqliteDb<SqliteTx>> {
        self.driver.clone()
    }

    /// Stores a book whose fields are all derived from `suffix`, bypassing the driver.
    pub(crate) async fn create_book(&self, suffix: &str) -> Book {
        let details = NewBook::new(
            format!("author {}", suffix),
            format!("title {}", suffix),
            format!("publisher {}", suffix),
        );
        let mut tx = self.db.begin().await.unwrap();
        let book = tx.create_book(details).await.unwrap();
        tx.commit().await.unwrap();
        book
    }

    /// Gets all stored books sorted by their identifier, bypassing the driver.
    pub(crate) async fn get_books(&self) -> Vec<Book> {
        let mut tx = self.db.begin().await.unwrap();
        let mut books = tx.get_books().await.unwrap();
        tx.commit().await.unwrap();
        books.sort_by_key(|b| *b.id());
        books
    }

    /// Makes every subsequent database operation on books fail.
    pub(crate) async fn break_storage(&self) {
        self.db.drop_books_table().await.unwrap();
    }
}
