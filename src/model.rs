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

//! High-level data types.

use derive_getters::Getters;
use derive_more::{Constructor, Display};
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model errors.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for this module.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// Identifier of a book, assigned by the database when the book is created.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct BookId(i64);

impl BookId {
    /// Creates a book identifier from the raw value stored in the database.
    pub(crate) fn from_i64(id: i64) -> BookId {
        BookId(id)
    }

    /// Returns the identifier as an `i64` to bind it in queries.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

impl FromStr for BookId {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.parse::<i64>() {
            Ok(id) => Ok(BookId(id)),
            Err(e) => Err(ModelError(format!("Invalid book id '{}': {}", s, e))),
        }
    }
}

/// Contents of a book as supplied by a client, before the database assigns it an identifier.
///
/// Missing fields are treated as empty strings; there is no validation at this layer.
#[derive(Constructor, Default, Getters)]
#[cfg_attr(test, derive(Clone, Debug, PartialEq, Serialize))]
pub(crate) struct NewBook {
    /// Name of the author of the book.
    author: String,

    /// Title of the book.
    title: String,

    /// Name of the company that published the book.
    publisher: String,
}

impl NewBook {
    /// Names of the fields that clients can supply.
    const FIELDS: &'static [&'static str] = &["author", "title", "publisher"];

    /// Stores `value` in the field whose name matches `key` regardless of case.  Unknown keys are
    /// ignored.
    fn set_field(&mut self, key: &str, value: String) {
        let field = if key.eq_ignore_ascii_case("author") {
            &mut self.author
        } else if key.eq_ignore_ascii_case("title") {
            &mut self.title
        } else if key.eq_ignore_ascii_case("publisher") {
            &mut self.publisher
        } else {
            return;
        };
        *field = value;
    }

    /// Builds a book from a sequence of form `fields`, ignoring the unknown ones.
    pub(crate) fn from_fields<I: IntoIterator<Item = (String, String)>>(fields: I) -> Self {
        let mut book = NewBook::default();
        for (key, value) in fields {
            book.set_field(&key, value);
        }
        book
    }
}

/// Visitor to deserialize a `NewBook` from any map-like representation.
struct NewBookVisitor;

impl<'de> Visitor<'de> for NewBookVisitor {
    type Value = NewBook;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object with author, title and publisher strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut book = NewBook::default();
        while let Some(key) = map.next_key::<String>()? {
            if NewBook::FIELDS.iter().any(|f| f.eq_ignore_ascii_case(&key)) {
                let value = map.next_value::<Option<String>>()?.unwrap_or_default();
                book.set_field(&key, value);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(book)
    }
}

/// Field names are matched without regard to case, null values and missing fields become empty
/// strings, and unknown fields are ignored.
impl<'de> Deserialize<'de> for NewBook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct("NewBook", NewBook::FIELDS, NewBookVisitor)
    }
}

/// A book as stored in the database.
#[derive(Constructor, Debug, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Deserialize, PartialEq))]
pub(crate) struct Book {
    /// Identifier assigned to the book at creation time.
    id: BookId,

    /// Name of the author of the book.
    author: String,

    /// Title of the book.
    title: String,

    /// Name of the company that published the book.
    publisher: String,
}

impl Book {
    /// Combines the client-supplied `details` with the `id` the database assigned to them.
    pub(crate) fn from_new(id: BookId, details: NewBook) -> Book {
        Book { id, author: details.author, title: details.title, publisher: details.publisher }
    }
}
