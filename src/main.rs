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

//! Entry point to the bookstore service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use bookstore::db::postgres::PostgresOptions;
use bookstore::env::{get_optional_bare_var, load_env_file};
use bookstore::serve;
use log::error;
use std::net::Ipv4Addr;
use std::process;

/// Port to listen on when `PORT` is not set.
const DEFAULT_PORT: u16 = 8000;

/// Gathers the configuration from the environment and runs the server until it fails.
async fn run() -> Result<(), String> {
    let port = get_optional_bare_var::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);
    let db_opts = PostgresOptions::from_env("DB")?;
    serve((Ipv4Addr::UNSPECIFIED, port), db_opts).await.map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    // Load the .env file before initializing logging so that it can carry RUST_LOG.
    let env_file = load_env_file(".env");
    env_logger::init();
    if let Err(e) = env_file {
        error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = run().await {
        error!("{}", e);
        process::exit(1);
    }
}
