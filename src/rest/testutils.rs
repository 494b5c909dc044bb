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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::*;
use crate::rest::{app, Envelope};
use axum::body::Body;
use axum::http::{self, Request};
use axum::response::Response;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower::util::ServiceExt;

/// Maximum body size for testing purposes.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// State of a test for the REST layer: the business layer context plus the router on top of it.
pub(crate) struct TestContext {
    /// Context of the business layer, for direct manipulation of the database.
    driver: DriverTestContext,

    /// Router under test.
    app: Router,
}

impl TestContext {
    pub(crate) async fn setup() -> Self {
        let driver = DriverTestContext::setup().await;
        let app = app(driver.driver());
        Self { driver, app }
    }

    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    pub(crate) async fn create_book(&self, suffix: &str) -> Book {
        self.driver.create_book(suffix).await
    }

    pub(crate) async fn get_books(&self) -> Vec<Book> {
        self.driver.get_books().await
    }

    pub(crate) async fn break_storage(&self) {
        self.driver.break_storage().await
    }
}

/// Builder for a single request to the API server.
#[must_use]
pub(crate) struct OneShotBuilder {
    /// The router for the app being tested.
    app: Router,

    /// Builder for the request that will be sent to the app.
    builder: http::request::Builder,
}

impl OneShotBuilder {
    /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
    pub(crate) fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        Self { app, builder }
    }

    /// Finishes building the request and sends it with an empty payload.
    pub(crate) async fn send_empty(self) -> ResponseChecker {
        let request = self.builder.body(Body::empty()).unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a text payload.
    pub(crate) async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .body(Body::from(text.into()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a JSON payload.
    pub(crate) async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_vec(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with an arbitrary `payload` declared to be of
    /// type `content_type`.
    pub(crate) async fn send_payload<T: Into<String>>(
        self,
        content_type: &str,
        payload: T,
    ) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, content_type)
            .body(Body::from(payload.into()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a form encoded in the body as the payload.
    pub(crate) async fn send_form<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(Body::from(serde_urlencoded::to_string(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a multipart form that carries one text
    /// part per entry in `fields`.
    pub(crate) async fn send_multipart(self, fields: &[(&str, &str)]) -> ResponseChecker {
        let boundary = "bookstore-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        let request = self
            .builder
            .header(
                http::header::CONTENT_TYPE,
                format!("{}; boundary={}", mime::MULTIPART_FORM_DATA, boundary),
            )
            .body(Body::from(body))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }
}

/// Validator for the outcome of a request sent by a `OneShotBuilder`.
#[must_use]
pub(crate) struct ResponseChecker {
    /// Actual response that we received from the app.
    response: Response,

    /// Expected HTTP status code in the response above.
    exp_status: http::StatusCode,
}

impl From<Response> for ResponseChecker {
    fn from(response: Response) -> Self {
        Self { response, exp_status: http::StatusCode::OK }
    }
}

impl ResponseChecker {
    /// Sets the expected exit HTTP status to `status`.
    pub(crate) fn expect_status(mut self, status: http::StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Validates the status and content type and parses the body as an envelope.
    async fn take_envelope<T: DeserializeOwned>(self) -> Envelope<T> {
        assert_eq!(self.exp_status, self.response.status());

        let content_type = self
            .response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        assert_eq!(Some(mime::APPLICATION_JSON.as_ref().to_owned()), content_type);

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let body = String::from_utf8(body.to_vec()).unwrap();
                panic!("Invalid envelope due to {}; content was {}", e, body);
            }
        }
    }

    /// Finishes checking the response and expects its body to carry `exp_message` and no data.
    pub(crate) async fn expect_message(self, exp_message: &str) {
        let envelope = self.take_envelope::<serde_json::Value>().await;
        assert_eq!(exp_message, envelope.message);
        assert!(envelope.data.is_none(), "Unexpected data in {:?}", envelope);
    }

    /// Finishes checking the response and expects its body to carry `exp_message` and some data
    /// of type `T`, which is returned.
    pub(crate) async fn expect_data<T: DeserializeOwned>(self, exp_message: &str) -> T {
        let envelope = self.take_envelope::<T>().await;
        assert_eq!(exp_message, envelope.message);
        match envelope.data {
            Some(data) => data,
            None => panic!("No data in response with message '{}'", envelope.message),
        }
    }
}
