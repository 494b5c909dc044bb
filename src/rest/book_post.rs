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

//! API to create a new book.

use crate::db::{BooksTx, Db};
use crate::driver::Driver;
use crate::model::NewBook;
use crate::rest::{Envelope, RestError, RestResult};
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use mime::Mime;

/// Encodings in which clients can supply the details of a new book.
#[cfg_attr(test, derive(Debug, PartialEq))]
enum PayloadFormat {
    /// A JSON object, including vendor-specific `+json` types.
    Json,

    /// An `application/x-www-form-urlencoded` form.
    Form,

    /// A `multipart/form-data` form.  Only its non-file fields are considered.
    Multipart,

    /// An XML document whose root element contains one child element per field.
    Xml,
}

impl PayloadFormat {
    /// Determines the format of the payload from the `Content-Type` in `headers`.
    ///
    /// Returns `None` if the header is missing or names an unsupported type.
    fn from_headers(headers: &HeaderMap) -> Option<PayloadFormat> {
        let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let content_type = content_type.parse::<Mime>().ok()?;

        let (type_, subtype, suffix) =
            (content_type.type_(), content_type.subtype(), content_type.suffix());
        if type_ == mime::APPLICATION && (subtype == mime::JSON || suffix == Some(mime::JSON)) {
            Some(PayloadFormat::Json)
        } else if type_ == mime::APPLICATION && subtype == mime::WWW_FORM_URLENCODED {
            Some(PayloadFormat::Form)
        } else if type_ == mime::MULTIPART && subtype == mime::FORM_DATA {
            Some(PayloadFormat::Multipart)
        } else if (type_ == mime::APPLICATION || type_ == mime::TEXT)
            && (subtype == mime::XML || suffix == Some(mime::XML))
        {
            Some(PayloadFormat::Xml)
        } else {
            None
        }
    }
}

/// Extracts the details of a book from the non-file fields of a multipart form.
async fn parse_multipart(mut multipart: Multipart) -> RestResult<NewBook> {
    let mut fields = vec![];
    while let Some(field) =
        multipart.next_field().await.map_err(|e| RestError::BadPayload(e.to_string()))?
    {
        if field.file_name().is_some() {
            continue;
        }
        let name = match field.name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        let value = field.text().await.map_err(|e| RestError::BadPayload(e.to_string()))?;
        fields.push((name, value));
    }
    Ok(NewBook::from_fields(fields))
}

/// Reads the whole body of `request`.
async fn read_body(request: Request) -> RestResult<Bytes> {
    Bytes::from_request(request, &()).await.map_err(|e| RestError::BadPayload(e.to_string()))
}

/// Extracts the details of a book from `request` using the decoder its content type asks for.
async fn parse_payload(request: Request) -> RestResult<NewBook> {
    let format = match PayloadFormat::from_headers(request.headers()) {
        Some(format) => format,
        None => {
            let content_type = request.headers().get(header::CONTENT_TYPE).cloned();
            return Err(RestError::BadPayload(format!(
                "Unsupported content type {:?}",
                content_type
            )));
        }
    };

    match format {
        PayloadFormat::Json => {
            let body = read_body(request).await?;
            serde_json::from_slice(&body).map_err(|e| RestError::BadPayload(e.to_string()))
        }
        PayloadFormat::Form => {
            let body = read_body(request).await?;
            serde_urlencoded::from_bytes(&body).map_err(|e| RestError::BadPayload(e.to_string()))
        }
        PayloadFormat::Multipart => {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| RestError::BadPayload(e.to_string()))?;
            parse_multipart(multipart).await
        }
        PayloadFormat::Xml => {
            let body = read_body(request).await?;
            quick_xml::de::from_reader(&body[..]).map_err(|e| RestError::BadPayload(e.to_string()))
        }
    }
}

/// API handler.
pub(crate) async fn handler<D>(
    State(driver): State<Driver<D>>,
    request: Request,
) -> RestResult<impl IntoResponse>
where
    D: Db + Clone + Send + Sync + 'static,
    D::Tx: BooksTx,
{
    let details = parse_payload(request).await?;
    driver.create_book(details).await.map_err(|e| RestError::failed("could not create book", e))?;
    Ok(Json(Envelope::message("book has been added")))
}
