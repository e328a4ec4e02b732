//! Success side of the `{success, message?, data}` response envelope.

use axum::{Json, http::StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::application::pagination::Paged;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub type EnvelopeResponse<T> = (StatusCode, Json<Envelope<T>>);

pub fn ok<T: Serialize>(data: T) -> EnvelopeResponse<T> {
    reply(StatusCode::OK, None, Some(data))
}

pub fn ok_with<T: Serialize>(message: &'static str, data: T) -> EnvelopeResponse<T> {
    reply(StatusCode::OK, Some(message), Some(data))
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> EnvelopeResponse<T> {
    reply(StatusCode::CREATED, Some(message), Some(data))
}

/// A message-only success, e.g. after a delete.
pub fn done(message: &'static str) -> EnvelopeResponse<()> {
    reply(StatusCode::OK, Some(message), None)
}

fn reply<T>(status: StatusCode, message: Option<&'static str>, data: Option<T>) -> EnvelopeResponse<T> {
    (
        status,
        Json(Envelope {
            success: true,
            message,
            data,
        }),
    )
}

/// `{<key>: {<field>: value}}`, the single-record payload shape.
pub fn keyed<T: Serialize>(key: &str, value: T) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
    Value::Object(map)
}

/// `{<records_key>, totalPages, currentPage, <total_key>}` for list endpoints.
pub fn page_body<T: Serialize>(records_key: &str, total_key: &str, paged: Paged<T>) -> Value {
    let mut map = Map::new();
    map.insert(
        records_key.to_string(),
        serde_json::to_value(paged.records).unwrap_or(Value::Null),
    );
    map.insert("totalPages".into(), paged.total_pages.into());
    map.insert("currentPage".into(), paged.current_page.into());
    map.insert(total_key.to_string(), paged.total.into());
    Value::Object(map)
}
