use chrono::{NaiveDateTime, SecondsFormat, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use serde::Serializer;
use serde_json::Value;

use crate::types::ApiError;

lazy_static! {
    static ref LIKE_META: Regex = Regex::new(r"[\\%_]").unwrap();
}

pub fn try_respond(req: &Request, json: &Value, status: Status) -> response::Result<'static> {
    Json(json)
        .respond_to(req)
        .map(|resp| Response::build_from(resp).status(status).finalize())
}

pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = Utc.from_utc_datetime(date).to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

/// Parses a numeric path segment such as `article_id`.
pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::BadRequest(format!("invalid id: {}", raw)))
}

/// Wraps a search term in `%` after escaping the LIKE metacharacters it contains.
pub fn like_pattern(term: &str) -> String {
    format!("%{}%", LIKE_META.replace_all(term, r"\$0"))
}
