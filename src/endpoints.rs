use lazy_static::lazy_static;
use rocket::get;
use rocket::serde::json::Json;
use serde_json::{json, Value};

lazy_static! {
    static ref ENDPOINTS: Value = serde_json::from_str(include_str!("../endpoints.json")).unwrap();
}

/// Describes every route the API serves.
#[get("/")]
pub fn index() -> Json<Value> {
    Json(json!({ "endpoints": ENDPOINTS.clone() }))
}
