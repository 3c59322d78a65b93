use diesel::prelude::*;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::db::schema::topics;
use crate::db::{run, SharedStore, Store};
use crate::types::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = topics)]
pub struct Topic {
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    topics: Vec<Topic>,
}

/// Fails with NotFound when no topic has this slug.
pub fn ensure_exists(store: &dyn Store, slug: &str) -> Result<(), ApiError> {
    if store.topic_exists(slug)? {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("no topic {:?}", slug)))
    }
}

#[get("/")]
pub async fn list(store: &State<SharedStore>) -> ApiResult<TopicsResponse> {
    let topics = run(store, |store| store.topics()).await?;
    Ok(Json(TopicsResponse { topics }))
}
