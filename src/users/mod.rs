use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::db::{run, SharedStore};
use crate::types::ApiResult;

pub mod models;

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    users: Vec<models::User>,
}

#[get("/")]
pub async fn list(store: &State<SharedStore>) -> ApiResult<UsersResponse> {
    let users = run(store, |store| store.users()).await?;
    Ok(Json(UsersResponse { users }))
}
