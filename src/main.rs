#[macro_use]
extern crate error_chain;

use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket::{catch, catchers, launch, routes, Build, Rocket};
use rocket_cors::{Cors, CorsOptions};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod article;
mod comment;
mod db;
mod endpoints;
mod topic;
mod types;
mod users;
mod utils;

use db::pg::PgStore;
use db::SharedStore;

#[catch(404)]
fn not_found(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": "Endpoint Not Found" }))
}

#[catch(default)]
fn fallback(status: Status, _req: &Request) -> Json<Value> {
    let msg = match status.code {
        400..=499 => "Bad Request",
        _ => "Internal Server Error",
    };
    Json(json!({ "msg": msg }))
}

/// Any origin may call the API; nothing is sent with credentials.
fn cors() -> Result<Cors, rocket_cors::Error> {
    CorsOptions::default().to_cors()
}

/// Builds the application around `store`.
pub fn rocket(store: SharedStore) -> Result<Rocket<Build>, rocket_cors::Error> {
    let rocket = rocket::build()
        .manage(store)
        .mount("/api", routes![endpoints::index])
        .mount("/api/topics", routes![topic::list])
        .mount("/api/users", routes![users::list])
        .mount(
            "/api/articles",
            routes![
                article::list,
                article::search,
                article::show,
                article::update,
                comment::list,
                comment::add,
            ],
        )
        .mount("/api/comments", routes![comment::remove])
        .register("/", catchers![not_found, fallback])
        .attach(cors()?);
    Ok(rocket)
}

#[launch]
fn serve() -> _ {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let pool = db::init_pool().expect("Failed to create database pool");
    info!("serving articles from postgres");
    rocket(Arc::new(PgStore::new(pool))).expect("Failed to configure CORS")
}
