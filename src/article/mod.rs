use rocket::serde::json::{self, Json};
use rocket::{get, patch, State};

use crate::db::{run, SharedStore};
use crate::topic;
use crate::types::{ApiError, ApiResult};
use crate::utils::parse_id;

use self::models::{ArticleResponse, ArticleWithCount, ArticlesResponse, SearchResponse, VoteUpdate};
use self::query::{ArticleQuery, ListingParams};

pub mod models;
pub mod query;

#[get("/?<params..>")]
pub async fn list(store: &State<SharedStore>, params: ListingParams) -> ApiResult<ArticlesResponse> {
    let request = ArticleQuery::from_params(params)?;
    let listing = run(store, move |store| {
        if let Some(slug) = request.topic() {
            topic::ensure_exists(store, slug)?;
        }
        query::filter_articles(store, &request)
    })
    .await?;
    Ok(Json(ArticlesResponse {
        articles: listing.articles,
        total_count: listing.total_count,
    }))
}

#[get("/search/<term>", rank = 1)]
pub async fn search(store: &State<SharedStore>, term: String) -> ApiResult<SearchResponse> {
    if term.trim().is_empty() {
        return Err(ApiError::BadRequest("empty search term".into()));
    }
    let articles = run(store, move |store| store.search_articles(&term)).await?;
    Ok(Json(SearchResponse { articles }))
}

#[get("/<article_id>")]
pub async fn show(store: &State<SharedStore>, article_id: &str) -> ApiResult<ArticleWithCount> {
    let article_id = parse_id(article_id)?;
    let (article, comment_count) = run(store, move |store| {
        let article = store.article_by_id(article_id)?;
        let count = store.comment_count(article_id)?;
        Ok((article, count))
    })
    .await?;
    Ok(Json(ArticleWithCount {
        article,
        comment_count,
    }))
}

#[patch("/<article_id>", data = "<update>")]
pub async fn update(
    store: &State<SharedStore>,
    article_id: &str,
    update: Result<Json<VoteUpdate>, json::Error<'_>>,
) -> ApiResult<ArticleResponse> {
    let article_id = parse_id(article_id)?;
    let delta = update
        .map_err(|e| ApiError::BadRequest(format!("invalid vote update: {:?}", e)))?
        .into_inner()
        .votes_to_be_added;
    let article = run(store, move |store| store.update_votes(article_id, delta)).await?;
    Ok(Json(ArticleResponse { article }))
}
