use chrono::NaiveDateTime;
use diesel::prelude::*;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, post, State};
use serde::{Deserialize, Serialize};

use crate::db::schema::comments;
use crate::db::{run, SharedStore};
use crate::types::{ApiError, ApiResult};
use crate::utils::{parse_id, serialize_date};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub comment_id: i32,
    pub article_id: i32,
    pub author: String,
    pub body: String,
    pub votes: i32,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
}

/// The shape handed back after an insert.
#[derive(Debug, Clone, PartialEq, Queryable, Serialize)]
pub struct CreatedComment {
    pub comment_id: i32,
    pub article_id: i32,
    pub body: String,
    pub username: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub author: String,
    pub body: String,
    pub article_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    username: Option<String>,
    body: Option<String>,
}

impl CommentBody {
    fn into_new_comment(self, article_id: i32) -> Result<NewComment, ApiError> {
        match (self.username, self.body) {
            (Some(author), Some(body)) => Ok(NewComment {
                author,
                body,
                article_id,
            }),
            (None, _) => Err(ApiError::BadRequest("comment without username".into())),
            (_, None) => Err(ApiError::BadRequest("comment without body".into())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

#[get("/<article_id>/comments", rank = 2)]
pub async fn list(store: &State<SharedStore>, article_id: &str) -> ApiResult<CommentsContainer<Vec<Comment>>> {
    let article_id = parse_id(article_id)?;
    let comments = run(store, move |store| {
        store.article_by_id(article_id)?;
        store.comments_for_article(article_id)
    })
    .await?;
    Ok(Json(CommentsContainer { comments }))
}

#[post("/<article_id>/comments", data = "<details>")]
pub async fn add(
    store: &State<SharedStore>,
    article_id: &str,
    details: Result<Json<CommentBody>, json::Error<'_>>,
) -> Result<Custom<Json<CommentContainer<CreatedComment>>>, ApiError> {
    let article_id = parse_id(article_id)?;
    let new_comment = details
        .map_err(|e| ApiError::BadRequest(format!("invalid comment: {:?}", e)))?
        .into_inner()
        .into_new_comment(article_id)?;
    let comment = run(store, move |store| {
        if !store.user_exists(&new_comment.author)? {
            return Err(ApiError::NotFound(format!("no user {:?}", new_comment.author)));
        }
        store.insert_comment(&new_comment)
    })
    .await?;
    Ok(Custom(Status::Created, Json(CommentContainer { comment })))
}

#[delete("/<comment_id>")]
pub async fn remove(store: &State<SharedStore>, comment_id: &str) -> Result<Status, ApiError> {
    let comment_id = parse_id(comment_id)?;
    let deleted = run(store, move |store| store.delete_comment(comment_id)).await?;
    if deleted > 0 {
        Ok(Status::NoContent)
    } else {
        Err(ApiError::NotFound(format!("no comment {}", comment_id)))
    }
}
