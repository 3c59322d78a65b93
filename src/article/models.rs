use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use serde::{Deserialize, Serialize};

use crate::db::schema::articles;
use crate::utils::serialize_date;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = articles)]
pub struct Article {
    pub article_id: i32,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    pub votes: i32,
    pub article_img_url: Option<String>,
}

/// One row of the article listing: everything but the body, plus the
/// number of comments at query time.
#[derive(Debug, Clone, PartialEq, QueryableByName, Serialize)]
pub struct ArticleSummary {
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
    #[diesel(sql_type = Nullable<Text>)]
    pub article_img_url: Option<String>,
    #[diesel(sql_type = Integer)]
    pub comment_count: i32,
}

/// A listing row loaded with the `COUNT(*) OVER()` window column.
#[derive(Debug, QueryableByName)]
pub struct CountedArticleSummary {
    #[diesel(embed)]
    pub article: ArticleSummary,
    #[diesel(sql_type = BigInt)]
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article: Article,
}

#[derive(Debug, Serialize)]
pub struct ArticleWithCount {
    pub article: Article,
    pub comment_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdate {
    pub votes_to_be_added: i32,
}
