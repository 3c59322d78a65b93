//! Article listing: parameter validation, SQL assembly and row post-processing.

use rocket::FromForm;
use std::str::FromStr;

use crate::article::models::ArticleSummary;
use crate::db::Store;
use crate::types::ApiError;

/// Raw `GET /api/articles` query string. Unknown keys are ignored.
#[derive(Debug, Default, FromForm)]
pub struct ListingParams {
    pub topic: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub p: Option<String>,
    pub total_count: Option<String>,
}

/// Columns the listing may be ordered by. Each maps to a fixed SQL token,
/// so the request text never reaches identifier position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Author,
    Title,
    Topic,
    ArticleId,
    CommentCount,
    ArticleImgUrl,
    Votes,
    CreatedAt,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Author => "articles.author",
            SortKey::Title => "articles.title",
            SortKey::Topic => "articles.topic",
            SortKey::ArticleId => "articles.article_id",
            SortKey::CommentCount => "comment_count",
            SortKey::ArticleImgUrl => "articles.article_img_url",
            SortKey::Votes => "articles.votes",
            SortKey::CreatedAt => "articles.created_at",
        }
    }
}

impl FromStr for SortKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "author" => Ok(SortKey::Author),
            "title" => Ok(SortKey::Title),
            "topic" => Ok(SortKey::Topic),
            "article_id" => Ok(SortKey::ArticleId),
            "comment_count" => Ok(SortKey::CommentCount),
            "article_img_url" => Ok(SortKey::ArticleImgUrl),
            "votes" => Ok(SortKey::Votes),
            "created_at" => Ok(SortKey::CreatedAt),
            other => Err(ApiError::BadRequest(format!("cannot sort by {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ApiError::BadRequest(format!("unknown order {:?}", other))),
        }
    }
}

/// A value bound to a `$n` placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlBind {
    Text(String),
    BigInt(i64),
}

/// A validated article listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    topic: Option<String>,
    sort_by: SortKey,
    order: SortOrder,
    limit: Option<i64>,
    page: Option<i64>,
    total_count: bool,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        ArticleQuery {
            topic: None,
            sort_by: SortKey::CreatedAt,
            order: SortOrder::Desc,
            limit: None,
            page: None,
            total_count: false,
        }
    }
}

/// The listing handed back to the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleListing {
    pub articles: Vec<ArticleSummary>,
    pub total_count: Option<i64>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn at_least(name: &str, min: i64, value: Option<String>) -> Result<Option<i64>, ApiError> {
    match present(value) {
        None => Ok(None),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= min => Ok(Some(n)),
            _ => Err(ApiError::BadRequest(format!("{} must be an integer of at least {}, got {:?}", name, min, raw))),
        },
    }
}

impl ArticleQuery {
    pub fn from_params(params: ListingParams) -> Result<Self, ApiError> {
        let order = match params.order {
            Some(order) => order.parse()?,
            None => SortOrder::Desc,
        };
        let sort_by = match params.sort_by {
            Some(sort_by) => sort_by.parse()?,
            None => SortKey::CreatedAt,
        };
        let total_count = match params.total_count.as_deref() {
            None | Some("0") => false,
            Some("1") => true,
            Some(other) => {
                return Err(ApiError::BadRequest(format!("total_count must be 0 or 1, got {:?}", other)))
            }
        };
        let limit = at_least("limit", 0, params.limit)?;
        // Without a limit the page skips nothing, so it is only read for the
        // past-the-end check and an unreadable value is dropped.
        let page = match limit {
            Some(_) => at_least("p", 1, params.p)?,
            None => present(params.p).and_then(|raw| raw.parse::<i64>().ok()),
        };
        let query = ArticleQuery {
            topic: present(params.topic),
            sort_by,
            order,
            limit,
            page,
            total_count,
        };
        query.offset()?;
        Ok(query)
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn page(&self) -> Option<i64> {
        self.page
    }

    pub fn with_total_count(&self) -> bool {
        self.total_count
    }

    /// Rows skipped before the limit applies. A page without a limit skips nothing.
    pub fn offset(&self) -> Result<Option<i64>, ApiError> {
        match (self.limit, self.page) {
            (Some(limit), Some(page)) => limit
                .checked_mul(page - 1)
                .map(Some)
                .ok_or_else(|| ApiError::BadRequest(format!("page {} of {} is out of range", page, limit))),
            _ => Ok(None),
        }
    }

    /// Builds the listing statement and its bind values.
    pub fn to_sql(&self) -> Result<(String, Vec<SqlBind>), ApiError> {
        let mut binds = Vec::new();
        let mut sql = String::from(
            "SELECT articles.author, articles.title, articles.article_id, articles.topic, \
             articles.created_at, articles.votes, articles.article_img_url, \
             COUNT(comments.comment_id)::int AS comment_count",
        );
        if self.total_count {
            sql.push_str(", COUNT(*) OVER() AS total_count");
        }
        sql.push_str(" FROM articles LEFT JOIN comments ON articles.article_id = comments.article_id");

        if let Some(topic) = &self.topic {
            binds.push(SqlBind::Text(topic.clone()));
            sql.push_str(&format!(" WHERE articles.topic = ${}", binds.len()));
        }

        sql.push_str(&format!(
            " GROUP BY articles.article_id ORDER BY {} {}",
            self.sort_by.column(),
            self.order.keyword()
        ));
        if self.sort_by != SortKey::ArticleId {
            sql.push_str(", articles.article_id ASC");
        }

        if let Some(limit) = self.limit {
            binds.push(SqlBind::BigInt(limit));
            sql.push_str(&format!(" LIMIT ${}", binds.len()));
            if let Some(offset) = self.offset()? {
                binds.push(SqlBind::BigInt(offset));
                sql.push_str(&format!(" OFFSET ${}", binds.len()));
            }
        }
        Ok((sql, binds))
    }

    /// Turns the rows the store produced into the listing.
    ///
    /// An empty page past the first is a request beyond the end of the
    /// result set, which is not the same as a filter that matched nothing.
    pub fn finish(
        &self,
        articles: Vec<ArticleSummary>,
        window_total: Option<i64>,
    ) -> Result<ArticleListing, ApiError> {
        if articles.is_empty() && self.page.map_or(false, |page| page > 1) {
            return Err(ApiError::NotFound(format!(
                "page {} is past the end of the listing",
                self.page.unwrap_or_default()
            )));
        }
        let total_count = if self.total_count {
            Some(window_total.unwrap_or(0))
        } else {
            None
        };
        Ok(ArticleListing {
            articles,
            total_count,
        })
    }
}

/// Runs `query` against the store and post-processes the rows.
pub fn filter_articles(store: &dyn Store, query: &ArticleQuery) -> Result<ArticleListing, ApiError> {
    let (articles, window_total) = store.filter_articles(query)?;
    query.finish(articles, window_total)
}
