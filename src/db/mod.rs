use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{error, info};

use crate::article::models::{Article, ArticleSummary};
use crate::article::query::ArticleQuery;
use crate::comment::{Comment, CreatedComment, NewComment};
use crate::topic::Topic;
use crate::types::ApiError;
use crate::users::models::User;

#[cfg(test)]
pub mod memory;
pub mod pg;
pub mod schema;

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        R2D2(r2d2::Error);
    }
}

pub fn init_pool() -> Result<Pool> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")?;
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::new(manager)?;
    info!(max_size = pool.max_size(), "database pool ready");
    Ok(pool)
}

/// Everything the handlers need from the data store.
///
/// Calls are blocking; handlers reach them through [`run`].
pub trait Store: Send + Sync {
    /// Runs the listing query. The second value is the window total carried
    /// by the first row, present only when the query asked for it and at
    /// least one row came back.
    fn filter_articles(
        &self,
        query: &ArticleQuery,
    ) -> std::result::Result<(Vec<ArticleSummary>, Option<i64>), ApiError>;

    fn topic_exists(&self, slug: &str) -> std::result::Result<bool, ApiError>;

    fn topics(&self) -> std::result::Result<Vec<Topic>, ApiError>;

    fn users(&self) -> std::result::Result<Vec<User>, ApiError>;

    fn user_exists(&self, username: &str) -> std::result::Result<bool, ApiError>;

    fn article_by_id(&self, article_id: i32) -> std::result::Result<Article, ApiError>;

    fn comment_count(&self, article_id: i32) -> std::result::Result<i64, ApiError>;

    /// Adds `delta` to the article's votes in a single statement.
    fn update_votes(&self, article_id: i32, delta: i32) -> std::result::Result<Article, ApiError>;

    fn search_articles(&self, term: &str) -> std::result::Result<Vec<Article>, ApiError>;

    /// Newest first.
    fn comments_for_article(&self, article_id: i32) -> std::result::Result<Vec<Comment>, ApiError>;

    fn insert_comment(&self, comment: &NewComment) -> std::result::Result<CreatedComment, ApiError>;

    fn delete_comment(&self, comment_id: i32) -> std::result::Result<usize, ApiError>;
}

pub type SharedStore = Arc<dyn Store>;

/// Runs blocking store work off the async executor.
pub async fn run<T, F>(store: &SharedStore, work: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce(&dyn Store) -> std::result::Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    rocket::tokio::task::spawn_blocking(move || work(&*store))
        .await
        .map_err(|e| {
            error!(error = %e, "store task did not complete");
            ApiError::Internal
        })?
}
