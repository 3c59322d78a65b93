use diesel::dsl::exists;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::{BigInt, Text};
use diesel::{delete, insert_into, select, sql_query, update};
use tracing::debug;

use super::schema::{articles, comments, topics, users};
use super::{Pool, Store};
use crate::article::models::{Article, ArticleSummary, CountedArticleSummary};
use crate::article::query::{ArticleQuery, SqlBind};
use crate::comment::{Comment, CreatedComment, NewComment};
use crate::topic::Topic;
use crate::types::ApiError;
use crate::users::models::User;
use crate::utils::like_pattern;

/// [`Store`] backed by PostgreSQL.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        PgStore { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, ApiError> {
        Ok(self.pool.get()?)
    }
}

impl Store for PgStore {
    fn filter_articles(&self, query: &ArticleQuery) -> Result<(Vec<ArticleSummary>, Option<i64>), ApiError> {
        let (sql, binds) = query.to_sql()?;
        debug!(%sql, binds = ?binds, "filtering articles");
        let mut statement = sql_query(sql).into_boxed::<Pg>();
        for bind in binds {
            statement = match bind {
                SqlBind::Text(value) => statement.bind::<Text, _>(value),
                SqlBind::BigInt(value) => statement.bind::<BigInt, _>(value),
            };
        }

        let mut conn = self.conn()?;
        if query.with_total_count() {
            let rows = statement.load::<CountedArticleSummary>(&mut conn)?;
            let total = rows.first().map(|row| row.total_count);
            let articles = rows.into_iter().map(|row| row.article).collect();
            Ok((articles, total))
        } else {
            Ok((statement.load::<ArticleSummary>(&mut conn)?, None))
        }
    }

    fn topic_exists(&self, slug: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn()?;
        let found = select(exists(topics::table.filter(topics::slug.eq(slug)))).get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn topics(&self) -> Result<Vec<Topic>, ApiError> {
        let mut conn = self.conn()?;
        let topics = topics::table
            .select(Topic::as_select())
            .order(topics::slug.asc())
            .load(&mut conn)?;
        Ok(topics)
    }

    fn users(&self) -> Result<Vec<User>, ApiError> {
        let mut conn = self.conn()?;
        let users = users::table
            .select(User::as_select())
            .order(users::username.asc())
            .load(&mut conn)?;
        Ok(users)
    }

    fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn()?;
        let found =
            select(exists(users::table.filter(users::username.eq(username)))).get_result::<bool>(&mut conn)?;
        Ok(found)
    }

    fn article_by_id(&self, article_id: i32) -> Result<Article, ApiError> {
        let mut conn = self.conn()?;
        articles::table
            .find(article_id)
            .select(Article::as_select())
            .first(&mut conn)
            .map_err(|e| e.into())
    }

    fn comment_count(&self, article_id: i32) -> Result<i64, ApiError> {
        let mut conn = self.conn()?;
        let count = comments::table
            .filter(comments::article_id.eq(article_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count)
    }

    fn update_votes(&self, article_id: i32, delta: i32) -> Result<Article, ApiError> {
        let mut conn = self.conn()?;
        debug!(article_id, delta, "updating votes");
        update(articles::table.find(article_id))
            .set(articles::votes.eq(articles::votes + delta))
            .returning(Article::as_returning())
            .get_result(&mut conn)
            .map_err(|e| e.into())
    }

    fn search_articles(&self, term: &str) -> Result<Vec<Article>, ApiError> {
        let mut conn = self.conn()?;
        let pattern = like_pattern(term);
        let found = articles::table
            .filter(articles::title.ilike(pattern.as_str()).or(articles::body.ilike(pattern.as_str())))
            .select(Article::as_select())
            .order(articles::article_id.asc())
            .load(&mut conn)?;
        Ok(found)
    }

    fn comments_for_article(&self, article_id: i32) -> Result<Vec<Comment>, ApiError> {
        let mut conn = self.conn()?;
        let found = comments::table
            .filter(comments::article_id.eq(article_id))
            .select(Comment::as_select())
            .order((comments::created_at.desc(), comments::comment_id.desc()))
            .load(&mut conn)?;
        Ok(found)
    }

    fn insert_comment(&self, comment: &NewComment) -> Result<CreatedComment, ApiError> {
        let mut conn = self.conn()?;
        let created = insert_into(comments::table)
            .values(comment)
            .returning((
                comments::comment_id,
                comments::article_id,
                comments::body,
                comments::author,
            ))
            .get_result::<CreatedComment>(&mut conn)?;
        Ok(created)
    }

    fn delete_comment(&self, comment_id: i32) -> Result<usize, ApiError> {
        let mut conn = self.conn()?;
        let deleted = delete(comments::table.find(comment_id)).execute(&mut conn)?;
        Ok(deleted)
    }
}
