//! In-memory [`Store`] used by the HTTP tests.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use super::Store;
use crate::article::models::{Article, ArticleSummary};
use crate::article::query::{ArticleQuery, SortKey, SortOrder};
use crate::comment::{Comment, CreatedComment, NewComment};
use crate::topic::Topic;
use crate::types::ApiError;
use crate::users::models::User;

struct Tables {
    topics: Vec<Topic>,
    users: Vec<User>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    next_comment_id: i32,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn day(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

const ARTICLES: &[(&str, &str, &str, &str, (u32, u32), i32)] = &[
    ("Living in the shadow of a great man", "mitch", "butter_bridge", "I find this existence challenging", (7, 9), 100),
    ("Sony Vaio; or, The Laptop", "mitch", "icellusedkars", "Call me Mitchell.", (10, 16), 0),
    ("Eight pug gifs that remind me of mitch", "mitch", "icellusedkars", "some gifs", (11, 3), 0),
    ("Student SUES Mitch!", "mitch", "rogersop", "We all love Mitch and his wonderful work.", (5, 6), 0),
    ("UNCOVERED: catspiracy to bring down democracy", "cats", "rogersop", "Bastet walks amongst us, and the cats are taking arms!", (8, 3), 0),
    ("A", "mitch", "icellusedkars", "Delicious tin of cat food", (10, 18), 0),
    ("Z", "mitch", "icellusedkars", "I was hungry.", (1, 7), 0),
    ("Does Mitch predate civilisation?", "mitch", "icellusedkars", "Archaeologists have uncovered a gigantic statue.", (4, 17), 0),
    ("They're not exactly dogs, are they?", "mitch", "butter_bridge", "Well? Think about it.", (6, 6), 0),
    ("Seven inspirational thought leaders from Manchester UK", "mitch", "rogersop", "Who are we kidding, there is only one, and it's Mitch!", (5, 14), 0),
    ("Am I a cat?", "mitch", "icellusedkars", "Having run out of ideas, 100% of them.", (1, 15), 0),
    ("Moustache", "mitch", "butter_bridge", "Have you seen the size of that thing?", (10, 11), 0),
    ("Another article about Mitch", "mitch", "butter_bridge", "There will never be enough articles about Mitch!", (10, 11), 0),
];

const COMMENTS: &[(i32, &str, &str, i32, (u32, u32))] = &[
    (9, "butter_bridge", "Oh, I've got compassion running out of my nose, pal!", 16, (4, 6)),
    (1, "butter_bridge", "The beautiful thing about treasure is that it exists.", 14, (10, 31)),
    (1, "icellusedkars", "Replacing the quiet elegance of the dark suit and tie.", 100, (3, 1)),
    (1, "icellusedkars", "I carry a log.", -100, (2, 23)),
    (1, "icellusedkars", "I hate streaming noses", 0, (11, 3)),
    (1, "icellusedkars", "I hate streaming eyes even more", 0, (4, 11)),
    (1, "icellusedkars", "Lobster pot", 0, (5, 15)),
    (1, "icellusedkars", "Delicious crackerbreads", 0, (4, 14)),
    (1, "icellusedkars", "Superficially charming", 0, (1, 1)),
    (3, "icellusedkars", "git push origin master", 0, (6, 20)),
    (3, "icellusedkars", "Ambidextrous marsupial", 0, (9, 19)),
    (1, "icellusedkars", "Massive intercranial brain haemorrhage", 0, (3, 2)),
    (1, "icellusedkars", "Fruit pastilles", 0, (6, 15)),
    (1, "butter_bridge", "This morning, I showered for nine minutes.", 16, (7, 21)),
    (5, "icellusedkars", "I am 100% sure that we're not completely sure.", 1, (11, 3)),
    (5, "butter_bridge", "What do you see? I have no idea where this will lead us.", 16, (6, 9)),
    (6, "butter_bridge", "This is a bad article name", 1, (10, 11)),
    (9, "icellusedkars", "The owls are not what they seem.", 20, (3, 14)),
];

impl MemoryStore {
    pub fn empty() -> Self {
        MemoryStore {
            tables: Mutex::new(Tables {
                topics: Vec::new(),
                users: Vec::new(),
                articles: Vec::new(),
                comments: Vec::new(),
                next_comment_id: 1,
            }),
        }
    }

    /// Three topics, four users, thirteen articles (twelve about mitch) and
    /// eighteen comments.
    pub fn seeded() -> Self {
        let topics = [
            ("mitch", "The man, the Mitch, the legend"),
            ("cats", "Not dogs"),
            ("paper", "what books are made of"),
        ]
        .iter()
        .map(|(slug, description)| Topic {
            slug: slug.to_string(),
            description: Some(description.to_string()),
        })
        .collect();

        let users = [
            ("butter_bridge", "jonny"),
            ("icellusedkars", "sam"),
            ("rogersop", "paul"),
            ("lurker", "do_nothing"),
        ]
        .iter()
        .map(|(username, name)| User {
            username: username.to_string(),
            name: name.to_string(),
            avatar_url: Some(format!("https://avatars.example.com/{}.png", username)),
        })
        .collect();

        let articles = ARTICLES
            .iter()
            .enumerate()
            .map(|(i, (title, topic, author, body, (m, d), votes))| Article {
                article_id: i as i32 + 1,
                title: title.to_string(),
                topic: topic.to_string(),
                author: author.to_string(),
                body: body.to_string(),
                created_at: day(*m, *d),
                votes: *votes,
                article_img_url: Some(format!("https://images.example.com/articles/{}.jpg", i + 1)),
            })
            .collect();

        let comments: Vec<Comment> = COMMENTS
            .iter()
            .enumerate()
            .map(|(i, (article_id, author, body, votes, (m, d)))| Comment {
                comment_id: i as i32 + 1,
                article_id: *article_id,
                author: author.to_string(),
                body: body.to_string(),
                votes: *votes,
                created_at: day(*m, *d),
            })
            .collect();

        MemoryStore {
            tables: Mutex::new(Tables {
                topics,
                users,
                articles,
                next_comment_id: comments.len() as i32 + 1,
                comments,
            }),
        }
    }

    /// Copies of every row, in insertion order.
    pub fn rows(&self) -> Result<(Vec<Topic>, Vec<User>, Vec<Article>, Vec<Comment>), ApiError> {
        let tables = self.lock()?;
        Ok((
            tables.topics.clone(),
            tables.users.clone(),
            tables.articles.clone(),
            tables.comments.clone(),
        ))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, ApiError> {
        self.tables.lock().map_err(|_| ApiError::Internal)
    }
}

fn compare(key: SortKey, a: &ArticleSummary, b: &ArticleSummary) -> Ordering {
    match key {
        SortKey::Author => a.author.cmp(&b.author),
        SortKey::Title => a.title.cmp(&b.title),
        SortKey::Topic => a.topic.cmp(&b.topic),
        SortKey::ArticleId => a.article_id.cmp(&b.article_id),
        SortKey::CommentCount => a.comment_count.cmp(&b.comment_count),
        SortKey::ArticleImgUrl => a.article_img_url.cmp(&b.article_img_url),
        SortKey::Votes => a.votes.cmp(&b.votes),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

impl Store for MemoryStore {
    fn filter_articles(&self, query: &ArticleQuery) -> Result<(Vec<ArticleSummary>, Option<i64>), ApiError> {
        let tables = self.lock()?;
        let mut rows: Vec<ArticleSummary> = tables
            .articles
            .iter()
            .filter(|article| query.topic().map_or(true, |topic| article.topic == topic))
            .map(|article| ArticleSummary {
                author: article.author.clone(),
                title: article.title.clone(),
                article_id: article.article_id,
                topic: article.topic.clone(),
                created_at: article.created_at,
                votes: article.votes,
                article_img_url: article.article_img_url.clone(),
                comment_count: tables
                    .comments
                    .iter()
                    .filter(|comment| comment.article_id == article.article_id)
                    .count() as i32,
            })
            .collect();

        rows.sort_by(|a, b| {
            let primary = match query.order() {
                SortOrder::Asc => compare(query.sort_by(), a, b),
                SortOrder::Desc => compare(query.sort_by(), a, b).reverse(),
            };
            primary.then(a.article_id.cmp(&b.article_id))
        });

        let total = rows.len() as i64;
        let rows: Vec<ArticleSummary> = match query.limit() {
            Some(limit) => {
                let offset = query.offset()?.unwrap_or(0);
                rows.into_iter().skip(offset as usize).take(limit as usize).collect()
            }
            None => rows,
        };
        let window = if query.with_total_count() && !rows.is_empty() {
            Some(total)
        } else {
            None
        };
        Ok((rows, window))
    }

    fn topic_exists(&self, slug: &str) -> Result<bool, ApiError> {
        Ok(self.lock()?.topics.iter().any(|topic| topic.slug == slug))
    }

    fn topics(&self) -> Result<Vec<Topic>, ApiError> {
        let mut topics = self.lock()?.topics.clone();
        topics.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(topics)
    }

    fn users(&self) -> Result<Vec<User>, ApiError> {
        let mut users = self.lock()?.users.clone();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        Ok(self.lock()?.users.iter().any(|user| user.username == username))
    }

    fn article_by_id(&self, article_id: i32) -> Result<Article, ApiError> {
        self.lock()?
            .articles
            .iter()
            .find(|article| article.article_id == article_id)
            .cloned()
            .ok_or(ApiError::Diesel(DieselError::NotFound))
    }

    fn comment_count(&self, article_id: i32) -> Result<i64, ApiError> {
        let tables = self.lock()?;
        Ok(tables.comments.iter().filter(|c| c.article_id == article_id).count() as i64)
    }

    fn update_votes(&self, article_id: i32, delta: i32) -> Result<Article, ApiError> {
        let mut tables = self.lock()?;
        let article = tables
            .articles
            .iter_mut()
            .find(|article| article.article_id == article_id)
            .ok_or(ApiError::Diesel(DieselError::NotFound))?;
        article.votes += delta;
        Ok(article.clone())
    }

    fn search_articles(&self, term: &str) -> Result<Vec<Article>, ApiError> {
        let needle = term.to_lowercase();
        Ok(self
            .lock()?
            .articles
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle) || a.body.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    fn comments_for_article(&self, article_id: i32) -> Result<Vec<Comment>, ApiError> {
        let mut found: Vec<Comment> = self
            .lock()?
            .comments
            .iter()
            .filter(|comment| comment.article_id == article_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.comment_id.cmp(&a.comment_id)));
        Ok(found)
    }

    fn insert_comment(&self, comment: &NewComment) -> Result<CreatedComment, ApiError> {
        let mut tables = self.lock()?;
        if !tables.articles.iter().any(|a| a.article_id == comment.article_id) {
            return Err(ApiError::Diesel(DieselError::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                Box::new(String::from("comments_article_id_fkey")),
            )));
        }
        let comment_id = tables.next_comment_id;
        tables.next_comment_id += 1;
        tables.comments.push(Comment {
            comment_id,
            article_id: comment.article_id,
            author: comment.author.clone(),
            body: comment.body.clone(),
            votes: 0,
            created_at: Utc::now().naive_utc(),
        });
        Ok(CreatedComment {
            comment_id,
            article_id: comment.article_id,
            body: comment.body.clone(),
            username: comment.author.clone(),
        })
    }

    fn delete_comment(&self, comment_id: i32) -> Result<usize, ApiError> {
        let mut tables = self.lock()?;
        let before = tables.comments.len();
        tables.comments.retain(|comment| comment.comment_id != comment_id);
        Ok(before - tables.comments.len())
    }
}
