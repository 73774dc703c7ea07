use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Feed {
    pub id: String,
    pub name: String,
    pub url: String,
    pub user_id: String,
    pub last_fetched: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A feed joined with the name of the user who added it.
#[derive(Debug, Clone, FromRow)]
pub struct FeedWithCreator {
    pub name: String,
    pub url: String,
    pub user_name: String,
}

/// A follow row joined with the user and feed names.
#[derive(Debug, Clone, FromRow)]
pub struct FeedFollow {
    pub id: String,
    pub user_id: String,
    pub feed_id: String,
    pub user_name: String,
    pub feed_name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub feed_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert parameters for [`Database::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost<'a> {
    pub feed_id: &'a str,
    pub title: &'a str,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fixed-width RFC 3339 so that text order matches time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn now() -> String {
    format_timestamp(Utc::now())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feeds (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                last_fetched TEXT,
                last_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feed_follows (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                feed_id TEXT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, feed_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                description TEXT,
                published_at TEXT,
                feed_id TEXT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_feed_published
            ON posts(feed_id, published_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Users

    pub async fn create_user(&self, name: &str) -> Result<User> {
        let now = now();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new_id())
        .bind(name)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_insert(e, format!("user {}", name)))
    }

    pub async fn get_user(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Delete every user. Feeds, follows and posts go with them.
    pub async fn reset(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // Feeds

    pub async fn create_feed(&self, name: &str, url: &str, user_id: &str) -> Result<Feed> {
        let now = now();
        sqlx::query_as::<_, Feed>(
            r#"
            INSERT INTO feeds (id, name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new_id())
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_insert(e, format!("feed {}", url)))
    }

    pub async fn get_feeds(&self) -> Result<Vec<FeedWithCreator>> {
        let feeds = sqlx::query_as::<_, FeedWithCreator>(
            r#"
            SELECT feeds.name, feeds.url, users.name AS user_name
            FROM feeds
            JOIN users ON users.id = feeds.user_id
            ORDER BY feeds.created_at, feeds.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    pub async fn get_feed(&self, feed_id: &str) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>("SELECT * FROM feeds WHERE id = ?")
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>("SELECT * FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(feed)
    }

    /// The feed fetched longest ago, never-fetched feeds first.
    pub async fn get_next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT * FROM feeds
            ORDER BY last_fetched ASC NULLS FIRST, created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    pub async fn mark_feed_fetched(&self, feed_id: &str, error: Option<&str>) -> Result<()> {
        let now = now();
        sqlx::query(
            r#"
            UPDATE feeds
            SET last_fetched = ?, last_error = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&now)
        .bind(error)
        .bind(&now)
        .bind(feed_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // Follows

    pub async fn create_feed_follow(&self, user_id: &str, feed_id: &str) -> Result<FeedFollow> {
        let id = new_id();
        let now = now();
        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(feed_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::from_insert(e, "feed follow"))?;

        let follow = sqlx::query_as::<_, FeedFollow>(
            r#"
            SELECT feed_follows.*, users.name AS user_name, feeds.name AS feed_name
            FROM feed_follows
            JOIN users ON users.id = feed_follows.user_id
            JOIN feeds ON feeds.id = feed_follows.feed_id
            WHERE feed_follows.id = ?
            "#,
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;
        Ok(follow)
    }

    pub async fn get_feed_follows_for_user(&self, user_id: &str) -> Result<Vec<FeedFollow>> {
        let follows = sqlx::query_as::<_, FeedFollow>(
            r#"
            SELECT feed_follows.*, users.name AS user_name, feeds.name AS feed_name
            FROM feed_follows
            JOIN users ON users.id = feed_follows.user_id
            JOIN feeds ON feeds.id = feed_follows.feed_id
            WHERE feed_follows.user_id = ?
            ORDER BY feed_follows.created_at, feeds.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    /// Returns whether a follow was actually removed.
    pub async fn delete_feed_follow(&self, user_id: &str, feed_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Posts

    /// Insert a post. A post whose URL is already stored yields
    /// [`Error::AlreadyExists`].
    pub async fn create_post(&self, post: &NewPost<'_>) -> Result<Post> {
        let now = now();
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, url, description, published_at, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new_id())
        .bind(post.title)
        .bind(post.url)
        .bind(post.description)
        .bind(post.published_at.map(format_timestamp))
        .bind(post.feed_id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_insert(e, format!("post {}", post.url)))
    }

    /// Newest posts across every feed the user follows.
    pub async fn get_posts_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT posts.* FROM posts
            JOIN feed_follows ON feed_follows.feed_id = posts.feed_id
            WHERE feed_follows.user_id = ?
            ORDER BY posts.published_at DESC NULLS LAST, posts.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn get_post_count_for_feed(&self, feed_id: &str) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_db() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.initialize().await.unwrap();
        db
    }

    async fn create_user_with_feed(db: &Database) -> (User, Feed) {
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Example", "https://example.com/rss", &user.id)
            .await
            .unwrap();
        (user, feed)
    }

    fn new_post<'a>(feed_id: &'a str, url: &'a str) -> NewPost<'a> {
        NewPost {
            feed_id,
            title: "Title",
            url,
            description: None,
            published_at: None,
        }
    }

    // Database initialization tests
    mod initialization_tests {
        use super::*;

        #[tokio::test]
        async fn test_database_creation() {
            let db = Database::new("sqlite::memory:").await;
            assert!(db.is_ok());
        }

        #[tokio::test]
        async fn test_database_initialization() {
            let db = create_test_db().await;
            let users = db.get_users().await.unwrap();
            assert!(users.is_empty());
        }

        #[tokio::test]
        async fn test_double_initialization_is_safe() {
            let db = create_test_db().await;
            let result = db.initialize().await;
            assert!(result.is_ok());
        }
    }

    mod user_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_and_get_user() {
            let db = create_test_db().await;

            let created = db.create_user("alice").await.unwrap();
            let fetched = db.get_user("alice").await.unwrap();

            assert_eq!(fetched, Some(created));
        }

        #[tokio::test]
        async fn test_get_missing_user() {
            let db = create_test_db().await;
            assert!(db.get_user("nobody").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_duplicate_user_name() {
            let db = create_test_db().await;
            db.create_user("alice").await.unwrap();

            let result = db.create_user("alice").await;
            assert!(matches!(result, Err(Error::AlreadyExists(_))));
        }

        #[tokio::test]
        async fn test_get_users_in_creation_order() {
            let db = create_test_db().await;
            db.create_user("zed").await.unwrap();
            db.create_user("amy").await.unwrap();

            let names: Vec<_> = db
                .get_users()
                .await
                .unwrap()
                .into_iter()
                .map(|u| u.name)
                .collect();
            assert_eq!(names, vec!["zed", "amy"]);
        }

        #[tokio::test]
        async fn test_reset_cascades() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();
            db.create_post(&new_post(&feed.id, "https://example.com/1"))
                .await
                .unwrap();

            let deleted = db.reset().await.unwrap();

            assert_eq!(deleted, 1);
            assert!(db.get_users().await.unwrap().is_empty());
            assert!(db.get_feeds().await.unwrap().is_empty());
            assert!(db.get_feed(&feed.id).await.unwrap().is_none());
            assert_eq!(db.get_post_count_for_feed(&feed.id).await.unwrap(), 0);
        }
    }

    mod feed_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_feed() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;

            assert_eq!(feed.name, "Example");
            assert_eq!(feed.url, "https://example.com/rss");
            assert_eq!(feed.user_id, user.id);
            assert!(feed.last_fetched.is_none());
            assert!(feed.last_error.is_none());
        }

        #[tokio::test]
        async fn test_duplicate_feed_url() {
            let db = create_test_db().await;
            let (user, _) = create_user_with_feed(&db).await;

            let result = db
                .create_feed("Again", "https://example.com/rss", &user.id)
                .await;
            assert!(matches!(result, Err(Error::AlreadyExists(_))));
        }

        #[tokio::test]
        async fn test_feed_requires_existing_user() {
            let db = create_test_db().await;

            let result = db
                .create_feed("Orphan", "https://orphan.com/rss", "no-such-user")
                .await;
            assert!(matches!(result, Err(Error::Database(_))));
        }

        #[tokio::test]
        async fn test_get_feeds_with_creator() {
            let db = create_test_db().await;
            create_user_with_feed(&db).await;

            let feeds = db.get_feeds().await.unwrap();
            assert_eq!(feeds.len(), 1);
            assert_eq!(feeds[0].name, "Example");
            assert_eq!(feeds[0].url, "https://example.com/rss");
            assert_eq!(feeds[0].user_name, "alice");
        }

        #[tokio::test]
        async fn test_get_feed_by_url() {
            let db = create_test_db().await;
            let (_, feed) = create_user_with_feed(&db).await;

            let found = db.get_feed_by_url("https://example.com/rss").await.unwrap();
            assert_eq!(found.map(|f| f.id), Some(feed.id));

            let missing = db.get_feed_by_url("https://missing.com/rss").await.unwrap();
            assert!(missing.is_none());
        }
    }

    mod next_feed_tests {
        use super::*;

        #[tokio::test]
        async fn test_no_feeds() {
            let db = create_test_db().await;
            assert!(db.get_next_feed_to_fetch().await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_never_fetched_feed_comes_first() {
            let db = create_test_db().await;
            let user = db.create_user("alice").await.unwrap();
            let first = db
                .create_feed("First", "https://first.com/rss", &user.id)
                .await
                .unwrap();
            let second = db
                .create_feed("Second", "https://second.com/rss", &user.id)
                .await
                .unwrap();

            db.mark_feed_fetched(&first.id, None).await.unwrap();

            let next = db.get_next_feed_to_fetch().await.unwrap().unwrap();
            assert_eq!(next.id, second.id);
        }

        #[tokio::test]
        async fn test_oldest_fetch_comes_first() {
            let db = create_test_db().await;
            let user = db.create_user("alice").await.unwrap();
            let first = db
                .create_feed("First", "https://first.com/rss", &user.id)
                .await
                .unwrap();
            let second = db
                .create_feed("Second", "https://second.com/rss", &user.id)
                .await
                .unwrap();

            db.mark_feed_fetched(&second.id, None).await.unwrap();
            db.mark_feed_fetched(&first.id, None).await.unwrap();

            let next = db.get_next_feed_to_fetch().await.unwrap().unwrap();
            assert_eq!(next.id, second.id);
        }

        #[tokio::test]
        async fn test_mark_feed_fetched_with_error() {
            let db = create_test_db().await;
            let (_, feed) = create_user_with_feed(&db).await;

            db.mark_feed_fetched(&feed.id, Some("Connection refused"))
                .await
                .unwrap();

            let feed = db.get_feed(&feed.id).await.unwrap().unwrap();
            assert!(feed.last_fetched.is_some());
            assert_eq!(feed.last_error, Some("Connection refused".to_string()));
        }

        #[tokio::test]
        async fn test_successful_fetch_clears_error() {
            let db = create_test_db().await;
            let (_, feed) = create_user_with_feed(&db).await;

            db.mark_feed_fetched(&feed.id, Some("Error 1")).await.unwrap();
            db.mark_feed_fetched(&feed.id, None).await.unwrap();

            let feed = db.get_feed(&feed.id).await.unwrap().unwrap();
            assert!(feed.last_error.is_none());
        }
    }

    mod follow_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_feed_follow_joins_names() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;

            let follow = db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            assert_eq!(follow.user_name, "alice");
            assert_eq!(follow.feed_name, "Example");
            assert_eq!(follow.feed_id, feed.id);
        }

        #[tokio::test]
        async fn test_duplicate_follow() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            let result = db.create_feed_follow(&user.id, &feed.id).await;
            assert!(matches!(result, Err(Error::AlreadyExists(_))));
        }

        #[tokio::test]
        async fn test_follows_are_per_user() {
            let db = create_test_db().await;
            let (alice, feed) = create_user_with_feed(&db).await;
            let bob = db.create_user("bob").await.unwrap();
            db.create_feed_follow(&alice.id, &feed.id).await.unwrap();

            assert_eq!(db.get_feed_follows_for_user(&alice.id).await.unwrap().len(), 1);
            assert!(db.get_feed_follows_for_user(&bob.id).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_delete_feed_follow() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            assert!(db.delete_feed_follow(&user.id, &feed.id).await.unwrap());
            assert!(!db.delete_feed_follow(&user.id, &feed.id).await.unwrap());
            assert!(db.get_feed_follows_for_user(&user.id).await.unwrap().is_empty());
        }
    }

    mod post_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_post() {
            let db = create_test_db().await;
            let (_, feed) = create_user_with_feed(&db).await;
            let published = Utc::now();

            let post = db
                .create_post(&NewPost {
                    feed_id: &feed.id,
                    title: "Hello",
                    url: "https://example.com/hello",
                    description: Some("World"),
                    published_at: Some(published),
                })
                .await
                .unwrap();

            assert_eq!(post.title, "Hello");
            assert_eq!(post.description, Some("World".to_string()));
            assert_eq!(post.published_at, Some(format_timestamp(published)));
        }

        #[tokio::test]
        async fn test_duplicate_post_url() {
            let db = create_test_db().await;
            let (_, feed) = create_user_with_feed(&db).await;
            db.create_post(&new_post(&feed.id, "https://example.com/1"))
                .await
                .unwrap();

            let result = db
                .create_post(&new_post(&feed.id, "https://example.com/1"))
                .await;

            assert!(matches!(result, Err(Error::AlreadyExists(_))));
            assert_eq!(db.get_post_count_for_feed(&feed.id).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn test_posts_for_user_newest_first() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            for i in 1..=3 {
                let url = format!("https://example.com/{}", i);
                db.create_post(&NewPost {
                    published_at: Some(Utc::now() - chrono::Duration::hours(3 - i)),
                    ..new_post(&feed.id, &url)
                })
                .await
                .unwrap();
            }

            let posts = db.get_posts_for_user(&user.id, 10).await.unwrap();
            let urls: Vec<_> = posts.iter().map(|p| p.url.as_str()).collect();
            assert_eq!(
                urls,
                vec![
                    "https://example.com/3",
                    "https://example.com/2",
                    "https://example.com/1"
                ]
            );
        }

        #[tokio::test]
        async fn test_posts_without_date_sort_last() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            db.create_post(&new_post(&feed.id, "https://example.com/undated"))
                .await
                .unwrap();
            db.create_post(&NewPost {
                published_at: Some(Utc::now() - chrono::Duration::days(365)),
                ..new_post(&feed.id, "https://example.com/old")
            })
            .await
            .unwrap();

            let posts = db.get_posts_for_user(&user.id, 10).await.unwrap();
            assert_eq!(posts[0].url, "https://example.com/old");
            assert_eq!(posts[1].url, "https://example.com/undated");
        }

        #[tokio::test]
        async fn test_posts_only_from_followed_feeds() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            let other = db
                .create_feed("Other", "https://other.com/rss", &user.id)
                .await
                .unwrap();
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            db.create_post(&new_post(&feed.id, "https://example.com/1"))
                .await
                .unwrap();
            db.create_post(&new_post(&other.id, "https://other.com/1"))
                .await
                .unwrap();

            let posts = db.get_posts_for_user(&user.id, 10).await.unwrap();
            assert_eq!(posts.len(), 1);
            assert_eq!(posts[0].url, "https://example.com/1");
        }

        #[tokio::test]
        async fn test_posts_respect_limit() {
            let db = create_test_db().await;
            let (user, feed) = create_user_with_feed(&db).await;
            db.create_feed_follow(&user.id, &feed.id).await.unwrap();

            for i in 1..=5 {
                let url = format!("https://example.com/{}", i);
                db.create_post(&new_post(&feed.id, &url)).await.unwrap();
            }

            let posts = db.get_posts_for_user(&user.id, 2).await.unwrap();
            assert_eq!(posts.len(), 2);
        }
    }
}
