use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use chirpdeck_types::{Post, PostStatus};

use super::account_repository::fetch_account;
use super::error::{RepositoryError, RepositoryResult};
use crate::db::{timestamp, Database, DbPool, DbSchema};

/// Post columns joined with the owner's username and a derived like count
const POST_SELECT: &str =
    "SELECT p.id, p.account_id, a.username, p.content, p.video_url, p.video_name,
            p.scheduled_time, p.published_at, p.status, p.twitter_post_id,
            (SELECT COUNT(*) FROM {schema}.likes l WHERE l.post_id = p.id) AS likes_count,
            p.created_at, p.updated_at
     FROM {schema}.posts p
     LEFT JOIN {schema}.accounts a ON p.account_id = a.id";

/// Fields supplied when scheduling a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub account_id: Option<i64>,
    pub content: String,
    pub video_url: Option<String>,
    pub video_name: Option<String>,
    pub scheduled_time: DateTime<Utc>,
}

pub struct PostRepository {
    pool: DbPool,
    schema: DbSchema,
}

impl PostRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            schema: db.schema.clone(),
        }
    }

    /// All posts, latest scheduled time first
    pub fn list(&self) -> RepositoryResult<Vec<Post>> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(&format!(
            "{} ORDER BY p.scheduled_time DESC, p.id DESC",
            POST_SELECT
        ));
        let mut stmt = conn.prepare(&sql)?;

        let posts = stmt
            .query_map([], map_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Get a single post by ID
    pub fn get(&self, post_id: i64) -> RepositoryResult<Option<Post>> {
        let conn = self.pool.get()?;
        Ok(fetch_post(&conn, &self.schema, post_id)?)
    }

    /// Schedule a new post
    pub fn create(&self, new_post: &NewPost) -> RepositoryResult<Post> {
        if new_post.content.trim().is_empty() {
            return Err(RepositoryError::Validation(
                "Content and scheduledTime are required".to_string(),
            ));
        }

        let conn = self.pool.get()?;

        if let Some(account_id) = new_post.account_id {
            if fetch_account(&conn, &self.schema, account_id)?.is_none() {
                return Err(RepositoryError::NotFound("Account not found".to_string()));
            }
        }

        let now = timestamp::now();
        let sql = self.schema.render(
            "INSERT INTO {schema}.posts
                (account_id, content, video_url, video_name, scheduled_time, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        );
        conn.execute(
            &sql,
            (
                new_post.account_id,
                &new_post.content,
                blank_to_none(new_post.video_url.as_deref()),
                blank_to_none(new_post.video_name.as_deref()),
                timestamp::to_db(&new_post.scheduled_time),
                PostStatus::Scheduled.as_str(),
                &now,
            ),
        )?;

        let post_id = conn.last_insert_rowid();
        fetch_post(&conn, &self.schema, post_id)?
            .ok_or_else(|| RepositoryError::NotFound("Post not found".to_string()))
    }

    /// Move a post to `status`.
    ///
    /// Publishing stamps `published_at` with the current time; any other
    /// status clears it. The external post id is replaced by the given value.
    pub fn update_status(
        &self,
        post_id: i64,
        status: PostStatus,
        twitter_post_id: Option<&str>,
    ) -> RepositoryResult<Post> {
        let conn = self.pool.get()?;
        let now = timestamp::now();
        let published_at = status.is_published().then(|| now.clone());

        let sql = self.schema.render(
            "UPDATE {schema}.posts
             SET status = ?1, twitter_post_id = ?2, published_at = ?3, updated_at = ?4
             WHERE id = ?5",
        );
        let changed = conn.execute(
            &sql,
            (
                status.as_str(),
                blank_to_none(twitter_post_id),
                published_at,
                &now,
                post_id,
            ),
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound("Post not found".to_string()));
        }

        fetch_post(&conn, &self.schema, post_id)?
            .ok_or_else(|| RepositoryError::NotFound("Post not found".to_string()))
    }
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn fetch_post(conn: &Connection, schema: &DbSchema, post_id: i64) -> rusqlite::Result<Option<Post>> {
    let sql = schema.render(&format!("{} WHERE p.id = ?1", POST_SELECT));
    conn.query_row(&sql, [post_id], map_post).optional()
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let status: String = row.get(8)?;
    Ok(Post {
        id: row.get(0)?,
        account_id: row.get(1)?,
        account_username: row.get(2)?,
        content: row.get(3)?,
        video_url: row.get(4)?,
        video_name: row.get(5)?,
        scheduled_time: timestamp::from_db(6, &row.get::<_, String>(6)?)?,
        published_at: timestamp::optional_from_db(7, row.get(7)?)?,
        // The CHECK constraint keeps unknown values out
        status: PostStatus::parse(&status).unwrap_or_default(),
        twitter_post_id: row.get(9)?,
        likes_count: row.get(10)?,
        created_at: timestamp::from_db(11, &row.get::<_, String>(11)?)?,
        updated_at: timestamp::from_db(12, &row.get::<_, String>(12)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::AccountRepository;
    use chrono::{Duration, TimeZone};

    fn setup() -> (Database, PostRepository) {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        let repo = PostRepository::new(&db);
        (db, repo)
    }

    fn new_post(account_id: Option<i64>, content: &str, scheduled_time: DateTime<Utc>) -> NewPost {
        NewPost {
            account_id,
            content: content.to_string(),
            video_url: None,
            video_name: None,
            scheduled_time,
        }
    }

    #[test]
    fn test_create_post_starts_scheduled() {
        let (db, repo) = setup();
        let account = AccountRepository::new(&db).create("owner", "tok", None).unwrap();
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let mut input = new_post(Some(account.id), "Launch day", when);
        input.video_url = Some("https://cdn.example/v.mp4".to_string());
        input.video_name = Some("  ".to_string());
        let post = repo.create(&input).expect("Failed to create post");

        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.scheduled_time, when);
        assert_eq!(post.account_username.as_deref(), Some("owner"));
        assert_eq!(post.video_url.as_deref(), Some("https://cdn.example/v.mp4"));
        assert!(post.video_name.is_none());
        assert!(post.published_at.is_none());
        assert_eq!(post.likes_count, 0);
    }

    #[test]
    fn test_create_rejects_blank_content_and_unknown_account() {
        let (_db, repo) = setup();
        let when = Utc::now();

        assert!(matches!(
            repo.create(&new_post(None, "   ", when)),
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.create(&new_post(Some(42), "hello", when)),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_orders_by_scheduled_time_desc() {
        let (_db, repo) = setup();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        repo.create(&new_post(None, "middle", base)).unwrap();
        repo.create(&new_post(None, "latest", base + Duration::hours(2))).unwrap();
        repo.create(&new_post(None, "earliest", base - Duration::hours(2))).unwrap();

        let contents: Vec<String> = repo.list().unwrap().into_iter().map(|p| p.content).collect();
        assert_eq!(contents, vec!["latest", "middle", "earliest"]);
    }

    #[test]
    fn test_published_stamps_and_other_status_clears() {
        let (_db, repo) = setup();
        let post = repo.create(&new_post(None, "hello", Utc::now())).unwrap();

        let published = repo
            .update_status(post.id, PostStatus::Published, Some("1790000000000000000"))
            .unwrap();
        assert_eq!(published.status, PostStatus::Published);
        assert!(published.published_at.is_some());
        assert_eq!(published.twitter_post_id.as_deref(), Some("1790000000000000000"));

        let reverted = repo.update_status(post.id, PostStatus::Draft, None).unwrap();
        assert_eq!(reverted.status, PostStatus::Draft);
        assert!(reverted.published_at.is_none());
        assert!(reverted.twitter_post_id.is_none());
    }

    #[test]
    fn test_update_status_missing_post() {
        let (_db, repo) = setup();
        assert!(matches!(
            repo.update_status(404, PostStatus::Published, None),
            Err(RepositoryError::NotFound(_))
        ));
    }
}
