use rusqlite::{Connection, OptionalExtension, Row};

use chirpdeck_types::Like;

use super::error::RepositoryResult;
use crate::db::{timestamp, Database, DbPool, DbSchema};

/// How many likes the global feed returns
pub const RECENT_LIKES_LIMIT: i64 = 100;

/// A like about to be recorded by the engagement simulator
#[derive(Debug, Clone, Copy)]
pub struct NewLike {
    pub post_id: i64,
    pub account_id: i64,
    pub is_mutual: bool,
    pub delay_minutes: i64,
}

pub struct LikeRepository {
    pool: DbPool,
    schema: DbSchema,
}

impl LikeRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            schema: db.schema.clone(),
        }
    }

    /// Likes on one post with the liking account, oldest first
    pub fn list_for_post(&self, post_id: i64) -> RepositoryResult<Vec<Like>> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(
            "SELECT l.id, l.post_id, l.account_id, l.liked_at, l.is_mutual, l.delay_minutes,
                    a.username, a.avatar_url, NULL
             FROM {schema}.likes l
             JOIN {schema}.accounts a ON l.account_id = a.id
             WHERE l.post_id = ?1
             ORDER BY l.liked_at ASC, l.id ASC",
        );
        let mut stmt = conn.prepare(&sql)?;

        let likes = stmt
            .query_map([post_id], map_like)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(likes)
    }

    /// Most recent likes across all posts, with the post content
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<Like>> {
        let conn = self.pool.get()?;
        let sql = self.schema.render(
            "SELECT l.id, l.post_id, l.account_id, l.liked_at, l.is_mutual, l.delay_minutes,
                    a.username, a.avatar_url, p.content
             FROM {schema}.likes l
             JOIN {schema}.accounts a ON l.account_id = a.id
             JOIN {schema}.posts p ON l.post_id = p.id
             ORDER BY l.liked_at DESC, l.id DESC
             LIMIT ?1",
        );
        let mut stmt = conn.prepare(&sql)?;

        let likes = stmt
            .query_map([limit], map_like)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(likes)
    }

    /// Owner of a post: `None` if the post does not exist, `Some(None)` if it has no owner
    pub fn post_owner(
        conn: &Connection,
        schema: &DbSchema,
        post_id: i64,
    ) -> rusqlite::Result<Option<Option<i64>>> {
        let sql = schema.render("SELECT account_id FROM {schema}.posts WHERE id = ?1");
        conn.query_row(&sql, [post_id], |row| row.get(0)).optional()
    }

    /// Up to `count` distinct active accounts other than `exclude`, in random order
    pub fn pick_active_accounts(
        conn: &Connection,
        schema: &DbSchema,
        exclude: Option<i64>,
        count: i64,
    ) -> rusqlite::Result<Vec<i64>> {
        let sql = schema.render(
            "SELECT id FROM {schema}.accounts
             WHERE is_active = 1 AND (?1 IS NULL OR id != ?1)
             ORDER BY RANDOM()
             LIMIT ?2",
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map((exclude, count), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Record a like unless the (post, account) pair already has one.
    ///
    /// Returns `None` when the pair existed; the unique index decides.
    pub fn insert_if_absent(
        conn: &Connection,
        schema: &DbSchema,
        like: &NewLike,
    ) -> rusqlite::Result<Option<Like>> {
        let sql = schema.render(
            "INSERT INTO {schema}.likes (post_id, account_id, liked_at, is_mutual, delay_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (post_id, account_id) DO NOTHING
             RETURNING id, post_id, account_id, liked_at, is_mutual, delay_minutes,
                       NULL, NULL, NULL",
        );
        conn.query_row(
            &sql,
            (
                like.post_id,
                like.account_id,
                timestamp::now(),
                like.is_mutual,
                like.delay_minutes,
            ),
            map_like,
        )
        .optional()
    }
}

fn map_like(row: &Row<'_>) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        post_id: row.get(1)?,
        account_id: row.get(2)?,
        liked_at: timestamp::from_db(3, &row.get::<_, String>(3)?)?,
        is_mutual: row.get(4)?,
        delay_minutes: row.get(5)?,
        username: row.get(6)?,
        avatar_url: row.get(7)?,
        post_content: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AccountRepository, NewPost, PostRepository};
    use chrono::Utc;

    struct Fixture {
        db: Database,
        post_id: i64,
        owner_id: i64,
        other_ids: Vec<i64>,
    }

    fn setup(others: usize) -> Fixture {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        let accounts = AccountRepository::new(&db);
        let owner = accounts.create("owner", "tok", None).unwrap();
        let other_ids = (0..others)
            .map(|i| accounts.create(&format!("liker{}", i), "tok", None).unwrap().id)
            .collect();
        let post = PostRepository::new(&db)
            .create(&NewPost {
                account_id: Some(owner.id),
                content: "hello".to_string(),
                video_url: None,
                video_name: None,
                scheduled_time: Utc::now(),
            })
            .unwrap();

        Fixture {
            db,
            post_id: post.id,
            owner_id: owner.id,
            other_ids,
        }
    }

    #[test]
    fn test_insert_if_absent_skips_existing_pair() {
        let fx = setup(1);
        let conn = fx.db.connection().unwrap();
        let like = NewLike {
            post_id: fx.post_id,
            account_id: fx.other_ids[0],
            is_mutual: true,
            delay_minutes: 7,
        };

        let first = LikeRepository::insert_if_absent(&conn, &fx.db.schema, &like).unwrap();
        assert!(first.is_some());
        let second = LikeRepository::insert_if_absent(&conn, &fx.db.schema, &like).unwrap();
        assert!(second.is_none());

        let stored = LikeRepository::new(&fx.db).list_for_post(fx.post_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].delay_minutes, 7);
        assert_eq!(stored[0].username.as_deref(), Some("liker0"));
    }

    #[test]
    fn test_pick_excludes_owner_and_inactive() {
        let fx = setup(3);
        AccountRepository::new(&fx.db)
            .set_active(fx.other_ids[0], false)
            .unwrap();
        let conn = fx.db.connection().unwrap();

        let picked =
            LikeRepository::pick_active_accounts(&conn, &fx.db.schema, Some(fx.owner_id), 10)
                .unwrap();
        assert_eq!(picked.len(), 2);
        assert!(!picked.contains(&fx.owner_id));
        assert!(!picked.contains(&fx.other_ids[0]));
    }

    #[test]
    fn test_post_owner_lookup() {
        let fx = setup(0);
        let conn = fx.db.connection().unwrap();
        assert_eq!(
            LikeRepository::post_owner(&conn, &fx.db.schema, fx.post_id).unwrap(),
            Some(Some(fx.owner_id))
        );
        assert_eq!(
            LikeRepository::post_owner(&conn, &fx.db.schema, 999).unwrap(),
            None
        );
    }

    #[test]
    fn test_list_recent_includes_post_content() {
        let fx = setup(2);
        let conn = fx.db.connection().unwrap();
        for account_id in &fx.other_ids {
            let like = NewLike {
                post_id: fx.post_id,
                account_id: *account_id,
                is_mutual: false,
                delay_minutes: 5,
            };
            LikeRepository::insert_if_absent(&conn, &fx.db.schema, &like).unwrap();
        }
        drop(conn);

        let recent = LikeRepository::new(&fx.db).list_recent(RECENT_LIKES_LIMIT).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|l| l.post_content.as_deref() == Some("hello")));
        assert!(recent.iter().all(|l| !l.is_mutual));

        let limited = LikeRepository::new(&fx.db).list_recent(1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
