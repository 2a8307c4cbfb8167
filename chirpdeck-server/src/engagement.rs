//! Simulated engagement: fan a post out to a random set of other active
//! accounts and record one like per selected account.

use rand::Rng;
use rusqlite::TransactionBehavior;
use std::ops::RangeInclusive;

use chirpdeck_types::Like;

use crate::db::repositories::{LikeRepository, NewLike, RepositoryError, RepositoryResult};
use crate::db::Database;

pub const DEFAULT_LIKES_COUNT: i64 = 2;

/// Minutes of simulated delay attached to each like
pub const DELAY_MINUTES: RangeInclusive<i64> = 5..=15;

pub struct EngagementSimulator {
    db: Database,
}

impl EngagementSimulator {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Like `post_id` from up to `count` random active accounts other than its owner
    pub fn simulate(&self, post_id: i64, count: i64, mutual: bool) -> RepositoryResult<Vec<Like>> {
        self.simulate_with_rng(post_id, count, mutual, &mut rand::thread_rng())
    }

    /// Same as [`simulate`](Self::simulate) with a caller-supplied delay source.
    ///
    /// Fewer eligible accounts than `count` yields fewer likes. Accounts that
    /// already liked the post are skipped and do not appear in the result.
    pub fn simulate_with_rng<R: Rng>(
        &self,
        post_id: i64,
        count: i64,
        mutual: bool,
        rng: &mut R,
    ) -> RepositoryResult<Vec<Like>> {
        if count < 0 {
            return Err(RepositoryError::Validation(
                "likesCount must not be negative".to_string(),
            ));
        }

        let mut conn = self.db.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let schema = &self.db.schema;

        let owner = LikeRepository::post_owner(&tx, schema, post_id)?
            .ok_or_else(|| RepositoryError::NotFound("Post not found".to_string()))?;

        let selected = LikeRepository::pick_active_accounts(&tx, schema, owner, count)?;

        let mut created = Vec::with_capacity(selected.len());
        for account_id in selected {
            let like = NewLike {
                post_id,
                account_id,
                is_mutual: mutual,
                delay_minutes: rng.gen_range(DELAY_MINUTES),
            };
            match LikeRepository::insert_if_absent(&tx, schema, &like)? {
                Some(like) => created.push(like),
                None => tracing::debug!(
                    "Account {} already liked post {}, skipping",
                    account_id,
                    post_id
                ),
            }
        }

        tx.commit()?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AccountRepository, NewPost, PostRepository};
    use chrono::Utc;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    struct Fixture {
        db: Database,
        post_id: i64,
        owner_id: i64,
        liker_ids: Vec<i64>,
    }

    fn setup(likers: usize, owned: bool) -> Fixture {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        let accounts = AccountRepository::new(&db);
        let owner = accounts.create("owner", "tok", None).unwrap();
        let liker_ids = (0..likers)
            .map(|i| accounts.create(&format!("liker{}", i), "tok", None).unwrap().id)
            .collect();
        let post = PostRepository::new(&db)
            .create(&NewPost {
                account_id: owned.then_some(owner.id),
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
            liker_ids,
        }
    }

    #[test]
    fn test_returns_exactly_count_when_enough_accounts() {
        let fx = setup(10, true);
        let likes = EngagementSimulator::new(&fx.db)
            .simulate(fx.post_id, 3, true)
            .unwrap();

        assert_eq!(likes.len(), 3);
        let distinct: HashSet<i64> = likes.iter().map(|l| l.account_id).collect();
        assert_eq!(distinct.len(), 3);
        assert!(likes.iter().all(|l| l.account_id != fx.owner_id));
        assert!(likes.iter().all(|l| l.is_mutual));
        assert!(likes.iter().all(|l| DELAY_MINUTES.contains(&l.delay_minutes)));
    }

    #[test]
    fn test_returns_fewer_when_pool_is_small() {
        let fx = setup(2, true);
        let likes = EngagementSimulator::new(&fx.db)
            .simulate(fx.post_id, 5, false)
            .unwrap();

        assert_eq!(likes.len(), 2);
        assert!(likes.iter().all(|l| !l.is_mutual));
    }

    #[test]
    fn test_inactive_accounts_never_selected() {
        let fx = setup(4, true);
        let accounts = AccountRepository::new(&fx.db);
        accounts.set_active(fx.liker_ids[0], false).unwrap();
        accounts.set_active(fx.liker_ids[1], false).unwrap();

        let likes = EngagementSimulator::new(&fx.db)
            .simulate(fx.post_id, 10, true)
            .unwrap();
        let ids: HashSet<i64> = likes.iter().map(|l| l.account_id).collect();
        assert_eq!(ids, HashSet::from([fx.liker_ids[2], fx.liker_ids[3]]));
    }

    #[test]
    fn test_repeat_simulation_never_duplicates_pairs() {
        let fx = setup(3, true);
        let simulator = EngagementSimulator::new(&fx.db);

        let first = simulator.simulate(fx.post_id, 3, true).unwrap();
        assert_eq!(first.len(), 3);

        // Every eligible account has already liked the post
        let second = simulator.simulate(fx.post_id, 3, true).unwrap();
        assert!(second.is_empty());

        let stored = LikeRepository::new(&fx.db).list_for_post(fx.post_id).unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[test]
    fn test_ownerless_post_can_be_liked_by_anyone_active() {
        let fx = setup(2, false);
        let likes = EngagementSimulator::new(&fx.db)
            .simulate(fx.post_id, 10, true)
            .unwrap();
        // owner account is just another active account here
        assert_eq!(likes.len(), 3);
    }

    #[test]
    fn test_missing_post_and_negative_count() {
        let fx = setup(1, true);
        let simulator = EngagementSimulator::new(&fx.db);

        assert!(matches!(
            simulator.simulate(999, 2, true),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            simulator.simulate(fx.post_id, -1, true),
            Err(RepositoryError::Validation(_))
        ));
        assert!(simulator.simulate(fx.post_id, 0, true).unwrap().is_empty());
    }

    #[test]
    fn test_seeded_delays_stay_in_range() {
        let fx = setup(10, true);
        let mut rng = StdRng::seed_from_u64(7);
        let likes = EngagementSimulator::new(&fx.db)
            .simulate_with_rng(fx.post_id, 10, true, &mut rng)
            .unwrap();

        assert_eq!(likes.len(), 10);
        assert!(likes.iter().all(|l| (5..=15).contains(&l.delay_minutes)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_count_is_min_of_requested_and_eligible(
            eligible in 0usize..6,
            requested in 0i64..8,
        ) {
            let fx = setup(eligible, true);
            let likes = EngagementSimulator::new(&fx.db)
                .simulate(fx.post_id, requested, true)
                .unwrap();
            prop_assert_eq!(likes.len() as i64, requested.min(eligible as i64));
        }
    }
}
