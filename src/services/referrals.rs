use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entities::prelude::*;
use crate::db::entities::referral;
use crate::error::Result;

/// Records and reads the referrer -> referred graph. Edges are written once
/// at registration and never mutated; duplicates are rejected by the store's
/// unique constraint on the referred user.
pub struct ReferralGraphService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ReferralGraphService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record(&self, referrer_id: i64, referred_id: i64) -> Result<referral::Model> {
        let edge = referral::ActiveModel {
            referrer_id: Set(referrer_id),
            referred_id: Set(referred_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let edge = edge.insert(self.db).await?;
        tracing::info!(referrer_id, referred_id, "Recorded referral edge");
        Ok(edge)
    }

    /// Usernames of the users referred by `referrer_id`, in edge-creation
    /// order. An empty list is a valid, non-error result.
    pub async fn list_referrals(&self, referrer_id: i64) -> Result<Vec<String>> {
        let rows = Referral::find()
            .filter(referral::Column::ReferrerId.eq(referrer_id))
            .order_by_asc(referral::Column::Id)
            .find_also_related(User)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, referred)| referred.map(|u| u.username))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_helpers::{create_test_db, create_test_user};

    #[tokio::test]
    async fn test_record_and_list() {
        let db = create_test_db().await;
        let referrer = create_test_user(&db, "katana", "katana@example.com", "nevermore").await;
        let first = create_test_user(&db, "first", "first@example.com", "pw").await;
        let second = create_test_user(&db, "second", "second@example.com", "pw").await;

        let service = ReferralGraphService::new(&db);
        service.record(referrer.id, first.id).await.unwrap();
        service.record(referrer.id, second.id).await.unwrap();

        let referrals = service.list_referrals(referrer.id).await.unwrap();
        assert_eq!(referrals, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_list_scoped_to_referrer() {
        let db = create_test_db().await;
        let alice = create_test_user(&db, "alice", "alice@example.com", "pw").await;
        let bob = create_test_user(&db, "bob", "bob@example.com", "pw").await;
        let one = create_test_user(&db, "one", "one@example.com", "pw").await;
        let two = create_test_user(&db, "two", "two@example.com", "pw").await;

        let service = ReferralGraphService::new(&db);
        service.record(alice.id, one.id).await.unwrap();
        service.record(bob.id, two.id).await.unwrap();

        assert_eq!(
            service.list_referrals(alice.id).await.unwrap(),
            vec!["one".to_string()]
        );
        assert_eq!(
            service.list_referrals(bob.id).await.unwrap(),
            vec!["two".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_list_is_not_an_error() {
        let db = create_test_db().await;
        let user = create_test_user(&db, "katana", "katana@example.com", "nevermore").await;

        let referrals = ReferralGraphService::new(&db)
            .list_referrals(user.id)
            .await
            .unwrap();
        assert!(referrals.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_referred_user_rejected_by_store() {
        let db = create_test_db().await;
        let a = create_test_user(&db, "a", "a@example.com", "pw").await;
        let b = create_test_user(&db, "b", "b@example.com", "pw").await;
        let c = create_test_user(&db, "c", "c@example.com", "pw").await;

        let service = ReferralGraphService::new(&db);
        service.record(a.id, c.id).await.unwrap();

        // A user is referred by exactly zero or one referrer.
        let err = service.record(b.id, c.id).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
