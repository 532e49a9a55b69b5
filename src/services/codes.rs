use chrono::{NaiveDate, Utc};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::db::entities::prelude::*;
use crate::db::entities::{referral_code, user};
use crate::error::{AppError, Result};
use crate::services::dates::normalize_date;

/// Referral tokens are 20 uppercase-alphanumeric characters.
pub const CODE_LENGTH: usize = 20;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Collisions against the unique token index are retried with a fresh token.
const MAX_GENERATE_ATTEMPTS: u32 = 5;

/// Generate a random referral token. Uniqueness is enforced by the store,
/// not the generator.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}

/// Owns the referral code lifecycle: at most one active code per user at any
/// observable instant, expiry validation before any row is touched, logical
/// deletes only.
pub struct ReferralCodeService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ReferralCodeService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new active code for the user, superseding any current one.
    ///
    /// The expiry input is validated before any row is mutated: a rejected
    /// request leaves the previously active code active and inserts nothing.
    /// An expiry equal to the current date counts as expired.
    pub async fn create(
        &self,
        user_id: i64,
        expiry_input: Option<&str>,
    ) -> Result<referral_code::Model> {
        let input = expiry_input
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AppError::MissingExpiryDate)?;

        let expiry = normalize_date(input)?;

        let today = Utc::now().date_naive();
        if expiry <= today {
            return Err(AppError::ExpiredExpiryDate);
        }

        self.insert_active(user_id, expiry).await
    }

    /// Deactivate-old plus insert-new as one transaction, so no intermediate
    /// state with zero or two active codes is observable.
    async fn insert_active(
        &self,
        user_id: i64,
        expiry: NaiveDate,
    ) -> Result<referral_code::Model> {
        for attempt in 1..=MAX_GENERATE_ATTEMPTS {
            let code = generate_code();
            let txn = self.db.begin().await?;

            ReferralCode::update_many()
                .col_expr(referral_code::Column::IsActive, Expr::value(false))
                .filter(referral_code::Column::UserId.eq(user_id))
                .filter(referral_code::Column::IsActive.eq(true))
                .exec(&txn)
                .await?;

            let new_code = referral_code::ActiveModel {
                user_id: Set(user_id),
                code: Set(code),
                expiry_date: Set(expiry),
                is_active: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            };

            match new_code.insert(&txn).await {
                Ok(model) => {
                    txn.commit().await?;
                    return Ok(model);
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    txn.rollback().await?;
                    tracing::warn!(attempt, "Referral token collision, regenerating");
                }
                Err(e) => {
                    txn.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        Err(AppError::Internal(
            "Could not generate a unique referral token".to_string(),
        ))
    }

    /// The user's active code, or `NotFound`. Pure read.
    pub async fn fetch_active(&self, user_id: i64) -> Result<referral_code::Model> {
        ReferralCode::find()
            .filter(referral_code::Column::UserId.eq(user_id))
            .filter(referral_code::Column::IsActive.eq(true))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("No active code found for this user".to_string()))
    }

    /// Logically delete the user's active code, returning a snapshot of it
    /// as it was immediately before deactivation.
    pub async fn deactivate_active(&self, user_id: i64) -> Result<referral_code::Model> {
        let active = ReferralCode::find()
            .filter(referral_code::Column::UserId.eq(user_id))
            .filter(referral_code::Column::IsActive.eq(true))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("No active code found".to_string()))?;

        let snapshot = active.clone();

        let mut deactivated: referral_code::ActiveModel = active.into();
        deactivated.is_active = Set(false);
        deactivated.update(self.db).await?;

        Ok(snapshot)
    }

    /// Resolve a token to its owning user, regardless of the active flag.
    /// Registration redeems against this, so a superseded code still resolves.
    pub async fn resolve_owner(&self, token: &str) -> Result<user::Model> {
        let code = ReferralCode::find()
            .filter(referral_code::Column::Code.eq(token))
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("No referral code matches this token".to_string()))?;

        User::find_by_id(code.user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Referral code owner not found".to_string()))
    }
}
