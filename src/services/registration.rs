use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::db::entities::prelude::*;
use crate::db::entities::user;
use crate::error::{AppError, FieldErrors, Result};
use crate::services::codes::ReferralCodeService;
use crate::services::referrals::ReferralGraphService;
use crate::services::security::hash_password;
use crate::services::verify::EmailVerifier;

/// `POST /register` request body. Fields are optional at the wire level so
/// presence failures come back as per-field validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub referral_code: Option<String>,
}

#[derive(Debug)]
pub struct RegistrationOutcome {
    pub user: user::Model,
    pub referred: bool,
}

/// Coordinates one registration: field validation, external email
/// verification, referral token resolution, user creation, edge recording.
///
/// Verification and token resolution must both succeed before the user row
/// is created; a rejected request creates nothing.
pub struct RegistrationService<'a> {
    db: &'a DatabaseConnection,
    verifier: &'a dyn EmailVerifier,
}

impl<'a> RegistrationService<'a> {
    pub fn new(db: &'a DatabaseConnection, verifier: &'a dyn EmailVerifier) -> Self {
        Self { db, verifier }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<RegistrationOutcome> {
        let (username, password, email) = self.validate_fields(&request).await?;

        if !self.verifier.verify(&email).await? {
            return Err(AppError::EmailUnverifiable);
        }

        let referral_code = request
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let referrer = match referral_code {
            Some(token) => Some(
                ReferralCodeService::new(self.db)
                    .resolve_owner(token)
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound(_) => AppError::InvalidReferralCode,
                        other => other,
                    })?,
            ),
            None => None,
        };

        let new_user = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            hashed_password: Set(hash_password(&password)?),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = new_user.insert(self.db).await?;
        tracing::info!(user_id = created.id, "Registered new user");

        let referred = match referrer {
            Some(referrer) => {
                ReferralGraphService::new(self.db)
                    .record(referrer.id, created.id)
                    .await?;
                true
            }
            None => false,
        };

        Ok(RegistrationOutcome {
            user: created,
            referred,
        })
    }

    /// Presence, syntax, and uniqueness checks, reported as a field-error
    /// map in one pass.
    async fn validate_fields(
        &self,
        request: &RegisterRequest,
    ) -> Result<(String, String, String)> {
        let mut errors = FieldErrors::new();

        let username = required_field(&mut errors, "username", request.username.as_deref());
        let password = required_field(&mut errors, "password", request.password.as_deref());
        let email = required_field(&mut errors, "email", request.email.as_deref());

        if let Some(ref email) = email {
            if !email.validate_email() {
                field_error(&mut errors, "email", "Enter a valid email address.");
            }
        }

        if let Some(ref username) = username {
            let taken = User::find()
                .filter(user::Column::Username.eq(username.as_str()))
                .one(self.db)
                .await?
                .is_some();
            if taken {
                field_error(
                    &mut errors,
                    "username",
                    "A user with that username already exists.",
                );
            }
        }

        if let Some(ref email) = email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .one(self.db)
                .await?
                .is_some();
            if taken {
                field_error(
                    &mut errors,
                    "email",
                    "A user with that email address already exists.",
                );
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        // All three are present when no errors were recorded.
        match (username, password, email) {
            (Some(u), Some(p), Some(e)) => Ok((u, p, e)),
            _ => Err(AppError::Internal(
                "Field validation passed with missing fields".to_string(),
            )),
        }
    }
}

fn required_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Some(v.to_string()),
        None => {
            field_error(errors, field, "This field is required.");
            None
        }
    }
}

fn field_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::codes::ReferralCodeService;
    use crate::test_helpers::{
        create_test_code, create_test_db, create_test_user, MockVerifier,
    };

    fn request(username: &str, password: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            email: Some(email.to_string()),
            referral_code: None,
        }
    }

    #[tokio::test]
    async fn test_register_without_referral() {
        let db = create_test_db().await;
        let verifier = MockVerifier::valid();

        let outcome = RegistrationService::new(&db, &verifier)
            .register(request("katana", "nevermore", "katana@example.com"))
            .await
            .unwrap();

        assert!(!outcome.referred);
        assert_eq!(outcome.user.username, "katana");

        // Password is stored hashed.
        assert_ne!(outcome.user.hashed_password, "nevermore");
    }

    #[tokio::test]
    async fn test_register_with_referral_records_edge() {
        let db = create_test_db().await;
        let referrer = create_test_user(&db, "referrer", "ref@example.com", "pw").await;
        create_test_code(&db, referrer.id, "TESTING1234567890123", true).await;
        let verifier = MockVerifier::valid();

        let mut req = request("katana", "nevermore", "katana@example.com");
        req.referral_code = Some("TESTING1234567890123".to_string());

        let outcome = RegistrationService::new(&db, &verifier)
            .register(req)
            .await
            .unwrap();
        assert!(outcome.referred);

        let referrals = ReferralGraphService::new(&db)
            .list_referrals(referrer.id)
            .await
            .unwrap();
        assert_eq!(referrals, vec!["katana".to_string()]);
    }

    #[tokio::test]
    async fn test_register_with_invalid_referral_creates_no_user() {
        let db = create_test_db().await;
        let verifier = MockVerifier::valid();

        let mut req = request("katana", "nevermore", "katana@example.com");
        req.referral_code = Some("111".to_string());

        let err = RegistrationService::new(&db, &verifier)
            .register(req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReferralCode));

        let users = User::find().all(&db).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_unverifiable_email_creates_no_user() {
        let db = create_test_db().await;
        let verifier = MockVerifier::invalid();

        let err = RegistrationService::new(&db, &verifier)
            .register(request("katana", "nevermore", "bad@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailUnverifiable));

        let users = User::find().all(&db).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_reported_per_field() {
        let db = create_test_db().await;
        let verifier = MockVerifier::valid();

        let err = RegistrationService::new(&db, &verifier)
            .register(RegisterRequest::default())
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                for field in ["username", "password", "email"] {
                    assert_eq!(fields[field], vec!["This field is required.".to_string()]);
                }
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_email_rejected_before_verification() {
        let db = create_test_db().await;
        // A verifier that would fail the test if called.
        let verifier = MockVerifier::invalid();

        let err = RegistrationService::new(&db, &verifier)
            .register(request("katana", "nevermore", "not-an-email"))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields["email"], vec!["Enter a valid email address.".to_string()]);
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = create_test_db().await;
        create_test_user(&db, "katana", "taken@example.com", "pw").await;
        let verifier = MockVerifier::valid();

        let err = RegistrationService::new(&db, &verifier)
            .register(request("katana", "nevermore", "new@example.com"))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert_eq!(
                    fields["username"],
                    vec!["A user with that username already exists.".to_string()]
                );
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_code_still_redeemable() {
        // resolve_owner ignores both the active flag and the expiry date;
        // only an unknown token is rejected.
        let db = create_test_db().await;
        let referrer = create_test_user(&db, "referrer", "ref@example.com", "pw").await;
        create_test_code(&db, referrer.id, "OLDCODE1234567890123", false).await;
        let verifier = MockVerifier::valid();

        let mut req = request("katana", "nevermore", "katana@example.com");
        req.referral_code = Some("OLDCODE1234567890123".to_string());

        let outcome = RegistrationService::new(&db, &verifier)
            .register(req)
            .await
            .unwrap();
        assert!(outcome.referred);

        let service = ReferralCodeService::new(&db);
        let owner = service.resolve_owner("OLDCODE1234567890123").await.unwrap();
        assert_eq!(owner.id, referrer.id);
    }
}
