//! Authentication service unit tests.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use cms_backend::domain::{Password, UserRole};
use cms_backend::errors::AppError;
use cms_backend::services::{AuthService, Authenticator};

use common::{active_user, test_config, MockUserRepo};

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email()
        .withf(|email| email == "editor@example.com")
        .returning(|_| Ok(Some(active_user(Uuid::new_v4()))));

    let service = Authenticator::new(Arc::new(repo), test_config());
    let result = service
        .register(
            "editor@example.com".to_string(),
            "password123".to_string(),
            "Someone".to_string(),
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
}

#[tokio::test]
async fn register_hashes_password_and_defaults_to_editor() {
    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(|_| Ok(None));
    repo.expect_create()
        .withf(|email, _, hash, role| {
            email == "new@example.com"
                && hash.starts_with("$argon2")
                && *role == UserRole::Editor
        })
        .returning(|email, name, hash, role| {
            let mut user = active_user(Uuid::new_v4());
            user.email = email;
            user.name = name;
            user.password_hash = Some(hash);
            user.role = role;
            Ok(user)
        });

    let service = Authenticator::new(Arc::new(repo), test_config());
    let user = service
        .register(
            "new@example.com".to_string(),
            "password123".to_string(),
            "New User".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(user.role, UserRole::Editor);
    assert!(user.is_active);
}

#[tokio::test]
async fn register_rejects_short_password() {
    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(|_| Ok(None));

    let service = Authenticator::new(Arc::new(repo), test_config());
    let result = service
        .register(
            "new@example.com".to_string(),
            "five5".to_string(),
            "New User".to_string(),
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
}

#[tokio::test]
async fn login_returns_verifiable_token() {
    let user_id = Uuid::new_v4();
    let hash = Password::new("correct-password").unwrap().into_string();

    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(move |_| {
        let mut user = active_user(user_id);
        user.password_hash = Some(hash.clone());
        Ok(Some(user))
    });

    let service = Authenticator::new(Arc::new(repo), test_config());
    let (token, user) = service
        .login(
            "editor@example.com".to_string(),
            "correct-password".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(token.token_type, "Bearer");

    let claims = service.verify_token(&token.access_token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "editor@example.com");
    assert_eq!(claims.role, "editor");
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let hash = Password::new("correct-password").unwrap().into_string();

    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(move |_| {
        let mut user = active_user(Uuid::new_v4());
        user.password_hash = Some(hash.clone());
        Ok(Some(user))
    });

    let service = Authenticator::new(Arc::new(repo), test_config());
    let result = service
        .login(
            "editor@example.com".to_string(),
            "wrong-password".to_string(),
        )
        .await;

    assert!(matches!(result.unwrap_err(), AppError::InvalidCredentials));
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(|_| Ok(None));

    let service = Authenticator::new(Arc::new(repo), test_config());
    let result = service
        .login("ghost@example.com".to_string(), "whatever12".to_string())
        .await;

    assert!(matches!(result.unwrap_err(), AppError::InvalidCredentials));
}

#[tokio::test]
async fn login_rejects_pending_account() {
    let mut repo = MockUserRepo::new();
    repo.expect_find_by_email().returning(|_| {
        let mut user = active_user(Uuid::new_v4());
        user.is_active = false;
        user.password_hash = None;
        Ok(Some(user))
    });

    let service = Authenticator::new(Arc::new(repo), test_config());
    let result = service
        .login(
            "editor@example.com".to_string(),
            "password123".to_string(),
        )
        .await;

    // Indistinguishable from a bad password: no account enumeration
    assert!(matches!(result.unwrap_err(), AppError::InvalidCredentials));
}

#[tokio::test]
async fn verify_token_rejects_garbage() {
    let repo = MockUserRepo::new();
    let service = Authenticator::new(Arc::new(repo), test_config());

    let result = service.verify_token("not-a-jwt");
    assert!(matches!(result.unwrap_err(), AppError::Jwt(_)));
}

#[tokio::test]
async fn verify_token_rejects_foreign_signature() {
    let repo = MockUserRepo::new();
    let service = Authenticator::new(Arc::new(repo), test_config());

    let other = Authenticator::new(
        Arc::new({
            let mut repo = MockUserRepo::new();
            repo.expect_find_by_email().returning(move |_| {
                let mut user = active_user(Uuid::new_v4());
                user.password_hash =
                    Some(Password::new("password123").unwrap().into_string());
                Ok(Some(user))
            });
            repo
        }),
        cms_backend::config::Config::for_tests(
            "a-different-secret-also-long-enough-to-sign-with",
        ),
    );

    let (token, _) = other
        .login(
            "editor@example.com".to_string(),
            "password123".to_string(),
        )
        .await
        .unwrap();

    assert!(service.verify_token(&token.access_token).is_err());
}
