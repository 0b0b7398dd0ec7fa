//! Credential store tests against an in-memory SQLite database.
//!
//! These run the real migrations and the real SQL, so the statements the
//! store builds (conditional token consumption, role changes clearing the
//! permission set, unique-email enforcement) are exercised end to end
//! rather than asserted through mocks.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use cms_backend::domain::{Capability, OneTimeToken, User, UserRole};
use cms_backend::errors::AppError;
use cms_backend::infra::{Migrator, UserRepository, UserStore};

async fn store() -> UserStore {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    Migrator::up(&db, None).await.expect("migrations");
    UserStore::new(db)
}

fn caps(tags: &[Capability]) -> HashSet<Capability> {
    tags.iter().copied().collect()
}

fn expired_token() -> OneTimeToken {
    OneTimeToken {
        value: "expiredexpiredexpiredexpiredexpiredexpired00000".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
    }
}

async fn seed_active(store: &UserStore, email: &str, role: UserRole) -> User {
    store
        .create(
            email.to_string(),
            "Seed User".to_string(),
            "$argon2id$seedhash".to_string(),
            role,
        )
        .await
        .expect("seed user")
}

async fn seed_pending(store: &UserStore, email: &str, token: OneTimeToken) -> User {
    store
        .create_pending(
            email.to_string(),
            "Invited User".to_string(),
            UserRole::ContentManager,
            HashSet::new(),
            token,
        )
        .await
        .expect("pending user")
}

// =============================================================================
// Role / permission invariant
// =============================================================================

#[tokio::test]
async fn leaving_assistant_admin_clears_permissions() {
    let store = store().await;
    let user = store
        .create_pending(
            "aa@example.com".to_string(),
            "Assistant".to_string(),
            UserRole::AssistantAdmin,
            caps(&[Capability::ManageUsers, Capability::ManageContent]),
            OneTimeToken::activation(),
        )
        .await
        .unwrap();
    assert_eq!(user.permissions.len(), 2);

    let updated = store.update_role(user.id, UserRole::Editor).await.unwrap();
    assert_eq!(updated.role, UserRole::Editor);
    assert!(updated.permissions.is_empty());

    // The cleared set is persisted, not just reflected in the return value
    let reread = store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(reread.permissions.is_empty());
}

#[tokio::test]
async fn staying_assistant_admin_keeps_permissions() {
    let store = store().await;
    let user = store
        .create_pending(
            "aa@example.com".to_string(),
            "Assistant".to_string(),
            UserRole::AssistantAdmin,
            caps(&[Capability::ManageJobs]),
            OneTimeToken::activation(),
        )
        .await
        .unwrap();

    let updated = store
        .update_role(user.id, UserRole::AssistantAdmin)
        .await
        .unwrap();
    assert_eq!(updated.permissions, caps(&[Capability::ManageJobs]));
}

#[tokio::test]
async fn update_permissions_rejects_plain_role_targets() {
    let store = store().await;
    let user = seed_active(&store, "editor@example.com", UserRole::Editor).await;

    let err = store
        .update_permissions(user.id, caps(&[Capability::ManageContent]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn update_permissions_replaces_the_granted_set() {
    let store = store().await;
    let user = store
        .create_pending(
            "aa@example.com".to_string(),
            "Assistant".to_string(),
            UserRole::AssistantAdmin,
            caps(&[Capability::ManageUsers]),
            OneTimeToken::activation(),
        )
        .await
        .unwrap();

    let updated = store
        .update_permissions(user.id, caps(&[Capability::ManagePartners]))
        .await
        .unwrap();
    assert_eq!(updated.permissions, caps(&[Capability::ManagePartners]));
}

// =============================================================================
// Activation token consumption
// =============================================================================

#[tokio::test]
async fn activation_token_is_consumed_exactly_once() {
    let store = store().await;
    let token = OneTimeToken::activation();
    let value = token.value.clone();
    let user = seed_pending(&store, "invitee@example.com", token).await;

    let consumed = store
        .consume_activation_token(user.id, &value, "$argon2id$newhash".to_string())
        .await
        .unwrap();
    assert!(consumed);

    let activated = store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(activated.is_active);
    assert_eq!(
        activated.password_hash.as_deref(),
        Some("$argon2id$newhash")
    );
    assert!(activated.activation_token.is_none());
    assert!(activated.activation_expires_at.is_none());

    // A concurrent duplicate matches zero rows
    let again = store
        .consume_activation_token(user.id, &value, "$argon2id$otherhash".to_string())
        .await
        .unwrap();
    assert!(!again);
}

#[tokio::test]
async fn activation_rejects_a_mismatched_token() {
    let store = store().await;
    let user = seed_pending(&store, "invitee@example.com", OneTimeToken::activation()).await;

    let consumed = store
        .consume_activation_token(user.id, "not-the-token", "$argon2id$hash".to_string())
        .await
        .unwrap();
    assert!(!consumed);

    let unchanged = store.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!unchanged.is_active);
    assert!(unchanged.password_hash.is_none());
}

#[tokio::test]
async fn activation_rejects_an_expired_token() {
    let store = store().await;
    let token = expired_token();
    let value = token.value.clone();
    let user = seed_pending(&store, "invitee@example.com", token).await;

    let consumed = store
        .consume_activation_token(user.id, &value, "$argon2id$hash".to_string())
        .await
        .unwrap();
    assert!(!consumed);
}

// =============================================================================
// Reset token consumption
// =============================================================================

#[tokio::test]
async fn reset_token_is_consumed_exactly_once() {
    let store = store().await;
    let user = seed_active(&store, "editor@example.com", UserRole::Editor).await;

    let token = OneTimeToken::password_reset();
    let value = token.value.clone();
    store.set_reset_token(user.id, token).await.unwrap();

    let wrong = store
        .consume_reset_token(user.id, "not-the-token", "$argon2id$newhash".to_string())
        .await
        .unwrap();
    assert!(!wrong);

    let consumed = store
        .consume_reset_token(user.id, &value, "$argon2id$newhash".to_string())
        .await
        .unwrap();
    assert!(consumed);

    let reread = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(reread.password_hash.as_deref(), Some("$argon2id$newhash"));
    assert!(reread.password_reset_token.is_none());

    let again = store
        .consume_reset_token(user.id, &value, "$argon2id$otherhash".to_string())
        .await
        .unwrap();
    assert!(!again);
}

#[tokio::test]
async fn reset_rejects_an_expired_token() {
    let store = store().await;
    let user = seed_active(&store, "editor@example.com", UserRole::Editor).await;

    let token = expired_token();
    let value = token.value.clone();
    store.set_reset_token(user.id, token).await.unwrap();

    let consumed = store
        .consume_reset_token(user.id, &value, "$argon2id$hash".to_string())
        .await
        .unwrap();
    assert!(!consumed);

    let unchanged = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(unchanged.password_hash.as_deref(), Some("$argon2id$seedhash"));
}

// =============================================================================
// Unique email enforcement
// =============================================================================

#[tokio::test]
async fn duplicate_email_insert_is_a_conflict() {
    let store = store().await;
    seed_active(&store, "taken@example.com", UserRole::Editor).await;

    let err = store
        .create(
            "taken@example.com".to_string(),
            "Second".to_string(),
            "$argon2id$hash".to_string(),
            UserRole::Editor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn profile_update_to_a_taken_email_is_a_conflict() {
    let store = store().await;
    let first = seed_active(&store, "first@example.com", UserRole::Editor).await;
    let second = seed_active(&store, "second@example.com", UserRole::Editor).await;

    let err = store
        .update_profile(second.id, None, Some(first.email.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn update_role_for_an_unknown_id_is_not_found() {
    let store = store().await;
    let err = store
        .update_role(Uuid::new_v4(), UserRole::Editor)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
