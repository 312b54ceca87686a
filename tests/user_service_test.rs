//! User service tests over mocked repositories.

mod common;

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use serde_json::json;
use uuid::Uuid;

use storefront::config::Config;
use storefront::domain::{
    Notification, PreferenceKey, Preferences, ProfileChanges, User, UserRole,
};
use storefront::errors::AppError;
use storefront::jobs::MockEmailQueue;
use storefront::services::{UserManager, UserService};
use storefront::types::PaginationParams;

use common::{user, TestUnitOfWork};

fn manager(uow: TestUnitOfWork) -> UserManager<common::SharedTestUnitOfWork> {
    manager_with_queue(uow, MockEmailQueue::new())
}

fn manager_with_queue(
    uow: TestUnitOfWork,
    queue: MockEmailQueue,
) -> UserManager<common::SharedTestUnitOfWork> {
    UserManager::new(uow.build(), Arc::new(queue), &Config::for_tests())
}

fn notification(user_id: Uuid) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id,
        kind: "reset_password".to_string(),
        data: json!({}),
        read_at: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_get_user_success() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_find_by_id()
        .with(eq(user_id))
        .returning(|id| Ok(Some(user(id))));

    let result = manager(uow).get_user(user_id).await;

    assert_eq!(result.unwrap().id, user_id);
}

#[tokio::test]
async fn test_get_user_not_found() {
    let mut uow = TestUnitOfWork::new();
    uow.users.expect_find_by_id().returning(|_| Ok(None));

    let result = manager(uow).get_user(Uuid::new_v4()).await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound));
}

#[tokio::test]
async fn test_list_users_passes_pagination() {
    let params = PaginationParams::new(2, 10);

    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_list()
        .withf(|p| p.page == 2 && p.per_page == 10)
        .returning(|_| Ok((vec![user(Uuid::new_v4()), user(Uuid::new_v4())], 12)));

    let (users, total) = manager(uow).list_users(&params).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(total, 12);
}

#[tokio::test]
async fn test_update_profile_without_password_keeps_hash() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_update_profile()
        .withf(|_, changes| changes.password_hash.is_none())
        .returning(|id, changes| {
            let mut updated = user(id);
            updated.first_name = changes.first_name.unwrap_or(updated.first_name);
            Ok(updated)
        });

    let changes = ProfileChanges {
        first_name: Some("janet".to_string()),
        ..Default::default()
    };
    let updated = manager(uow)
        .update_profile(user_id, changes, Some("   ".to_string()))
        .await
        .unwrap();

    assert_eq!(updated.first_name, "janet");
    assert_eq!(updated.password_hash, "hashed");
}

#[tokio::test]
async fn test_update_profile_hashes_new_password() {
    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_update_profile()
        .withf(|_, changes| {
            changes
                .password_hash
                .as_deref()
                .is_some_and(|hash| hash.starts_with("$argon2") && hash != "new-secret-123")
        })
        .returning(|id, _| Ok(user(id)));

    let result = manager(uow)
        .update_profile(
            Uuid::new_v4(),
            ProfileChanges::default(),
            Some("new-secret-123".to_string()),
        )
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_profile_rejects_short_password() {
    let uow = TestUnitOfWork::new();

    let result = manager(uow)
        .update_profile(Uuid::new_v4(), ProfileChanges::default(), Some("short".to_string()))
        .await;

    assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains_key("password")));
}

#[tokio::test]
async fn test_update_preferences_merges_into_stored_list() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users.expect_find_by_id().returning(|id| {
        let mut stored = user(id);
        stored.preferences = Preferences::parse(Some(r#"{"my_searches":"boots,lamp"}"#));
        Ok(Some(stored))
    });
    uow.users
        .expect_update_preferences()
        .withf(|_, preferences| {
            preferences.get(PreferenceKey::MySearches) == ["lamp", "desk", "boots"]
        })
        .returning(|id, preferences| {
            Ok(User {
                preferences,
                ..user(id)
            })
        });

    let updated = manager(uow)
        .update_preferences(
            user_id,
            PreferenceKey::MySearches,
            vec!["desk".to_string(), "boots".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(updated.preferences.get(PreferenceKey::MySearches).len(), 3);
}

#[tokio::test]
async fn test_mark_unread_notification_as_read() {
    let user_id = Uuid::new_v4();
    let unread = notification(user_id);
    let notification_id = unread.id;

    let mut uow = TestUnitOfWork::new();
    uow.notifications
        .expect_find_unread_for_user()
        .with(eq(user_id), eq(notification_id))
        .returning(move |_, _| Ok(Some(unread.clone())));
    uow.notifications
        .expect_mark_read()
        .with(eq(notification_id))
        .times(1)
        .returning(move |id| {
            let mut read = notification(user_id);
            read.id = id;
            read.read_at = Some(Utc::now());
            Ok(read)
        });

    let marked = manager(uow)
        .mark_notification_as_read(user_id, notification_id)
        .await
        .unwrap();

    assert!(marked);
}

#[tokio::test]
async fn test_mark_missing_or_read_notification_is_a_no_op() {
    let mut uow = TestUnitOfWork::new();
    uow.notifications
        .expect_find_unread_for_user()
        .returning(|_, _| Ok(None));
    uow.notifications.expect_mark_read().never();

    let marked = manager(uow)
        .mark_notification_as_read(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap();

    assert!(!marked);
}

#[tokio::test]
async fn test_request_email_change_sends_link_to_new_address() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
    uow.users
        .expect_find_by_email_with_deleted()
        .returning(|_| Ok(None));
    uow.email_changes.expect_create().returning(
        |user_id, old_email, new_email, token, expires_at| {
            Ok(storefront::domain::EmailChangePetition {
                id: Uuid::new_v4(),
                user_id,
                old_email,
                new_email,
                token,
                expires_at,
                confirmed: false,
                confirmed_at: None,
                created_at: Utc::now(),
            })
        },
    );
    uow.notifications
        .expect_create()
        .withf(|_, kind, data| kind == "email_change" && data["new_email"] == "new@example.com")
        .returning(|user_id, kind, data| {
            Ok(Notification {
                kind,
                data,
                ..notification(user_id)
            })
        });

    let mut queue = MockEmailQueue::new();
    queue
        .expect_enqueue()
        .withf(|job| job.to == "new@example.com" && job.body.contains("/user/email/confirm/"))
        .times(1)
        .returning(|_| Ok(()));

    let petition = manager_with_queue(uow, queue)
        .request_email_change(user_id, "new@example.com".to_string())
        .await
        .unwrap();

    assert_eq!(petition.old_email, "jane@example.com");
    assert!(petition.is_pending(Utc::now()));
}

#[tokio::test]
async fn test_request_email_change_rejects_taken_address() {
    let mut uow = TestUnitOfWork::new();
    uow.users.expect_find_by_id().returning(|id| Ok(Some(user(id))));
    uow.users
        .expect_find_by_email_with_deleted()
        .returning(|_| Ok(Some(user(Uuid::new_v4()))));

    let result = manager(uow)
        .request_email_change(Uuid::new_v4(), "taken@example.com".to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains_key("email")));
}

#[tokio::test]
async fn test_update_role() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_update_role()
        .with(eq(user_id), eq(UserRole::Seller))
        .returning(|id, role| Ok(common::user_with_role(id, role)));

    let updated = manager(uow).update_role(user_id, UserRole::Seller).await.unwrap();

    assert!(updated.is_admin());
}

#[tokio::test]
async fn test_delete_user_success() {
    let mut uow = TestUnitOfWork::new();
    uow.users.expect_delete().times(1).returning(|_| Ok(()));

    let result = manager(uow).delete_user(Uuid::new_v4(), Uuid::new_v4()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cannot_delete_or_disable_self() {
    let admin_id = Uuid::new_v4();
    let service = manager(TestUnitOfWork::new());

    assert!(matches!(
        service.delete_user(admin_id, admin_id).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        service.disable_user(admin_id, admin_id).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_disable_and_enable() {
    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_set_disabled()
        .returning(|id, disabled| {
            let mut updated = user(id);
            updated.disabled_at = disabled.then(Utc::now);
            Ok(updated)
        });
    let service = manager(uow);

    let disabled = service.disable_user(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
    let enabled = service.enable_user(disabled.id).await.unwrap();

    assert!(disabled.is_disabled());
    assert!(!enabled.is_disabled());
}

#[tokio::test]
async fn test_restore_user_success() {
    let user_id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.users
        .expect_restore()
        .returning(|id| Ok(user(id)));

    let restored = manager(uow).restore_user(user_id).await.unwrap();

    assert_eq!(restored.id, user_id);
    assert!(restored.deleted_at.is_none());
}
