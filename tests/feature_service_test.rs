mod common;

use std::collections::BTreeMap;

use mockall::predicate::eq;
use uuid::Uuid;

use storefront::domain::{FeatureChanges, NewFeature};
use storefront::errors::AppError;
use storefront::services::{FeatureCatalog, FeatureService};
use storefront::types::PaginationParams;

use common::{feature, TestUnitOfWork};

fn catalog(uow: TestUnitOfWork) -> FeatureCatalog<common::SharedTestUnitOfWork> {
    FeatureCatalog::new(uow.build())
}

#[tokio::test]
async fn test_create_feature() {
    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_name_taken()
        .withf(|name, ignore| name == "color" && ignore.is_none())
        .returning(|_, _| Ok(false));
    uow.features
        .expect_create()
        .times(1)
        .returning(|new| Ok(feature(&new.name, new.validation_rules.as_deref())));

    let created = catalog(uow)
        .create_feature(NewFeature::named("color"))
        .await
        .unwrap();

    assert_eq!(created.name, "color");
}

#[tokio::test]
async fn test_create_feature_with_taken_name() {
    let mut uow = TestUnitOfWork::new();
    uow.features.expect_name_taken().returning(|_, _| Ok(true));
    uow.features.expect_create().never();

    let result = catalog(uow).create_feature(NewFeature::named("color")).await;

    match result {
        Err(AppError::InvalidFields(fields)) => {
            assert_eq!(fields["name"], vec!["The name has already been taken."]);
        }
        other => panic!("expected name error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_ignores_the_edited_feature_when_checking_name() {
    let id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_name_taken()
        .withf(move |name, ignore| name == "size" && *ignore == Some(id))
        .times(1)
        .returning(|_, _| Ok(false));
    uow.features
        .expect_update()
        .withf(move |feature_id, _| *feature_id == id)
        .returning(|_, changes| Ok(feature(&changes.name.unwrap_or_default(), None)));

    let updated = catalog(uow)
        .update_feature(id, FeatureChanges::rename("size"), Some(id))
        .await
        .unwrap();

    assert_eq!(updated.name, "size");
}

#[tokio::test]
async fn test_update_does_not_ignore_another_features_name() {
    let id = Uuid::new_v4();
    let other = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_name_taken()
        .withf(move |_, ignore| *ignore == Some(id))
        .times(1)
        .returning(|_, _| Ok(true));
    uow.features.expect_update().never();

    let result = catalog(uow)
        .update_feature(id, FeatureChanges::rename("bar"), Some(other))
        .await;

    assert!(matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains_key("name")));
}

#[tokio::test]
async fn test_update_falls_back_to_own_id_for_name_check() {
    let id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_name_taken()
        .withf(move |_, ignore| *ignore == Some(id))
        .times(1)
        .returning(|_, _| Ok(false));
    uow.features
        .expect_update()
        .returning(|_, _| Ok(feature("size", None)));

    let result = catalog(uow)
        .update_feature(id, FeatureChanges::rename("size"), None)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_without_name_skips_uniqueness_check() {
    let mut uow = TestUnitOfWork::new();
    uow.features.expect_name_taken().never();
    uow.features
        .expect_update()
        .withf(|_, changes| changes.validation_rules.is_none() && changes.status == Some(false))
        .returning(|_, _| Ok(feature("size", None)));

    let changes = FeatureChanges {
        status: Some(false),
        ..Default::default()
    };
    let result = catalog(uow).update_feature(Uuid::new_v4(), changes, None).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_get_missing_feature() {
    let mut uow = TestUnitOfWork::new();
    uow.features.expect_find_by_id().returning(|_| Ok(None));

    let result = catalog(uow).get_feature(Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_list_features() {
    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_paginate()
        .returning(|_| Ok((vec![feature("color", None), feature("size", None)], 2)));

    let (features, total) = catalog(uow)
        .list_features(&PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(features.len(), 2);
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_delete_feature() {
    let id = Uuid::new_v4();

    let mut uow = TestUnitOfWork::new();
    uow.features
        .expect_delete()
        .with(eq(id))
        .times(1)
        .returning(|_| Ok(()));

    assert!(catalog(uow).delete_feature(id).await.is_ok());
}

#[tokio::test]
async fn test_filterable_rules() {
    let mut uow = TestUnitOfWork::new();
    uow.features.expect_filterable_validation_rules().returning(|| {
        Ok(BTreeMap::from([
            ("features.color".to_string(), "max:20".to_string()),
            ("features.size".to_string(), "numeric".to_string()),
        ]))
    });

    let rules = catalog(uow).filterable_rules().await.unwrap();

    assert_eq!(rules["features.color"], "max:20");
    assert_eq!(rules.len(), 2);
}
