mod common;

use std::collections::HashSet;

use common::{identity, recipe_form, recipe_payload, Fixture};
use recipebox_sdk::{
    authentication::jwt::Identity,
    database::{
        actions,
        error::ActionError,
        form::Form,
        schema::{Id, RecipeFilter},
        views::RecipeView,
    },
};
use serde_json::json;

fn lines(view: &RecipeView) -> Vec<(Id, i32)> {
    let mut lines: Vec<(Id, i32)> = view.ingredients.iter().map(|i| (i.id, i.amount)).collect();
    lines.sort();
    lines
}

fn tag_ids(view: &RecipeView) -> HashSet<Id> {
    view.tags.iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn created_recipe_reads_back_the_same() {
    let f = Fixture::new();
    let form = recipe_form(
        "soup",
        &[f.breakfast.id, f.dinner.id],
        &[(f.onion.id, 2), (f.carrot.id, 3)],
    );

    let created = actions::create_recipe(&form, &identity(&f.anna), &f.media, &f.store)
        .await
        .unwrap();
    let fetched = actions::get_recipe(created.id, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap();

    assert_eq!(tag_ids(&fetched), HashSet::from([f.breakfast.id, f.dinner.id]));
    let mut expected = vec![(f.onion.id, 2), (f.carrot.id, 3)];
    expected.sort();
    assert_eq!(lines(&fetched), expected);
    assert_eq!(fetched.author.username, "anna");
    assert_eq!(fetched.image.as_deref(), Some("/media/recipes/images/soup.png"));
    assert!(!fetched.is_favorited);
}

#[tokio::test]
async fn second_update_leaves_no_residue() {
    let f = Fixture::new();
    let anna = identity(&f.anna);
    let form = recipe_form("stew", &[f.dinner.id], &[(f.onion.id, 1)]);
    let recipe = actions::create_recipe(&form, &anna, &f.media, &f.store)
        .await
        .unwrap();

    let first = recipe_form("stew", &[f.breakfast.id], &[(f.salt.id, 5), (f.onion.id, 2)]);
    actions::update_recipe(recipe.id, &first, &anna, &f.media, &f.store)
        .await
        .unwrap();

    let second = recipe_form("stew", &[f.dinner.id], &[(f.carrot.id, 7)]);
    let updated = actions::update_recipe(recipe.id, &second, &anna, &f.media, &f.store)
        .await
        .unwrap();

    assert_eq!(lines(&updated), vec![(f.carrot.id, 7)]);
    assert_eq!(tag_ids(&updated), HashSet::from([f.dinner.id]));
}

#[tokio::test]
async fn update_without_image_keeps_the_stored_one() {
    let f = Fixture::new();
    let anna = identity(&f.anna);
    let recipe = actions::create_recipe(
        &recipe_form("pie", &[f.dinner.id], &[(f.onion.id, 1)]),
        &anna,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();

    let mut payload = recipe_payload("pie", &[f.dinner.id], &[(f.salt.id, json!(2))]);
    payload["image"] = json!(null);
    let updated = actions::update_recipe(
        recipe.id,
        &Form::from_json(payload),
        &anna,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();

    assert_eq!(updated.image.as_deref(), Some("/media/recipes/images/pie.png"));
}

#[tokio::test]
async fn only_the_author_may_edit_even_with_a_bad_payload() {
    let f = Fixture::new();
    let recipe = actions::create_recipe(
        &recipe_form("pie", &[f.dinner.id], &[(f.onion.id, 1)]),
        &identity(&f.anna),
        &f.media,
        &f.store,
    )
    .await
    .unwrap();

    let valid = recipe_form("mine now", &[f.dinner.id], &[(f.salt.id, 1)]);
    let err = actions::update_recipe(recipe.id, &valid, &identity(&f.bo), &f.media, &f.store)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Forbidden(_)));
    assert_eq!(err.code(), 403);

    let invalid = Form::from_json(json!({}));
    let err = actions::update_recipe(recipe.id, &invalid, &identity(&f.bo), &f.media, &f.store)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Forbidden(_)));

    let unchanged = actions::get_recipe(recipe.id, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap();
    assert_eq!(unchanged.name, "pie");
    assert_eq!(lines(&unchanged), vec![(f.onion.id, 1)]);
}

#[tokio::test]
async fn invalid_submissions_write_nothing() {
    let f = Fixture::new();
    let anna = identity(&f.anna);

    let cases = [
        ("duplicate", recipe_payload("a", &[f.dinner.id], &[(f.onion.id, json!(1)), (f.onion.id, json!(2))]), "ingredients"),
        ("zero", recipe_payload("a", &[f.dinner.id], &[(f.onion.id, json!(0))]), "ingredients"),
        ("negative", recipe_payload("a", &[f.dinner.id], &[(f.onion.id, json!("-1"))]), "ingredients"),
        ("letters", recipe_payload("a", &[f.dinner.id], &[(f.onion.id, json!("abc"))]), "ingredients"),
        ("no tags", recipe_payload("a", &[], &[(f.onion.id, json!(1))]), "tags"),
        ("unknown tag", recipe_payload("a", &[999], &[(f.onion.id, json!(1))]), "tags"),
        ("unknown ingredient", recipe_payload("a", &[f.dinner.id], &[(999, json!(1))]), "ingredients"),
    ];

    for (case, payload, field) in cases {
        let err = actions::create_recipe(&Form::from_json(payload), &anna, &f.media, &f.store)
            .await
            .unwrap_err();

        match err {
            ActionError::Validation(errors) => assert!(errors.contains(field), "{case}: {errors}"),
            other => panic!("{case}: unexpected {other:?}"),
        }
    }

    let recipes = actions::list_recipes(&RecipeFilter::default(), &anna, &f.media, &f.store)
        .await
        .unwrap();
    assert!(recipes.is_empty());
}

#[tokio::test]
async fn anonymous_users_cannot_write() {
    let f = Fixture::new();
    let form = recipe_form("soup", &[f.dinner.id], &[(f.onion.id, 1)]);

    let err = actions::create_recipe(&form, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Unauthenticated));
    assert_eq!(err.code(), 401);
}

#[tokio::test]
async fn deleting_a_recipe_removes_its_relations() {
    let f = Fixture::new();
    let anna = identity(&f.anna);
    let bo = identity(&f.bo);
    let recipe = actions::create_recipe(
        &recipe_form("soup", &[f.dinner.id], &[(f.onion.id, 1)]),
        &anna,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();
    actions::add_favorite(recipe.id, &bo, &f.media, &f.store)
        .await
        .unwrap();

    let err = actions::delete_recipe(recipe.id, &bo, &f.store)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Forbidden(_)));

    actions::delete_recipe(recipe.id, &anna, &f.store)
        .await
        .unwrap();

    let err = actions::get_recipe(recipe.id, &anna, &f.media, &f.store)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 404);
    assert!(actions::list_favorites(&bo, &f.media, &f.store)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn listing_filters_by_tag_and_favorites() {
    let f = Fixture::new();
    let anna = identity(&f.anna);
    let bo = identity(&f.bo);

    let porridge = actions::create_recipe(
        &recipe_form("porridge", &[f.breakfast.id], &[(f.salt.id, 1)]),
        &anna,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();
    let stew = actions::create_recipe(
        &recipe_form("stew", &[f.dinner.id], &[(f.onion.id, 2)]),
        &bo,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();
    actions::add_favorite(stew.id, &anna, &f.media, &f.store)
        .await
        .unwrap();

    let breakfast = RecipeFilter {
        tags: vec!["breakfast".to_owned()],
        ..RecipeFilter::default()
    };
    let found = actions::list_recipes(&breakfast, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap();
    assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![porridge.id]);

    let favorited = RecipeFilter {
        is_favorited: Some(true),
        ..RecipeFilter::default()
    };
    let found = actions::list_recipes(&favorited, &anna, &f.media, &f.store)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, stew.id);
    assert!(found[0].is_favorited);

    let found = actions::list_recipes(&favorited, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap();
    assert!(found.is_empty());

    let by_author = RecipeFilter {
        author: Some(f.anna.id),
        ..RecipeFilter::default()
    };
    let found = actions::list_recipes(&by_author, &bo, &f.media, &f.store)
        .await
        .unwrap();
    assert_eq!(found.iter().map(|r| r.id).collect::<Vec<_>>(), vec![porridge.id]);
}

#[tokio::test]
async fn catalogs_are_sorted_and_searchable() {
    let f = Fixture::new();

    let tags = actions::list_tags(&f.store).await.unwrap();
    assert_eq!(
        tags.iter().map(|t| t.slug.as_str()).collect::<Vec<_>>(),
        vec!["breakfast", "dinner"]
    );

    let found = actions::list_ingredients(Some("CA"), &f.store).await.unwrap();
    assert_eq!(found, vec![f.carrot.clone()]);

    let all = actions::list_ingredients(Some("  "), &f.store).await.unwrap();
    assert_eq!(all.len(), 3);

    let err = actions::get_tag(999, &f.store).await.unwrap_err();
    assert!(matches!(err, ActionError::Missing(_)));
}

#[tokio::test]
async fn negative_paging_is_a_validation_error() {
    let f = Fixture::new();
    let filter = RecipeFilter {
        limit: Some(-3),
        offset: -1,
        ..RecipeFilter::default()
    };

    let err = actions::list_recipes(&filter, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap_err();

    assert_eq!(err.code(), 400);
    match err {
        ActionError::Validation(errors) => {
            assert!(errors.contains("limit"));
            assert!(errors.contains("offset"));
        }
        other => panic!("unexpected {other:?}"),
    }

    let page = RecipeFilter {
        limit: Some(0),
        ..RecipeFilter::default()
    };
    assert!(actions::list_recipes(&page, &Identity::Anonymous, &f.media, &f.store)
        .await
        .unwrap()
        .is_empty());
}
