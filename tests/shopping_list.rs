mod common;

use common::{identity, recipe_form, Fixture};
use recipebox_sdk::{
    authentication::jwt::Identity,
    database::{actions, error::ActionError, schema::Id, shopping_list::IngredientTotal},
};
use warp::Reply;

async fn recipe_in_cart(f: &Fixture, name: &str, lines: &[(Id, i64)]) -> Id {
    let anna = identity(&f.anna);
    let recipe = actions::create_recipe(
        &recipe_form(name, &[f.dinner.id], lines),
        &anna,
        &f.media,
        &f.store,
    )
    .await
    .unwrap();

    actions::add_to_shopping_cart(recipe.id, &anna, &f.media, &f.store)
        .await
        .unwrap();
    recipe.id
}

fn total(name: &str, amount: i64, unit: &str) -> IngredientTotal {
    IngredientTotal {
        name: name.to_owned(),
        amount,
        measurement_unit: unit.to_owned(),
    }
}

#[tokio::test]
async fn same_ingredient_is_summed_across_recipes() {
    let f = Fixture::new();
    recipe_in_cart(&f, "A", &[(f.onion.id, 2)]).await;
    recipe_in_cart(&f, "B", &[(f.onion.id, 3)]).await;

    let list = actions::shopping_list(&identity(&f.anna), &f.store)
        .await
        .unwrap();

    assert_eq!(list.ingredients, vec![total("onion", 5, "pcs")]);
    assert_eq!(list.recipes, vec!["A", "B"]);
}

#[tokio::test]
async fn recipes_are_sorted_and_ingredients_keep_first_seen_order() {
    let f = Fixture::new();
    recipe_in_cart(&f, "RecipeY", &[(f.carrot.id, 4)]).await;
    recipe_in_cart(&f, "RecipeX", &[(f.carrot.id, 1), (f.salt.id, 2)]).await;

    let list = actions::shopping_list(&identity(&f.anna), &f.store)
        .await
        .unwrap();

    assert_eq!(list.recipes, vec!["RecipeX", "RecipeY"]);
    assert_eq!(
        list.ingredients,
        vec![total("carrot", 5, "pcs"), total("salt", 2, "g")]
    );
}

#[tokio::test]
async fn only_the_callers_cart_counts() {
    let f = Fixture::new();
    recipe_in_cart(&f, "A", &[(f.onion.id, 2)]).await;

    let list = actions::shopping_list(&identity(&f.bo), &f.store)
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn empty_cart_downloads_an_empty_document() {
    let f = Fixture::new();

    let reply = actions::download_shopping_list(&identity(&f.anna), &f.store)
        .await
        .unwrap();
    let response = reply.into_response();

    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"shopping_list.txt\""
    );
    let body = warp::hyper::body::to_bytes(response.into_body())
        .await
        .unwrap();
    assert_eq!(&body[..], b"Shopping list:\n\nRecipes used:\n\nIngredients:");
}

#[tokio::test]
async fn download_renders_the_totals() {
    let f = Fixture::new();
    recipe_in_cart(&f, "RecipeX", &[(f.carrot.id, 1), (f.salt.id, 2)]).await;
    recipe_in_cart(&f, "RecipeY", &[(f.carrot.id, 4)]).await;

    let response = actions::download_shopping_list(&identity(&f.anna), &f.store)
        .await
        .unwrap()
        .into_response();
    let body = warp::hyper::body::to_bytes(response.into_body())
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8_lossy(&body),
        "Shopping list:\n\nRecipes used:\n- RecipeX\n- RecipeY\n\nIngredients:\n- carrot: 5 pcs\n- salt: 2 g"
    );
}

#[tokio::test]
async fn anonymous_has_no_shopping_list() {
    let f = Fixture::new();

    let err = actions::shopping_list(&Identity::Anonymous, &f.store)
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Unauthenticated));
}
