use std::collections::HashMap;

use warp::Reply;

use crate::{
    authentication::{jwt::Identity, permissions::ActionType},
    database::{
        error::ActionResult,
        schema::{Id, RecipeLine, RecipeRelation},
        shopping_list::ShoppingList,
        store::Store,
    },
};

/// Totals of every recipe in the caller's cart. An empty cart gives an
/// empty list, not an error.
pub async fn shopping_list<S: Store>(identity: &Identity, store: &S) -> ActionResult<ShoppingList> {
    let session = identity.session(ActionType::ManageOwnShoppingCart)?;

    let recipes = store
        .list_related_recipes(RecipeRelation::ShoppingCart, session.user_id)
        .await?;
    let ids: Vec<Id> = recipes.iter().map(|r| r.id).collect();

    let mut lines: HashMap<Id, Vec<RecipeLine>> = HashMap::new();
    for line in store.list_recipe_lines(&ids).await? {
        lines.entry(line.recipe_id).or_default().push(line);
    }

    let list = ShoppingList::aggregate(recipes.iter().map(|recipe| {
        let recipe_lines = lines.get(&recipe.id).map_or(&[][..], Vec::as_slice);
        (recipe, recipe_lines)
    }));
    log::debug!(
        "> Shopping list of user {}: {} recipes, {} ingredients",
        session.user_id,
        list.recipes.len(),
        list.ingredients.len()
    );

    Ok(list)
}

/// The caller's shopping list as a `shopping_list.txt` attachment.
pub async fn download_shopping_list<S: Store>(
    identity: &Identity,
    store: &S,
) -> ActionResult<impl Reply> {
    Ok(shopping_list(identity, store).await?.into_reply())
}
