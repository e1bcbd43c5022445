use super::recipes::recipe_missing;
use crate::{
    authentication::{jwt::Identity, permissions::ActionType},
    database::{
        error::{ActionError, ActionResult},
        schema::{Id, RecipeRelation},
        store::Store,
        views::RecipeCard,
    },
    media::ImageResolver,
};

fn action(relation: RecipeRelation) -> ActionType {
    match relation {
        RecipeRelation::Favorite => ActionType::ManageOwnFavorites,
        RecipeRelation::ShoppingCart => ActionType::ManageOwnShoppingCart,
    }
}

async fn add_relation<S: Store>(
    relation: RecipeRelation,
    recipe_id: Id,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeCard> {
    let session = identity.session(action(relation))?;
    let recipe = store.get_recipe(recipe_id).await?.ok_or_else(recipe_missing)?;

    if !store
        .insert_relation(relation, session.user_id, recipe_id)
        .await?
    {
        log::debug!(
            "> Recipe {} already in {} of user {}",
            recipe_id,
            relation.table(),
            session.user_id
        );
        return Err(ActionError::Conflict(relation.already_exists().to_owned()));
    }

    Ok(RecipeCard::new(&recipe, media))
}

async fn remove_relation<S: Store>(
    relation: RecipeRelation,
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<()> {
    let session = identity.session(action(relation))?;
    store.get_recipe(recipe_id).await?.ok_or_else(recipe_missing)?;

    if !store
        .delete_relation(relation, session.user_id, recipe_id)
        .await?
    {
        return Err(ActionError::NotFound(relation.missing().to_owned()));
    }

    Ok(())
}

/// Anonymous callers have nothing in their lists.
async fn has_relation<S: Store>(
    relation: RecipeRelation,
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<bool> {
    match identity.user_id() {
        Some(user_id) => Ok(store.has_relation(relation, user_id, recipe_id).await?),
        None => Ok(false),
    }
}

async fn list_relation<S: Store>(
    relation: RecipeRelation,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Vec<RecipeCard>> {
    let session = identity.session(action(relation))?;
    let recipes = store
        .list_related_recipes(relation, session.user_id)
        .await?;

    Ok(recipes
        .iter()
        .map(|recipe| RecipeCard::new(recipe, media))
        .collect())
}

pub async fn add_favorite<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeCard> {
    add_relation(RecipeRelation::Favorite, recipe_id, identity, media, store).await
}

pub async fn remove_favorite<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<()> {
    remove_relation(RecipeRelation::Favorite, recipe_id, identity, store).await
}

pub async fn is_favorited<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<bool> {
    has_relation(RecipeRelation::Favorite, recipe_id, identity, store).await
}

pub async fn list_favorites<S: Store>(
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Vec<RecipeCard>> {
    list_relation(RecipeRelation::Favorite, identity, media, store).await
}

pub async fn add_to_shopping_cart<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeCard> {
    add_relation(RecipeRelation::ShoppingCart, recipe_id, identity, media, store).await
}

pub async fn remove_from_shopping_cart<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<()> {
    remove_relation(RecipeRelation::ShoppingCart, recipe_id, identity, store).await
}

pub async fn is_in_shopping_cart<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<bool> {
    has_relation(RecipeRelation::ShoppingCart, recipe_id, identity, store).await
}

pub async fn list_shopping_cart<S: Store>(
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Vec<RecipeCard>> {
    list_relation(RecipeRelation::ShoppingCart, identity, media, store).await
}
