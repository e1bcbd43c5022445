use crate::{
    authentication::{jwt::Identity, permissions::ActionType},
    config::Config,
    database::{
        error::{ActionError, ActionResult, ValidationErrors},
        form::{Form, RecipeForm},
        schema::{Id, Recipe, RecipeFilter, RecipeRelation},
        store::Store,
        views::{IngredientAmount, Profile, RecipeView},
    },
    media::ImageResolver,
};

pub(super) fn recipe_missing() -> ActionError {
    ActionError::Missing("Recipe not found".to_owned())
}

/// Rejects tag and ingredient ids that are not in the catalogs.
async fn check_references<S: Store>(form: &RecipeForm, store: &S) -> ActionResult<()> {
    let mut errors = ValidationErrors::new();

    let tags = store.find_tags(&form.tags).await?;
    if tags.len() != form.tags.len() {
        errors.add("tags", "Tag not found.");
    }

    let ids: Vec<Id> = form.ingredients.iter().map(|l| l.ingredient_id).collect();
    let ingredients = store.find_ingredients(&ids).await?;
    if ingredients.len() != ids.len() {
        errors.add("ingredients", "Ingredient not found.");
    }

    Ok(errors.into_result(())?)
}

fn check_page(filter: &RecipeFilter) -> ActionResult<()> {
    let mut errors = ValidationErrors::new();

    if filter.limit.map_or(false, |limit| limit < 0) {
        errors.add("limit", "Ensure this value is greater than or equal to 0.");
    }
    if filter.offset < 0 {
        errors.add("offset", "Ensure this value is greater than or equal to 0.");
    }

    Ok(errors.into_result(())?)
}

/// Assembles everything a client sees about `recipe`.
pub async fn recipe_view<S: Store>(
    recipe: Recipe,
    viewer: Option<Id>,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeView> {
    let author = store
        .get_user(recipe.author_id)
        .await?
        .ok_or_else(|| ActionError::Missing("User not found".to_owned()))?;

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            user_id != author.id && store.has_follow(user_id, author.id).await?,
            store
                .has_relation(RecipeRelation::Favorite, user_id, recipe.id)
                .await?,
            store
                .has_relation(RecipeRelation::ShoppingCart, user_id, recipe.id)
                .await?,
        ),
        None => (false, false, false),
    };

    let tags = store.list_recipe_tags(recipe.id).await?;
    let ingredients = store
        .list_recipe_lines(&[recipe.id])
        .await?
        .into_iter()
        .map(IngredientAmount::from)
        .collect();

    Ok(RecipeView {
        id: recipe.id,
        author: Profile::new(author, is_subscribed, media),
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        image: media.resolve_opt(recipe.image.as_deref()),
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        created_at: recipe.created_at,
    })
}

pub async fn create_recipe<S: Store>(
    form: &Form,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeView> {
    let session = identity.session(ActionType::CreateRecipes)?;

    let form = RecipeForm::validate_new(form)?;
    check_references(&form, store).await?;

    let recipe = store
        .create_recipe(session.user_id, &form.info, &form.tags, &form.ingredients)
        .await?;
    log::debug!("> User {} created recipe {}", session.user_id, recipe.id);

    recipe_view(recipe, Some(session.user_id), media, store).await
}

/// Overwrites a recipe the caller authored. The tag set and the ingredient
/// lines are replaced as a whole.
pub async fn update_recipe<S: Store>(
    recipe_id: Id,
    form: &Form,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeView> {
    let session = identity.session(ActionType::ManageOwnRecipes)?;

    let recipe = store.get_recipe(recipe_id).await?.ok_or_else(recipe_missing)?;
    if !session.is_author(&recipe) {
        log::debug!(
            "> User {} tried to edit recipe {} of user {}",
            session.user_id,
            recipe.id,
            recipe.author_id
        );
        return Err(ActionError::Forbidden(
            "You can only edit your own recipes".to_owned(),
        ));
    }

    let form = RecipeForm::validate(form)?;
    check_references(&form, store).await?;

    let recipe = store
        .update_recipe(recipe_id, &form.info, &form.tags, &form.ingredients)
        .await?;
    log::debug!("> User {} updated recipe {}", session.user_id, recipe.id);

    recipe_view(recipe, Some(session.user_id), media, store).await
}

pub async fn delete_recipe<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<()> {
    let session = identity.session(ActionType::ManageOwnRecipes)?;

    let recipe = store.get_recipe(recipe_id).await?.ok_or_else(recipe_missing)?;
    if !session.is_author(&recipe) {
        return Err(ActionError::Forbidden(
            "You can only delete your own recipes".to_owned(),
        ));
    }

    if !store.delete_recipe(recipe_id).await? {
        return Err(recipe_missing());
    }
    log::debug!("> User {} deleted recipe {}", session.user_id, recipe_id);

    Ok(())
}

pub async fn get_recipe<S: Store>(
    recipe_id: Id,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<RecipeView> {
    identity.authenticate(ActionType::ReadRecipes)?;

    let recipe = store.get_recipe(recipe_id).await?.ok_or_else(recipe_missing)?;

    recipe_view(recipe, identity.user_id(), media, store).await
}

pub async fn list_recipes<S: Store>(
    filter: &RecipeFilter,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Vec<RecipeView>> {
    identity.authenticate(ActionType::ReadRecipes)?;
    check_page(filter)?;

    let viewer = identity.user_id();
    let recipes = store.list_recipes(filter, viewer).await?;

    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(recipe, viewer, media, store).await?);
    }

    Ok(views)
}

/// Absolute link to a recipe page.
pub fn recipe_link(recipe_id: Id, config: &Config) -> String {
    format!(
        "{}/recipes/{}",
        config.site_url.trim_end_matches('/'),
        recipe_id
    )
}
