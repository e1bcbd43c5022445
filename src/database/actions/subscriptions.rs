use crate::{
    authentication::{jwt::Identity, permissions::ActionType},
    database::{
        error::{ActionError, ActionResult, ValidationErrors},
        schema::{Id, User},
        store::Store,
        views::{Profile, RecipeCard, Subscription},
    },
    media::ImageResolver,
};

fn user_missing() -> ActionError {
    ActionError::Missing("User not found".to_owned())
}

fn check_limit(recipes_limit: Option<i64>) -> ActionResult<()> {
    match recipes_limit {
        Some(limit) if limit < 0 => Err(ValidationErrors::single(
            "recipes_limit",
            "Ensure this value is greater than or equal to 0.",
        )
        .into()),
        _ => Ok(()),
    }
}

async fn subscription<S: Store>(
    author: User,
    recipes_limit: Option<i64>,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Subscription> {
    let recipes_count = store.count_author_recipes(author.id).await?;
    let recipes = store
        .list_author_recipes(author.id, recipes_limit)
        .await?
        .iter()
        .map(|recipe| RecipeCard::new(recipe, media))
        .collect();

    Ok(Subscription {
        profile: Profile::new(author, true, media),
        recipes,
        recipes_count,
    })
}

/// Follows `author_id`. Following yourself is refused before anything else
/// is looked at.
pub async fn subscribe<S: Store>(
    author_id: Id,
    recipes_limit: Option<i64>,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Subscription> {
    let session = identity.session(ActionType::ManageOwnSubscriptions)?;
    if session.user_id == author_id {
        log::debug!("> User {} tried to subscribe to themselves", author_id);
        return Err(ActionError::SelfReference(
            "You cannot subscribe to yourself".to_owned(),
        ));
    }
    check_limit(recipes_limit)?;

    let author = store.get_user(author_id).await?.ok_or_else(user_missing)?;
    if !store.insert_follow(session.user_id, author_id).await? {
        return Err(ActionError::Conflict(
            "You are already subscribed to this user".to_owned(),
        ));
    }
    log::debug!("> User {} subscribed to {}", session.user_id, author_id);

    subscription(author, recipes_limit, media, store).await
}

pub async fn unsubscribe<S: Store>(
    author_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<()> {
    let session = identity.session(ActionType::ManageOwnSubscriptions)?;
    if session.user_id == author_id {
        return Err(ActionError::SelfReference(
            "You cannot unsubscribe from yourself".to_owned(),
        ));
    }

    store.get_user(author_id).await?.ok_or_else(user_missing)?;
    if !store.delete_follow(session.user_id, author_id).await? {
        return Err(ActionError::NotFound(
            "You are not subscribed to this user".to_owned(),
        ));
    }

    Ok(())
}

pub async fn is_subscribed<S: Store>(
    author_id: Id,
    identity: &Identity,
    store: &S,
) -> ActionResult<bool> {
    match identity.user_id() {
        Some(user_id) if user_id != author_id => Ok(store.has_follow(user_id, author_id).await?),
        _ => Ok(false),
    }
}

pub async fn list_subscriptions<S: Store>(
    recipes_limit: Option<i64>,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Vec<Subscription>> {
    let session = identity.session(ActionType::ManageOwnSubscriptions)?;
    check_limit(recipes_limit)?;

    let following = store.list_following(session.user_id).await?;
    let mut subscriptions = Vec::with_capacity(following.len());
    for author in following {
        subscriptions.push(subscription(author, recipes_limit, media, store).await?);
    }

    Ok(subscriptions)
}

pub async fn get_profile<S: Store>(
    user_id: Id,
    identity: &Identity,
    media: &dyn ImageResolver,
    store: &S,
) -> ActionResult<Profile> {
    let user = store.get_user(user_id).await?.ok_or_else(user_missing)?;
    let is_subscribed = is_subscribed(user_id, identity, store).await?;

    Ok(Profile::new(user, is_subscribed, media))
}
