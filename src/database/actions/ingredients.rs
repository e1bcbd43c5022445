use crate::database::{
    error::{ActionError, ActionResult},
    schema::{Id, Ingredient},
    store::Store,
};

/// Catalog entries, optionally narrowed to names starting with `prefix`.
pub async fn list_ingredients<S: Store>(
    prefix: Option<&str>,
    store: &S,
) -> ActionResult<Vec<Ingredient>> {
    let prefix = prefix.map(str::trim).filter(|p| !p.is_empty());

    Ok(store.list_ingredients(prefix).await?)
}

pub async fn get_ingredient<S: Store>(id: Id, store: &S) -> ActionResult<Ingredient> {
    store
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ActionError::Missing("Ingredient not found".to_owned()))
}
