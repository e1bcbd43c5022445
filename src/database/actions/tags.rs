use crate::database::{
    error::{ActionError, ActionResult},
    schema::{Id, Tag},
    store::Store,
};

pub async fn list_tags<S: Store>(store: &S) -> ActionResult<Vec<Tag>> {
    Ok(store.list_tags().await?)
}

pub async fn get_tag<S: Store>(id: Id, store: &S) -> ActionResult<Tag> {
    store
        .get_tag(id)
        .await?
        .ok_or_else(|| ActionError::Missing("Tag not found".to_owned()))
}
