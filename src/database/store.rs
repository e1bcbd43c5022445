use std::future::Future;

use super::{
    error::QueryError,
    schema::{
        Id, Ingredient, NewRecipeLine, Recipe, RecipeFilter, RecipeInfo, RecipeLine,
        RecipeRelation, Tag, User,
    },
};

pub type QueryResult<T> = Result<T, QueryError>;

/// Storage handle every action is given.
///
/// Implementations must make `create_recipe`, `update_recipe` and
/// `delete_recipe` atomic, and must enforce uniqueness of relation pairs
/// themselves: an insert of an existing pair reports `false` and writes
/// nothing.
pub trait Store: Send + Sync {
    fn get_user(&self, id: Id) -> impl Future<Output = QueryResult<Option<User>>> + Send;

    fn list_tags(&self) -> impl Future<Output = QueryResult<Vec<Tag>>> + Send;

    fn get_tag(&self, id: Id) -> impl Future<Output = QueryResult<Option<Tag>>> + Send;

    /// Existing tags among `ids`, ordered by name.
    fn find_tags(&self, ids: &[Id]) -> impl Future<Output = QueryResult<Vec<Tag>>> + Send;

    /// Ingredients whose name starts with `prefix`, ignoring case.
    fn list_ingredients(
        &self,
        prefix: Option<&str>,
    ) -> impl Future<Output = QueryResult<Vec<Ingredient>>> + Send;

    fn get_ingredient(&self, id: Id)
        -> impl Future<Output = QueryResult<Option<Ingredient>>> + Send;

    fn find_ingredients(
        &self,
        ids: &[Id],
    ) -> impl Future<Output = QueryResult<Vec<Ingredient>>> + Send;

    fn get_recipe(&self, id: Id) -> impl Future<Output = QueryResult<Option<Recipe>>> + Send;

    /// Newest first. `viewer` resolves the favorite and cart filters.
    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Id>,
    ) -> impl Future<Output = QueryResult<Vec<Recipe>>> + Send;

    fn list_recipe_tags(&self, recipe_id: Id)
        -> impl Future<Output = QueryResult<Vec<Tag>>> + Send;

    /// Lines of all given recipes, in insertion order.
    fn list_recipe_lines(
        &self,
        recipe_ids: &[Id],
    ) -> impl Future<Output = QueryResult<Vec<RecipeLine>>> + Send;

    fn create_recipe(
        &self,
        author_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> impl Future<Output = QueryResult<Recipe>> + Send;

    /// Overwrites the recipe columns, replaces the tag set and deletes every
    /// ingredient line before inserting `lines`. `info.image == None` keeps
    /// the stored image.
    fn update_recipe(
        &self,
        recipe_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> impl Future<Output = QueryResult<Recipe>> + Send;

    fn delete_recipe(&self, recipe_id: Id) -> impl Future<Output = QueryResult<bool>> + Send;

    fn count_author_recipes(&self, author_id: Id)
        -> impl Future<Output = QueryResult<i64>> + Send;

    /// Newest first, at most `limit` rows.
    fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> impl Future<Output = QueryResult<Vec<Recipe>>> + Send;

    fn insert_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    fn delete_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    fn has_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    /// Related recipes in the order they were added.
    fn list_related_recipes(
        &self,
        relation: RecipeRelation,
        user_id: Id,
    ) -> impl Future<Output = QueryResult<Vec<Recipe>>> + Send;

    fn insert_follow(
        &self,
        user_id: Id,
        following_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    fn delete_follow(
        &self,
        user_id: Id,
        following_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    fn has_follow(
        &self,
        user_id: Id,
        following_id: Id,
    ) -> impl Future<Output = QueryResult<bool>> + Send;

    /// Followed users in the order they were followed.
    fn list_following(&self, user_id: Id) -> impl Future<Output = QueryResult<Vec<User>>> + Send;
}
