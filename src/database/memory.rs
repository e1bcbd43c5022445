use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{
    error::QueryError,
    schema::{
        Id, Ingredient, NewRecipeLine, Recipe, RecipeFilter, RecipeInfo, RecipeLine,
        RecipeRelation, Tag, User,
    },
    store::{QueryResult, Store},
};
use crate::constants::RECIPE_COUNT_PER_PAGE;

#[derive(Debug, Clone)]
struct LineRow {
    recipe_id: Id,
    ingredient_id: Id,
    amount: i32,
}

#[derive(Debug, Default)]
struct Tables {
    sequence: Id,
    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_tags: Vec<(Id, Id)>,
    lines: Vec<LineRow>,
    favorites: Vec<(Id, Id)>,
    shopping_cart: Vec<(Id, Id)>,
    follows: Vec<(Id, Id)>,
}

impl Tables {
    fn next_id(&mut self) -> Id {
        self.sequence += 1;
        self.sequence
    }

    fn relation(&self, relation: RecipeRelation) -> &Vec<(Id, Id)> {
        match relation {
            RecipeRelation::Favorite => &self.favorites,
            RecipeRelation::ShoppingCart => &self.shopping_cart,
        }
    }

    fn relation_mut(&mut self, relation: RecipeRelation) -> &mut Vec<(Id, Id)> {
        match relation {
            RecipeRelation::Favorite => &mut self.favorites,
            RecipeRelation::ShoppingCart => &mut self.shopping_cart,
        }
    }

    /// Mirrors the foreign keys of the sql schema.
    fn check_references(&self, tags: &[Id], lines: &[NewRecipeLine]) -> QueryResult<()> {
        if let Some(id) = tags.iter().find(|id| !self.tags.iter().any(|t| t.id == **id)) {
            return Err(QueryError::new(format!("Tag {id} does not exist")));
        }
        if let Some(line) = lines
            .iter()
            .find(|l| !self.ingredients.iter().any(|i| i.id == l.ingredient_id))
        {
            return Err(QueryError::new(format!(
                "Ingredient {} does not exist",
                line.ingredient_id
            )));
        }
        for (i, line) in lines.iter().enumerate() {
            if lines[..i].iter().any(|l| l.ingredient_id == line.ingredient_id) {
                return Err(QueryError::new(format!(
                    "Duplicate ingredient {} (recipe_ingredients_recipe_id_ingredient_id_key)",
                    line.ingredient_id
                )));
            }
        }
        Ok(())
    }

    fn replace_associations(&mut self, recipe_id: Id, tags: &[Id], lines: &[NewRecipeLine]) {
        self.recipe_tags.retain(|(recipe, _)| *recipe != recipe_id);
        self.recipe_tags
            .extend(tags.iter().map(|tag_id| (recipe_id, *tag_id)));

        self.lines.retain(|line| line.recipe_id != recipe_id);
        self.lines.extend(lines.iter().map(|line| LineRow {
            recipe_id,
            ingredient_id: line.ingredient_id,
            amount: line.amount,
        }));
    }

    fn matches(&self, recipe: &Recipe, filter: &RecipeFilter, viewer: Option<Id>) -> bool {
        if filter.author.map_or(false, |author| author != recipe.author_id) {
            return false;
        }

        if !filter.tags.is_empty() {
            let tagged = self
                .recipe_tags
                .iter()
                .filter(|(r, _)| *r == recipe.id)
                .filter_map(|(_, tag_id)| self.tags.iter().find(|t| t.id == *tag_id))
                .any(|tag| filter.tags.contains(&tag.slug));
            if !tagged {
                return false;
            }
        }

        let related = |relation: RecipeRelation, wanted: Option<bool>| match (wanted, viewer) {
            (None, _) => true,
            (Some(wanted), None) => !wanted,
            (Some(wanted), Some(user_id)) => {
                self.relation(relation).contains(&(user_id, recipe.id)) == wanted
            }
        };

        related(RecipeRelation::Favorite, filter.is_favorited)
            && related(RecipeRelation::ShoppingCart, filter.is_in_shopping_cart)
    }
}

fn newest_first(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// An in-process `Store` with the same constraints as the sql schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> QueryResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_e| QueryError::new("Store lock poisoned".to_owned()))
    }

    pub fn add_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> QueryResult<User> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(QueryError::new(format!("User {username} already exists")));
        }

        let user = User {
            id: tables.next_id(),
            email: format!("{username}@example.com"),
            username: username.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            avatar: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    pub fn add_tag(&self, name: &str, slug: &str) -> QueryResult<Tag> {
        let mut tables = self.tables()?;
        if tables.tags.iter().any(|t| t.name == name || t.slug == slug) {
            return Err(QueryError::new(format!("Tag {name} already exists")));
        }

        let tag = Tag {
            id: tables.next_id(),
            name: name.to_owned(),
            slug: slug.to_owned(),
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> QueryResult<Ingredient> {
        let mut tables = self.tables()?;
        if tables.ingredients.iter().any(|i| i.name == name) {
            return Err(QueryError::new(format!("Ingredient {name} already exists")));
        }

        let ingredient = Ingredient {
            id: tables.next_id(),
            name: name.to_owned(),
            measurement_unit: measurement_unit.to_owned(),
        };
        tables.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    /// Removes a user and everything that references them.
    pub fn delete_user(&self, user_id: Id) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != user_id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let authored: Vec<Id> = tables
            .recipes
            .iter()
            .filter(|r| r.author_id == user_id)
            .map(|r| r.id)
            .collect();
        for recipe_id in authored {
            delete_recipe_rows(&mut tables, recipe_id);
        }
        tables.favorites.retain(|(user, _)| *user != user_id);
        tables.shopping_cart.retain(|(user, _)| *user != user_id);
        tables
            .follows
            .retain(|(user, following)| *user != user_id && *following != user_id);
        Ok(true)
    }
}

fn delete_recipe_rows(tables: &mut Tables, recipe_id: Id) -> bool {
    let before = tables.recipes.len();
    tables.recipes.retain(|r| r.id != recipe_id);
    if tables.recipes.len() == before {
        return false;
    }

    tables.recipe_tags.retain(|(recipe, _)| *recipe != recipe_id);
    tables.lines.retain(|line| line.recipe_id != recipe_id);
    tables.favorites.retain(|(_, recipe)| *recipe != recipe_id);
    tables.shopping_cart.retain(|(_, recipe)| *recipe != recipe_id);
    true
}

fn by_name<T, F>(mut rows: Vec<T>, name: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    rows.sort_by(|a, b| name(a).cmp(name(b)));
    rows
}

impl Store for MemoryStore {
    async fn get_user(&self, id: Id) -> QueryResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_tags(&self) -> QueryResult<Vec<Tag>> {
        let tables = self.tables()?;
        Ok(by_name(tables.tags.clone(), |t| t.name.as_str()))
    }

    async fn get_tag(&self, id: Id) -> QueryResult<Option<Tag>> {
        let tables = self.tables()?;
        Ok(tables.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tags(&self, ids: &[Id]) -> QueryResult<Vec<Tag>> {
        let tables = self.tables()?;
        let tags = tables
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect();
        Ok(by_name(tags, |t| t.name.as_str()))
    }

    async fn list_ingredients(&self, prefix: Option<&str>) -> QueryResult<Vec<Ingredient>> {
        let tables = self.tables()?;
        let prefix = prefix.map(str::to_lowercase).unwrap_or_default();
        let ingredients = tables
            .ingredients
            .iter()
            .filter(|i| i.name.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        Ok(by_name(ingredients, |i| i.name.as_str()))
    }

    async fn get_ingredient(&self, id: Id) -> QueryResult<Option<Ingredient>> {
        let tables = self.tables()?;
        Ok(tables.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn find_ingredients(&self, ids: &[Id]) -> QueryResult<Vec<Ingredient>> {
        let tables = self.tables()?;
        let ingredients = tables
            .ingredients
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect();
        Ok(by_name(ingredients, |i| i.name.as_str()))
    }

    async fn get_recipe(&self, id: Id) -> QueryResult<Option<Recipe>> {
        let tables = self.tables()?;
        Ok(tables.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Id>,
    ) -> QueryResult<Vec<Recipe>> {
        let tables = self.tables()?;
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .iter()
            .filter(|r| tables.matches(r, filter, viewer))
            .cloned()
            .collect();
        newest_first(&mut recipes);

        let limit = filter.limit.unwrap_or(RECIPE_COUNT_PER_PAGE).max(0) as usize;
        Ok(recipes
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(limit)
            .collect())
    }

    async fn list_recipe_tags(&self, recipe_id: Id) -> QueryResult<Vec<Tag>> {
        let tables = self.tables()?;
        let tags = tables
            .recipe_tags
            .iter()
            .filter(|(recipe, _)| *recipe == recipe_id)
            .filter_map(|(_, tag_id)| tables.tags.iter().find(|t| t.id == *tag_id))
            .cloned()
            .collect();
        Ok(by_name(tags, |t| t.name.as_str()))
    }

    async fn list_recipe_lines(&self, recipe_ids: &[Id]) -> QueryResult<Vec<RecipeLine>> {
        let tables = self.tables()?;
        Ok(tables
            .lines
            .iter()
            .filter(|line| recipe_ids.contains(&line.recipe_id))
            .filter_map(|line| {
                tables
                    .ingredients
                    .iter()
                    .find(|i| i.id == line.ingredient_id)
                    .map(|ingredient| RecipeLine {
                        recipe_id: line.recipe_id,
                        ingredient_id: ingredient.id,
                        name: ingredient.name.to_owned(),
                        measurement_unit: ingredient.measurement_unit.to_owned(),
                        amount: line.amount,
                    })
            })
            .collect())
    }

    async fn create_recipe(
        &self,
        author_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> QueryResult<Recipe> {
        let mut tables = self.tables()?;
        if !tables.users.iter().any(|u| u.id == author_id) {
            return Err(QueryError::new(format!("User {author_id} does not exist")));
        }
        tables.check_references(tags, lines)?;

        let recipe = Recipe {
            id: tables.next_id(),
            author_id,
            name: info.name.to_owned(),
            text: info.text.to_owned(),
            cooking_time: info.cooking_time,
            image: info.image.to_owned(),
            created_at: Utc::now(),
        };
        tables.recipes.push(recipe.clone());
        tables.replace_associations(recipe.id, tags, lines);

        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        recipe_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> QueryResult<Recipe> {
        let mut tables = self.tables()?;
        tables.check_references(tags, lines)?;

        let recipe = match tables.recipes.iter_mut().find(|r| r.id == recipe_id) {
            Some(recipe) => recipe,
            None => return Err(QueryError::new(format!("RowNotFound"))),
        };
        recipe.name = info.name.to_owned();
        recipe.text = info.text.to_owned();
        recipe.cooking_time = info.cooking_time;
        if let Some(image) = &info.image {
            recipe.image = Some(image.to_owned());
        }
        let recipe = recipe.clone();

        tables.replace_associations(recipe_id, tags, lines);

        Ok(recipe)
    }

    async fn delete_recipe(&self, recipe_id: Id) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        Ok(delete_recipe_rows(&mut tables, recipe_id))
    }

    async fn count_author_recipes(&self, author_id: Id) -> QueryResult<i64> {
        let tables = self.tables()?;
        Ok(tables
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .count() as i64)
    }

    async fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> QueryResult<Vec<Recipe>> {
        let tables = self.tables()?;
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .iter()
            .filter(|r| r.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut recipes);

        if let Some(limit) = limit {
            recipes.truncate(limit.max(0) as usize);
        }
        Ok(recipes)
    }

    async fn insert_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        if !tables.recipes.iter().any(|r| r.id == recipe_id) {
            return Err(QueryError::new(format!("Recipe {recipe_id} does not exist")));
        }

        let rows = tables.relation_mut(relation);
        if rows.contains(&(user_id, recipe_id)) {
            return Ok(false);
        }
        rows.push((user_id, recipe_id));
        Ok(true)
    }

    async fn delete_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        let rows = tables.relation_mut(relation);
        let before = rows.len();
        rows.retain(|pair| *pair != (user_id, recipe_id));
        Ok(rows.len() != before)
    }

    async fn has_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let tables = self.tables()?;
        Ok(tables.relation(relation).contains(&(user_id, recipe_id)))
    }

    async fn list_related_recipes(
        &self,
        relation: RecipeRelation,
        user_id: Id,
    ) -> QueryResult<Vec<Recipe>> {
        let tables = self.tables()?;
        Ok(tables
            .relation(relation)
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, recipe_id)| tables.recipes.iter().find(|r| r.id == *recipe_id))
            .cloned()
            .collect())
    }

    async fn insert_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        if user_id == following_id {
            return Err(QueryError::new(format!(
                "User {user_id} cannot follow themselves (follows_no_self_follow)"
            )));
        }
        if tables.follows.contains(&(user_id, following_id)) {
            return Ok(false);
        }
        tables.follows.push((user_id, following_id));
        Ok(true)
    }

    async fn delete_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let mut tables = self.tables()?;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|pair| *pair != (user_id, following_id));
        Ok(tables.follows.len() != before)
    }

    async fn has_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let tables = self.tables()?;
        Ok(tables.follows.contains(&(user_id, following_id)))
    }

    async fn list_following(&self, user_id: Id) -> QueryResult<Vec<User>> {
        let tables = self.tables()?;
        Ok(tables
            .follows
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, following)| tables.users.iter().find(|u| u.id == *following))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> RecipeInfo {
        RecipeInfo {
            name: name.to_owned(),
            text: "text".to_owned(),
            cooking_time: 10,
            image: Some("recipes/images/a.png".to_owned()),
        }
    }

    #[tokio::test]
    async fn update_replaces_lines_wholesale() -> QueryResult<()> {
        let store = MemoryStore::new();
        let author = store.add_user("cook", "Ann", "Cook")?;
        let tag = store.add_tag("Dinner", "dinner")?;
        let salt = store.add_ingredient("salt", "g")?;
        let rice = store.add_ingredient("rice", "g")?;

        let first = [NewRecipeLine {
            ingredient_id: salt.id,
            amount: 1,
        }];
        let recipe = store
            .create_recipe(author.id, &info("Rice"), &[tag.id], &first)
            .await?;

        let second = [NewRecipeLine {
            ingredient_id: rice.id,
            amount: 200,
        }];
        store
            .update_recipe(recipe.id, &info("Rice"), &[tag.id], &second)
            .await?;

        let lines = store.list_recipe_lines(&[recipe.id]).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].ingredient_id, rice.id);
        assert_eq!(lines[0].amount, 200);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_update_leaves_recipe_untouched() -> QueryResult<()> {
        let store = MemoryStore::new();
        let author = store.add_user("cook", "Ann", "Cook")?;
        let tag = store.add_tag("Dinner", "dinner")?;
        let salt = store.add_ingredient("salt", "g")?;
        let lines = [NewRecipeLine {
            ingredient_id: salt.id,
            amount: 1,
        }];
        let recipe = store
            .create_recipe(author.id, &info("Soup"), &[tag.id], &lines)
            .await?;

        let unknown = [NewRecipeLine {
            ingredient_id: 999,
            amount: 1,
        }];
        assert!(store
            .update_recipe(recipe.id, &info("Other"), &[tag.id], &unknown)
            .await
            .is_err());

        let stored = store.get_recipe(recipe.id).await?.expect("recipe exists");
        assert_eq!(stored.name, "Soup");
        assert_eq!(store.list_recipe_lines(&[recipe.id]).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() -> QueryResult<()> {
        let store = MemoryStore::new();
        let author = store.add_user("cook", "Ann", "Cook")?;
        let reader = store.add_user("reader", "Bob", "Reader")?;
        let tag = store.add_tag("Dinner", "dinner")?;
        let salt = store.add_ingredient("salt", "g")?;
        let lines = [NewRecipeLine {
            ingredient_id: salt.id,
            amount: 1,
        }];
        let recipe = store
            .create_recipe(author.id, &info("Soup"), &[tag.id], &lines)
            .await?;
        store
            .insert_relation(RecipeRelation::ShoppingCart, reader.id, recipe.id)
            .await?;
        store.insert_follow(reader.id, author.id).await?;

        assert!(store.delete_user(author.id)?);

        assert!(store.get_recipe(recipe.id).await?.is_none());
        assert!(store
            .list_related_recipes(RecipeRelation::ShoppingCart, reader.id)
            .await?
            .is_empty());
        assert!(!store.has_follow(reader.id, author.id).await?);
        Ok(())
    }
}
