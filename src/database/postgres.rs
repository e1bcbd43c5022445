use sqlx::{postgres::PgPoolOptions, PgConnection, Pool, Postgres, QueryBuilder};

use super::{
    schema::{
        Id, Ingredient, NewRecipeLine, Recipe, RecipeFilter, RecipeInfo, RecipeLine,
        RecipeRelation, Tag, User,
    },
    store::{QueryResult, Store},
};
use crate::{config::Config, constants::RECIPE_COUNT_PER_PAGE};

/// `Store` backed by a Postgres pool; see `migrations/` for the schema.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> QueryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        log::info!("Connected to database ({} connections)", config.max_connections);
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> QueryResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Sets the tag set, then deletes every ingredient line and bulk inserts the
/// new ones. Must run inside the caller's transaction.
async fn replace_associations(
    conn: &mut PgConnection,
    recipe_id: Id,
    tags: &[Id],
    lines: &[NewRecipeLine],
) -> QueryResult<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::INTEGER[])")
        .bind(recipe_id)
        .bind(tags.to_vec())
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    builder.push_values(lines, |mut row, line| {
        row.push_bind(recipe_id)
            .push_bind(line.ingredient_id)
            .push_bind(line.amount);
    });
    builder.build().execute(&mut *conn).await?;

    Ok(())
}

impl Store for PgStore {
    async fn get_user(&self, id: Id) -> QueryResult<Option<User>> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_tags(&self) -> QueryResult<Vec<Tag>> {
        let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(list)
    }

    async fn get_tag(&self, id: Id) -> QueryResult<Option<Tag>> {
        let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn find_tags(&self, ids: &[Id]) -> QueryResult<Vec<Tag>> {
        let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = ANY($1) ORDER BY name")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(list)
    }

    async fn list_ingredients(&self, prefix: Option<&str>) -> QueryResult<Vec<Ingredient>> {
        let list: Vec<Ingredient> = sqlx::query_as(
            "
            SELECT * FROM ingredients
            WHERE $1::TEXT IS NULL OR starts_with(LOWER(name), LOWER($1))
            ORDER BY name
        ",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(list)
    }

    async fn get_ingredient(&self, id: Id) -> QueryResult<Option<Ingredient>> {
        let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_ingredients(&self, ids: &[Id]) -> QueryResult<Vec<Ingredient>> {
        let list: Vec<Ingredient> =
            sqlx::query_as("SELECT * FROM ingredients WHERE id = ANY($1) ORDER BY name")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?;

        Ok(list)
    }

    async fn get_recipe(&self, id: Id) -> QueryResult<Option<Recipe>> {
        let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<Id>,
    ) -> QueryResult<Vec<Recipe>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT r.* FROM recipes r WHERE TRUE");

        if let Some(author) = filter.author {
            builder.push(" AND r.author_id = ").push_bind(author);
        }

        if !filter.tags.is_empty() {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                     WHERE rt.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(filter.tags.clone())
                .push("))");
        }

        for (relation, wanted) in [
            (RecipeRelation::Favorite, filter.is_favorited),
            (RecipeRelation::ShoppingCart, filter.is_in_shopping_cart),
        ] {
            match (wanted, viewer) {
                (None, _) | (Some(false), None) => {}
                (Some(true), None) => {
                    builder.push(" AND FALSE");
                }
                (Some(wanted), Some(user_id)) => {
                    let exists = if wanted { "EXISTS" } else { "NOT EXISTS" };
                    builder
                        .push(format!(
                            " AND {exists} (SELECT 1 FROM {} x WHERE x.recipe_id = r.id AND x.user_id = ",
                            relation.table()
                        ))
                        .push_bind(user_id)
                        .push(")");
                }
            }
        }

        builder
            .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(filter.limit.unwrap_or(RECIPE_COUNT_PER_PAGE))
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows: Vec<Recipe> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows)
    }

    async fn list_recipe_tags(&self, recipe_id: Id) -> QueryResult<Vec<Tag>> {
        let list: Vec<Tag> = sqlx::query_as(
            "
            SELECT t.* FROM recipe_tags rt
            INNER JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = $1
            ORDER BY t.name
        ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(list)
    }

    async fn list_recipe_lines(&self, recipe_ids: &[Id]) -> QueryResult<Vec<RecipeLine>> {
        let rows: Vec<RecipeLine> = sqlx::query_as("
            SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.id
        ")
        .bind(recipe_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn create_recipe(
        &self,
        author_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> QueryResult<Recipe> {
        let mut tr = self.pool.begin().await?;

        let recipe: Recipe = sqlx::query_as(
            "
            INSERT INTO recipes (author_id, name, text, cooking_time, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        ",
        )
        .bind(author_id)
        .bind(info.name.as_str())
        .bind(info.text.as_str())
        .bind(info.cooking_time)
        .bind(info.image.as_deref())
        .fetch_one(&mut *tr)
        .await?;

        replace_associations(&mut tr, recipe.id, tags, lines).await?;
        tr.commit().await?;

        Ok(recipe)
    }

    async fn update_recipe(
        &self,
        recipe_id: Id,
        info: &RecipeInfo,
        tags: &[Id],
        lines: &[NewRecipeLine],
    ) -> QueryResult<Recipe> {
        let mut tr = self.pool.begin().await?;

        let recipe: Recipe = sqlx::query_as(
            "
            UPDATE recipes
            SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image)
            WHERE id = $5
            RETURNING *
        ",
        )
        .bind(info.name.as_str())
        .bind(info.text.as_str())
        .bind(info.cooking_time)
        .bind(info.image.as_deref())
        .bind(recipe_id)
        .fetch_one(&mut *tr)
        .await?;

        replace_associations(&mut tr, recipe_id, tags, lines).await?;
        tr.commit().await?;

        Ok(recipe)
    }

    async fn delete_recipe(&self, recipe_id: Id) -> QueryResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_author_recipes(&self, author_id: Id) -> QueryResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn list_author_recipes(
        &self,
        author_id: Id,
        limit: Option<i64>,
    ) -> QueryResult<Vec<Recipe>> {
        let rows: Vec<Recipe> = sqlx::query_as(
            "SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_relation(
        &self,
        relation: RecipeRelation,
        user_id: Id,
        recipe_id: Id,
    ) -> QueryResult<bool> {
        let row: Option<(Id,)> = sqlx::query_as(&format!(
            "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = $2",
            relation.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn list_related_recipes(
        &self,
        relation: RecipeRelation,
        user_id: Id,
    ) -> QueryResult<Vec<Recipe>> {
        let rows: Vec<Recipe> = sqlx::query_as(&format!(
            "SELECT r.* FROM {} x INNER JOIN recipes r ON r.id = x.recipe_id WHERE x.user_id = $1 ORDER BY x.id",
            relation.table()
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (user_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND following_id = $2")
            .bind(user_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_follow(&self, user_id: Id, following_id: Id) -> QueryResult<bool> {
        let row: Option<(Id,)> = sqlx::query_as(
            "SELECT following_id FROM follows WHERE user_id = $1 AND following_id = $2",
        )
        .bind(user_id)
        .bind(following_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn list_following(&self, user_id: Id) -> QueryResult<Vec<User>> {
        let rows: Vec<User> = sqlx::query_as(
            "
            SELECT u.* FROM follows f
            INNER JOIN users u ON u.id = f.following_id
            WHERE f.user_id = $1
            ORDER BY f.id
        ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
