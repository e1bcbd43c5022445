use chrono::{DateTime, Utc};
use serde::Serialize;

use super::schema::{Id, Recipe, RecipeLine, Tag, User};
use crate::media::ImageResolver;

/// A user as seen by somebody else.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Profile {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl Profile {
    pub fn new(user: User, is_subscribed: bool, media: &dyn ImageResolver) -> Self {
        Self {
            avatar: media.resolve_opt(user.avatar.as_deref()),
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeLine> for IngredientAmount {
    fn from(line: RecipeLine) -> Self {
        Self {
            id: line.ingredient_id,
            name: line.name,
            measurement_unit: line.measurement_unit,
            amount: line.amount,
        }
    }
}

/// A recipe with everything a detail page shows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeView {
    pub id: Id,
    pub author: Profile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

/// The short form used in favorites, cart and subscription listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeCard {
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl RecipeCard {
    pub fn new(recipe: &Recipe, media: &dyn ImageResolver) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.to_owned(),
            image: media.resolve_opt(recipe.image.as_deref()),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// A followed author together with a preview of their recipes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Subscription {
    #[serde(flatten)]
    pub profile: Profile,
    pub recipes: Vec<RecipeCard>,
    pub recipes_count: i64,
}
