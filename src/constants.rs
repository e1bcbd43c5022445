pub const RECIPE_COUNT_PER_PAGE: i64 = 6;

pub const RECIPE_NAME_MAX_LENGTH: usize = 256;

/// Amounts and cooking times are stored as positive small integers.
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32767;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32767;

pub const SHOPPING_LIST_TITLE: &str = "Shopping list:";
pub const SHOPPING_LIST_RECIPES: &str = "Recipes used:";
pub const SHOPPING_LIST_INGREDIENTS: &str = "Ingredients:";
pub const SHOPPING_LIST_BULLET: &str = "- ";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;
