use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use warp::Reply;

use super::schema::{Recipe, RecipeLine};
use crate::constants::{
    SHOPPING_LIST_BULLET, SHOPPING_LIST_FILENAME, SHOPPING_LIST_INGREDIENTS,
    SHOPPING_LIST_RECIPES, SHOPPING_LIST_TITLE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientTotal {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

/// Summed ingredients of every recipe in a user's shopping cart.
///
/// Ingredients are grouped by name. When one name shows up with different
/// units the unit of the last line seen wins; amounts are added regardless.
/// A cart recipe without ingredient lines adds nothing, not even its name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShoppingList {
    /// Distinct names of the recipes that contributed a line, sorted.
    pub recipes: Vec<String>,
    /// Totals in the order each ingredient was first seen.
    pub ingredients: Vec<IngredientTotal>,
}

impl ShoppingList {
    /// Walks `cart` in order; each entry is a recipe and its ingredient lines.
    pub fn aggregate<'a, I>(cart: I) -> Self
    where
        I: IntoIterator<Item = (&'a Recipe, &'a [RecipeLine])>,
    {
        let mut recipes = BTreeSet::new();
        let mut ingredients: Vec<IngredientTotal> = vec![];
        let mut index: HashMap<&'a str, usize> = HashMap::new();

        for (recipe, lines) in cart {
            if !lines.is_empty() {
                recipes.insert(recipe.name.to_owned());
            }

            for line in lines {
                match index.get(line.name.as_str()) {
                    Some(&i) => {
                        let total = &mut ingredients[i];
                        total.amount += i64::from(line.amount);
                        total.measurement_unit = line.measurement_unit.to_owned();
                    }
                    None => {
                        index.insert(line.name.as_str(), ingredients.len());
                        ingredients.push(IngredientTotal {
                            name: line.name.to_owned(),
                            amount: i64::from(line.amount),
                            measurement_unit: line.measurement_unit.to_owned(),
                        });
                    }
                }
            }
        }

        Self {
            recipes: recipes.into_iter().collect(),
            ingredients,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty() && self.ingredients.is_empty()
    }

    pub fn render(&self) -> String {
        let mut lines = vec![SHOPPING_LIST_TITLE.to_owned()];

        lines.push(format!("\n{SHOPPING_LIST_RECIPES}"));
        for name in &self.recipes {
            lines.push(format!("{SHOPPING_LIST_BULLET}{name}"));
        }

        lines.push(format!("\n{SHOPPING_LIST_INGREDIENTS}"));
        for total in &self.ingredients {
            lines.push(format!(
                "{SHOPPING_LIST_BULLET}{}: {} {}",
                total.name, total.amount, total.measurement_unit
            ));
        }

        lines.join("\n")
    }

    /// The rendered list as a downloadable plain text attachment.
    pub fn into_reply(self) -> impl Reply {
        let reply = warp::reply::with_header(
            self.render(),
            "content-type",
            "text/plain; charset=utf-8",
        );

        warp::reply::with_header(
            reply,
            "content-disposition",
            format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
        )
    }
}
