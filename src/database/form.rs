use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::{
    error::{TypeError, ValidationErrors},
    schema::{Id, NewRecipeLine, RecipeInfo},
};
use crate::constants::{
    MAX_AMOUNT, MAX_COOKING_TIME, MIN_AMOUNT, MIN_COOKING_TIME, RECIPE_NAME_MAX_LENGTH,
};

pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    /// Accepts a JSON object; anything else reads as an empty form.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                inner: map.into_iter().collect(),
            },
            _ => Self {
                inner: HashMap::new(),
            },
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.get(key).map_or(false, |value| !value.is_null())
    }

    pub fn get_value(&self, key: &str) -> Result<&Value, TypeError> {
        match self.inner.get(key) {
            Some(Value::Null) | None => Err(TypeError::new("This field is required.")),
            Some(value) => Ok(value),
        }
    }

    pub fn get_number(&self, key: &str) -> Result<i64, TypeError> {
        parse_integer(self.get_value(key)?)
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.get_value(key)?.as_str() {
            Some(v) => Ok(v.to_string()),
            None => Err(TypeError::new("A valid string is required.")),
        }
    }

    pub fn get_list(&self, key: &str) -> Result<&Vec<Value>, TypeError> {
        match self.get_value(key)?.as_array() {
            Some(list) => Ok(list),
            None => Err(TypeError::new("Expected a list of items.")),
        }
    }
}

/// Integers arrive either as JSON numbers or as strings of digits.
pub fn parse_integer(value: &Value) -> Result<i64, TypeError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| TypeError::new("A valid integer is required.")),
        Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => s
            .parse()
            .map_err(|_e| TypeError::new("A valid integer is required.")),
        _ => Err(TypeError::new("A valid integer is required.")),
    }
}

fn parse_id(value: &Value) -> Result<Id, TypeError> {
    let id = parse_integer(value)?;
    Id::try_from(id).map_err(|_e| TypeError::new("Invalid id."))
}

/// A recipe submission that passed every field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeForm {
    pub info: RecipeInfo,
    pub tags: Vec<Id>,
    pub ingredients: Vec<NewRecipeLine>,
}

impl RecipeForm {
    /// Runs every field rule and reports all failing fields at once.
    pub fn validate(form: &Form) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = validate_name(form).map_err(|e| errors.add("name", &e)).ok();
        let text = validate_text(form).map_err(|e| errors.add("text", &e)).ok();
        let cooking_time = validate_cooking_time(form)
            .map_err(|e| errors.add("cooking_time", &e))
            .ok();
        let image = validate_image(form)
            .map_err(|e| errors.add("image", &e))
            .ok();
        let tags = validate_tags(form).map_err(|e| errors.add("tags", &e)).ok();
        let ingredients = validate_ingredients(form)
            .map_err(|e| errors.add("ingredients", &e))
            .ok();

        match (name, text, cooking_time, image, tags, ingredients) {
            (Some(name), Some(text), Some(cooking_time), Some(image), Some(tags), Some(ingredients))
                if errors.is_empty() =>
            {
                Ok(Self {
                    info: RecipeInfo {
                        name,
                        text,
                        cooking_time,
                        image,
                    },
                    tags,
                    ingredients,
                })
            }
            _ => Err(errors),
        }
    }

    /// Creating a recipe additionally requires an image.
    pub fn validate_new(form: &Form) -> Result<Self, ValidationErrors> {
        let result = Self::validate(form);
        if form.contains("image") {
            return result;
        }

        let mut errors = match result {
            Ok(_) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        errors.add("image", "This field is required.");
        Err(errors)
    }
}

fn validate_name(form: &Form) -> Result<String, String> {
    let name = form.get_str("name").map_err(|e| e.info().to_owned())?;
    let name = name.trim();

    if name.is_empty() {
        return Err("This field may not be blank.".to_owned());
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {RECIPE_NAME_MAX_LENGTH} characters."
        ));
    }

    Ok(name.to_owned())
}

fn validate_text(form: &Form) -> Result<String, String> {
    let text = form.get_str("text").map_err(|e| e.info().to_owned())?;
    if text.trim().is_empty() {
        return Err("This field may not be blank.".to_owned());
    }

    Ok(text)
}

fn validate_cooking_time(form: &Form) -> Result<i32, String> {
    let time = form
        .get_number("cooking_time")
        .map_err(|e| e.info().to_owned())?;

    if time < MIN_COOKING_TIME {
        return Err(format!(
            "Cooking time must be at least {MIN_COOKING_TIME} minute."
        ));
    }
    if time > MAX_COOKING_TIME {
        return Err(format!(
            "Cooking time must be at most {MAX_COOKING_TIME} minutes."
        ));
    }

    Ok(time as i32)
}

fn validate_image(form: &Form) -> Result<Option<String>, String> {
    if !form.contains("image") {
        return Ok(None);
    }

    let image = form.get_str("image").map_err(|e| e.info().to_owned())?;
    match image.trim().is_empty() {
        true => Err("This field may not be blank.".to_owned()),
        false => Ok(Some(image)),
    }
}

fn validate_tags(form: &Form) -> Result<Vec<Id>, String> {
    let list = form.get_list("tags").map_err(|e| e.info().to_owned())?;
    if list.is_empty() {
        return Err("At least one tag is required.".to_owned());
    }

    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(list.len());
    for value in list {
        let id = parse_id(value).map_err(|e| format!("Invalid tag id: {}", e.info()))?;
        if !seen.insert(id) {
            return Err("Tags must be unique.".to_owned());
        }
        tags.push(id);
    }

    Ok(tags)
}

fn validate_ingredients(form: &Form) -> Result<Vec<NewRecipeLine>, String> {
    let list = form
        .get_list("ingredients")
        .map_err(|e| e.info().to_owned())?;
    if list.is_empty() {
        return Err("At least one ingredient is required.".to_owned());
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(list.len());
    for item in list {
        let item = match item.as_object() {
            Some(item) => item,
            None => return Err("Each ingredient must be an object with id and amount.".to_owned()),
        };

        let ingredient_id = match item.get("id") {
            Some(value) => parse_id(value).map_err(|_e| "Ingredient not found.".to_owned())?,
            None => return Err("Ingredient not found.".to_owned()),
        };

        let amount = item
            .get("amount")
            .ok_or_else(|| TypeError::new("This field is required."))
            .and_then(parse_integer)
            .map_err(|_e| "Ingredient amount must be a number.".to_owned())?;
        if amount < MIN_AMOUNT {
            return Err(format!("Ingredient amount must be at least {MIN_AMOUNT}."));
        }
        if amount > MAX_AMOUNT {
            return Err(format!("Ingredient amount must be at most {MAX_AMOUNT}."));
        }

        lines.push(NewRecipeLine {
            ingredient_id,
            amount: amount as i32,
        });
        seen.insert(ingredient_id);
    }

    if seen.len() != lines.len() {
        return Err("Ingredients must be unique.".to_owned());
    }

    Ok(lines)
}
