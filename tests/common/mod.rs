#![allow(dead_code)]

use recipebox_sdk::{
    authentication::jwt::{Identity, SessionData},
    database::{
        form::Form,
        memory::MemoryStore,
        schema::{Id, Ingredient, Tag, User},
    },
    media::MediaUrl,
};
use serde_json::{json, Value};

/// A store seeded with two users and a small catalog.
pub struct Fixture {
    pub store: MemoryStore,
    pub media: MediaUrl,
    pub anna: User,
    pub bo: User,
    pub breakfast: Tag,
    pub dinner: Tag,
    pub onion: Ingredient,
    pub carrot: Ingredient,
    pub salt: Ingredient,
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStore::new();

        Self {
            anna: store.add_user("anna", "Anna", "Korhonen").unwrap(),
            bo: store.add_user("bo", "Bo", "Lind").unwrap(),
            breakfast: store.add_tag("Breakfast", "breakfast").unwrap(),
            dinner: store.add_tag("Dinner", "dinner").unwrap(),
            onion: store.add_ingredient("onion", "pcs").unwrap(),
            carrot: store.add_ingredient("carrot", "pcs").unwrap(),
            salt: store.add_ingredient("salt", "g").unwrap(),
            media: MediaUrl::new("/media"),
            store,
        }
    }
}

pub fn identity(user: &User) -> Identity {
    Identity::User(SessionData {
        user_id: user.id,
        username: user.username.to_owned(),
    })
}

pub fn recipe_payload(name: &str, tags: &[Id], ingredients: &[(Id, Value)]) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| json!({ "id": id, "amount": amount }))
        .collect();

    json!({
        "name": name,
        "text": "Chop, then simmer.",
        "cooking_time": 30,
        "image": format!("recipes/images/{name}.png"),
        "tags": tags,
        "ingredients": ingredients,
    })
}

pub fn recipe_form(name: &str, tags: &[Id], ingredients: &[(Id, i64)]) -> Form {
    let ingredients: Vec<(Id, Value)> = ingredients
        .iter()
        .map(|(id, amount)| (*id, json!(amount)))
        .collect();

    Form::from_json(recipe_payload(name, tags, &ingredients))
}
