use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use super::{error::Error, schema::Uuid};
use crate::constants::{MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT, NAME_MAX_LENGTH};

/// One field of an update request: left alone, or replaced wholesale.
///
/// Fields using it must be marked `#[serde(default)]`, so that a key missing
/// from the payload deserializes to `Unchanged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unchanged,
    Replace(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Replace(value) => Patch::Replace(value),
        }
    }

    pub fn map<U, F>(self, f: F) -> Patch<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Replace(value) => Patch::Replace(f(value)),
        }
    }

    pub fn try_map<U, F>(self, f: F) -> Result<Patch<U>, Error>
    where
        F: FnOnce(T) -> Result<U, Error>,
    {
        match self {
            Patch::Unchanged => Ok(Patch::Unchanged),
            Patch::Replace(value) => f(value).map(Patch::Replace),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Unchanged => None,
            Patch::Replace(value) => Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Replace)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInt {
    Number(i64),
    Text(String),
}

impl LenientInt {
    fn into_i32<E: serde::de::Error>(self) -> Result<i32, E> {
        let value = match self {
            LenientInt::Number(value) => value,
            LenientInt::Text(value) => value
                .trim()
                .parse::<i64>()
                .map_err(|_e| E::custom("A valid integer is required"))?,
        };

        i32::try_from(value).map_err(|_e| E::custom("Integer is out of range"))
    }
}

/// Clients send integers either as JSON numbers or as numeric strings.
fn lenient_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    LenientInt::deserialize(deserializer)?.into_i32()
}

fn lenient_int_patch<'de, D>(deserializer: D) -> Result<Patch<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_int(deserializer).map(Patch::Replace)
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientEntry {
    pub id: Uuid,
    #[serde(deserialize_with = "lenient_int")]
    pub amount: i32,
}

/// Body of `POST /recipes/` and `PATCH /recipes/{id}/`.
#[derive(Deserialize, Debug, Default)]
pub struct RecipeForm {
    #[serde(default)]
    pub ingredients: Patch<Vec<IngredientEntry>>,
    #[serde(default)]
    pub tags: Patch<Vec<Uuid>>,
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub image: Patch<String>,
    #[serde(default)]
    pub text: Patch<String>,
    #[serde(default, deserialize_with = "lenient_int_patch")]
    pub cooking_time: Patch<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientEntry>,
    pub tags: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Patch<String>,
    pub image: Patch<String>,
    pub text: Patch<String>,
    pub cooking_time: Patch<i32>,
    pub ingredients: Patch<Vec<IngredientEntry>>,
    pub tags: Patch<Vec<Uuid>>,
}

impl RecipeForm {
    pub fn into_new_recipe(self) -> Result<NewRecipe, Error> {
        let name = required(self.name, "name")?;
        let image = required(self.image, "image")?;
        let text = required(self.text, "text")?;
        let cooking_time = required(self.cooking_time, "cooking_time")?;
        let ingredients = required(self.ingredients, "ingredients")?;
        let tags = required(self.tags, "tags")?;

        Ok(NewRecipe {
            name: validate_name(name)?,
            image: validate_image(image)?,
            text,
            cooking_time: validate_cooking_time(cooking_time)?,
            ingredients: validate_ingredients(ingredients)?,
            tags: validate_tags(tags),
        })
    }

    pub fn into_changes(self) -> Result<RecipeChanges, Error> {
        Ok(RecipeChanges {
            name: self.name.try_map(validate_name)?,
            image: self.image.try_map(validate_image)?,
            text: self.text,
            cooking_time: self.cooking_time.try_map(validate_cooking_time)?,
            ingredients: self.ingredients.try_map(validate_ingredients)?,
            tags: self.tags.map(validate_tags),
        })
    }
}

fn required<T>(value: Patch<T>, field: &str) -> Result<T, Error> {
    value
        .into_option()
        .ok_or_else(|| Error::Validation(format!("Field '{field}' is required")))
}

pub fn validate_name(name: String) -> Result<String, Error> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Recipe name may not be blank"));
    }
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(Error::Validation(format!(
            "Recipe name may not be longer than {NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(name)
}

pub fn validate_image(image: String) -> Result<String, Error> {
    if image.trim().is_empty() {
        return Err(Error::validation("Recipe image may not be empty"));
    }

    Ok(image)
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<i32, Error> {
    if cooking_time < MIN_COOKING_TIME {
        return Err(Error::validation(
            "Cooking time may not be less than one minute",
        ));
    }

    Ok(cooking_time)
}

pub fn validate_ingredients(
    ingredients: Vec<IngredientEntry>,
) -> Result<Vec<IngredientEntry>, Error> {
    if ingredients.is_empty() {
        return Err(Error::validation("Add at least one ingredient"));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    for ingredient in ingredients.iter() {
        if ingredient.amount < MIN_INGREDIENT_AMOUNT {
            return Err(Error::validation(
                "Ingredient amount may not be less than 1",
            ));
        }
        if !seen.insert(ingredient.id) {
            return Err(Error::validation(
                "Each ingredient may appear only once in a recipe",
            ));
        }
    }

    Ok(ingredients)
}

/// Collapses repeated tag ids, keeping the first occurrence.
pub fn validate_tags(tags: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(tags.len());
    tags.into_iter().filter(|tag| seen.insert(*tag)).collect()
}
