//! User-facing representations. Every flag that depends on who is asking is
//! computed here from an explicit [`Requester`], never stored.

use serde::Serialize;
use sqlx::{Pool, Postgres};

use super::{
    actions::{
        count_author_recipes, get_user_or_404, is_favorited, is_in_shopping_cart, is_subscribed,
        list_author_recipes, list_recipe_parts, list_recipe_tags,
    },
    error::Error,
    schema::{Recipe, RecipePart, Tag, User, Uuid},
};
use crate::jwt::Requester;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AmountView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipePart> for AmountView {
    fn from(part: RecipePart) -> Self {
        Self {
            id: part.ingredient_id,
            name: part.name,
            measurement_unit: part.measurement_unit,
            amount: part.amount,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<AmountView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// What favorite and shopping cart endpoints answer with.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeShortView {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeShortView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

pub async fn user_view(
    user: User,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<UserView, Error> {
    let subscribed = is_subscribed(user.id, requester, pool).await?;
    Ok(UserView::new(user, subscribed))
}

pub async fn recipe_view(
    recipe: Recipe,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, Error> {
    let author = get_user_or_404(recipe.author_id, pool).await?;
    let author = user_view(author, requester, pool).await?;
    let tags = list_recipe_tags(recipe.id, pool).await?;
    let ingredients = list_recipe_parts(recipe.id, pool).await?;

    Ok(RecipeView {
        id: recipe.id,
        tags,
        author,
        ingredients: ingredients.into_iter().map(AmountView::from).collect(),
        is_favorited: is_favorited(recipe.id, requester, pool).await?,
        is_in_shopping_cart: is_in_shopping_cart(recipe.id, requester, pool).await?,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn recipe_views(
    recipes: Vec<Recipe>,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, Error> {
    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(recipe_view(recipe, requester, pool).await?);
    }
    Ok(views)
}

/// `is_subscribed` is true by construction: these views only ever list the
/// requester's own subscriptions.
pub async fn subscription_view(
    author: User,
    recipes_limit: i64,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, Error> {
    let recipes = list_author_recipes(author.id, recipes_limit, pool).await?;
    let recipes_count = count_author_recipes(author.id, pool).await?;

    Ok(SubscriptionView {
        author: UserView::new(author, true),
        recipes: recipes.into_iter().map(RecipeShortView::from).collect(),
        recipes_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> Pool<Postgres> {
        PgPoolOptions::new()
            .connect_lazy("postgres://foodgram@localhost:1/foodgram")
            .unwrap()
    }

    #[tokio::test]
    async fn anonymous_flags_are_false_without_a_query() {
        let pool = lazy_pool();
        let anonymous = Requester::Anonymous;

        assert!(!is_favorited(1, &anonymous, &pool).await.unwrap());
        assert!(!is_in_shopping_cart(1, &anonymous, &pool).await.unwrap());
        assert!(!is_subscribed(1, &anonymous, &pool).await.unwrap());
    }

    #[test]
    fn subscription_view_flattens_author() {
        let view = SubscriptionView {
            author: UserView {
                email: String::from("chef@example.com"),
                id: 3,
                username: String::from("chef"),
                first_name: String::from("Julia"),
                last_name: String::from("Child"),
                is_subscribed: true,
            },
            recipes: vec![RecipeShortView {
                id: 11,
                name: String::from("Omelette"),
                image: String::from("omelette.png"),
                cooking_time: 5,
            }],
            recipes_count: 1,
        };

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "email": "chef@example.com",
                "id": 3,
                "username": "chef",
                "first_name": "Julia",
                "last_name": "Child",
                "is_subscribed": true,
                "recipes": [{"id": 11, "name": "Omelette", "image": "omelette.png", "cooking_time": 5}],
                "recipes_count": 1
            })
        );
    }

    #[test]
    fn amount_view_uses_ingredient_id() {
        let view = AmountView::from(RecipePart {
            recipe_id: 4,
            ingredient_id: 17,
            name: String::from("Flour"),
            measurement_unit: String::from("g"),
            amount: 250,
        });

        assert_eq!(view.id, 17);
        assert_eq!(view.amount, 250);
    }
}
