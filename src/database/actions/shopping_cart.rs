use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::{Requester, SessionData},
    schema::{Recipe, RecipePart, Uuid},
};

use super::recipes::get_recipe_or_404;

use sqlx::{Pool, Postgres};

pub async fn is_in_shopping_cart(
    recipe_id: Uuid,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(user_id) = requester.user_id() else {
        return Ok(false);
    };

    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT recipe_id FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

pub async fn add_to_shopping_cart(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("Recipe is already in the shopping cart"));
    }

    Ok(recipe)
}

pub async fn remove_from_shopping_cart(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnShoppingCart)?;
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe.id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe is not in the shopping cart"));
    }

    Ok(())
}

/// Every ingredient line of every recipe in the user's cart, one row per recipe and ingredient.
pub async fn list_shopping_cart_parts(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, Error> {
    let rows: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT a.recipe_id, i.id AS ingredient_id, i.name, i.measurement_unit, a.amount
        FROM shopping_cart c
        INNER JOIN amounts a ON a.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = a.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
