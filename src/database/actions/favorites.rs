use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::{Requester, SessionData},
    schema::{Recipe, Uuid},
};

use super::recipes::get_recipe_or_404;

use sqlx::{Pool, Postgres};

pub async fn is_favorited(
    recipe_id: Uuid,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(user_id) = requester.user_id() else {
        return Ok(false);
    };

    let result: Option<(Uuid,)> =
        sqlx::query_as("SELECT recipe_id FROM favorites WHERE recipe_id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

pub async fn add_to_favorites(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(recipe.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("Recipe is already in favorites"));
    }

    Ok(recipe)
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    let recipe = get_recipe_or_404(recipe_id, pool).await?;

    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(session.user_id)
        .bind(recipe.id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("Recipe is not in favorites"));
    }

    Ok(())
}
