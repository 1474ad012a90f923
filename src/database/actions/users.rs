use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::SessionData,
    pagination::{PageContext, PageRequest},
    schema::{User, UserRow, Uuid},
};

use super::recipes::delete_recipe_rows;

use sqlx::{Pool, Postgres};

pub async fn get_user_by_id(user_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_or_404(user_id: Uuid, pool: &Pool<Postgres>) -> Result<User, Error> {
    get_user_by_id(user_id, pool)
        .await?
        .ok_or_else(|| Error::not_found("No user exists with specified id"))
}

pub async fn fetch_users(page: PageRequest, pool: &Pool<Postgres>) -> Result<PageContext<User>, Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.id LIMIT $1 OFFSET $2",
    )
    .bind(page.page_size)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<User> = rows.into_iter().map(User::from).collect();

    Ok(PageContext::from_rows(rows, total_count, page))
}

/// Deletes the session's own account together with everything that refers to it.
pub async fn delete_user(session: &SessionData, pool: &Pool<Postgres>) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnAccount)?;

    let mut tx = pool.begin().await?;

    for statement in [
        "DELETE FROM subscriptions WHERE user_id = $1 OR author_id = $1",
        "DELETE FROM favorites WHERE user_id = $1",
        "DELETE FROM shopping_cart WHERE user_id = $1",
    ] {
        sqlx::query(statement)
            .bind(session.user_id)
            .execute(&mut *tx)
            .await?;
    }

    let recipes: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM recipes WHERE author_id = $1")
        .bind(session.user_id)
        .fetch_all(&mut *tx)
        .await?;
    for (recipe_id,) in recipes {
        delete_recipe_rows(recipe_id, &mut tx).await?;
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("No user exists with specified id"));
    }

    tx.commit().await?;

    log::info!("Deleted user {} and their content", session.user_id);
    Ok(())
}
