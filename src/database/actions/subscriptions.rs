use crate::{
    authentication::permissions::ActionType,
    error::Error,
    jwt::{Requester, SessionData},
    pagination::{PageContext, PageRequest},
    schema::{User, UserRow, Uuid},
};

use super::users::get_user_or_404;

use sqlx::{Pool, Postgres};

pub async fn is_subscribed(
    author_id: Uuid,
    requester: &Requester,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let Some(user_id) = requester.user_id() else {
        return Ok(false);
    };

    let result: Option<(Uuid,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE author_id = $1 AND user_id = $2",
    )
    .bind(author_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

pub fn ensure_not_self(author_id: Uuid, session: &SessionData) -> Result<(), Error> {
    if author_id == session.user_id {
        return Err(Error::validation("You can't subscribe to yourself"));
    }
    Ok(())
}

pub async fn subscribe(
    author_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<User, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    ensure_not_self(author_id, session)?;
    let author = get_user_or_404(author_id, pool).await?;

    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::validation("You are already subscribed to this user"));
    }

    Ok(author)
}

pub async fn unsubscribe(
    author_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let author = get_user_or_404(author_id, pool).await?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author.id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::not_found("You are not subscribed to this user"));
    }

    Ok(())
}

/// Authors the session follows, most recent subscription first.
pub async fn fetch_subscriptions(
    session: &SessionData,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<User>, Error> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(page.page_size)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<User> = rows.into_iter().map(User::from).collect();

    Ok(PageContext::from_rows(rows, total_count, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    #[test]
    fn self_subscription_is_a_validation_error() {
        let session = SessionData {
            user_id: 9,
            username: String::from("u"),
            user_uid: UserRole::User,
            is_admin: false,
        };

        assert!(matches!(ensure_not_self(9, &session), Err(Error::Validation(_))));
        assert!(ensure_not_self(10, &session).is_ok());
    }
}
