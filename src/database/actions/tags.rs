use crate::{
    error::Error,
    schema::{LinkedRecipeTag, Tag, Uuid},
};

use sqlx::{PgConnection, Pool, Postgres};

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_recipe_tags(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Vec<Tag>, Error> {
    let list: Vec<LinkedRecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list.into_iter().map(Tag::from).collect())
}

async fn ensure_tags_exist(tags: &[Uuid], conn: &mut PgConnection) -> Result<(), Error> {
    if tags.is_empty() {
        return Ok(());
    }

    let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(tags)
        .fetch_one(&mut *conn)
        .await?;

    if found.0 != tags.len() as i64 {
        return Err(Error::validation("Tag doesn't exist"));
    }
    Ok(())
}

/// Replaces the whole tag set of a recipe. `tags` must be free of repeats.
pub async fn set_recipe_tags(
    recipe_id: Uuid,
    tags: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    ensure_tags_exist(tags, conn).await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if tags.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::int[])")
        .bind(recipe_id)
        .bind(tags)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
