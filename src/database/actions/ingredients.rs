use crate::{
    error::Error,
    filters::IngredientFilter,
    schema::{Ingredient, Uuid},
};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

pub async fn list_ingredients(
    filter: &IngredientFilter,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM ingredients WHERE TRUE");

    if let Some(pattern) = filter.name_pattern() {
        builder
            .push(" AND name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    if let Some(pattern) = filter.search_pattern() {
        builder
            .push(" AND name ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    builder.push(" ORDER BY name, id");

    let list: Vec<Ingredient> = builder.build_query_as().fetch_all(pool).await?;

    Ok(list)
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, Error> {
    let ingredient: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(ingredient)
}

pub async fn ensure_ingredients_exist(
    ingredients: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    let found: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ingredients)
        .fetch_one(&mut *conn)
        .await?;

    if found.0 != ingredients.len() as i64 {
        return Err(Error::validation("Ingredient doesn't exist"));
    }
    Ok(())
}
