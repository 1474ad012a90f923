use crate::{
    authentication::permissions::ActionType,
    error::Error,
    filters::RecipeFilter,
    form::{IngredientEntry, NewRecipe, Patch, RecipeChanges},
    jwt::{Requester, SessionData},
    pagination::{PageContext, PageRequest},
    schema::{Recipe, RecipePart, RecipeRow, Uuid},
};

use super::{ingredients::ensure_ingredients_exist, tags::set_recipe_tags};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    requester: &Requester,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> Result<PageContext<Recipe>, Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        builder.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }

    // Relation filters are scoped to the requester; nobody's favorites belong to an anonymous one.
    if filter.is_favorited || filter.is_in_shopping_cart {
        let Some(user_id) = requester.user_id() else {
            return Ok(PageContext::no_rows());
        };

        if filter.is_favorited {
            builder
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            builder
                .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }

    builder
        .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
        .push_bind(page.page_size)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = builder.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows: Vec<Recipe> = rows.into_iter().map(Recipe::from).collect();

    Ok(PageContext::from_rows(rows, total_count, page))
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_recipe_or_404(id: Uuid, pool: &Pool<Postgres>) -> Result<Recipe, Error> {
    get_recipe(id, pool)
        .await?
        .ok_or_else(|| Error::not_found("No recipe exists with specified id"))
}

/// Loads a recipe the session may modify: its own, or any recipe for admins.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    let recipe = get_recipe_or_404(id, pool).await?;

    session.authenticate_owner(recipe.author_id, ActionType::ManageAllRecipes)?;
    Ok(recipe)
}

pub async fn list_recipe_parts(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipePart>, Error> {
    let rows: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT a.recipe_id, i.id AS ingredient_id, i.name, i.measurement_unit, a.amount
        FROM amounts a
        INNER JOIN ingredients i ON i.id = a.ingredient_id
        WHERE a.recipe_id = $1
        ORDER BY a.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Discards every amount row of the recipe and inserts `ingredients` in their place.
async fn replace_recipe_parts(
    recipe_id: Uuid,
    ingredients: &[IngredientEntry],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    let ids: Vec<Uuid> = ingredients.iter().map(|entry| entry.id).collect();
    let amounts: Vec<i32> = ingredients.iter().map(|entry| entry.amount).collect();

    ensure_ingredients_exist(&ids, conn).await?;

    sqlx::query("DELETE FROM amounts WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "
        INSERT INTO amounts (recipe_id, ingredient_id, amount)
        SELECT $1, parts.ingredient_id, parts.amount
        FROM UNNEST($2::int[], $3::int[]) AS parts (ingredient_id, amount)
    ",
    )
    .bind(recipe_id)
    .bind(ids)
    .bind(amounts)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn create_recipe(
    recipe: NewRecipe,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::CreateRecipes)?;

    let mut tx = pool.begin().await?;

    let created: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(session.user_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    replace_recipe_parts(created.id, &recipe.ingredients, &mut tx).await?;
    set_recipe_tags(created.id, &recipe.tags, &mut tx).await?;

    tx.commit().await?;

    log::info!("User {} created recipe {}", session.user_id, created.id);
    Ok(created)
}

pub async fn update_recipe(
    recipe: Recipe,
    changes: RecipeChanges,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let mut tx = pool.begin().await?;

    let updated: Recipe = sqlx::query_as(
        "
        UPDATE recipes
        SET name = $2, image = $3, text = $4, cooking_time = $5
        WHERE id = $1
        RETURNING *
    ",
    )
    .bind(recipe.id)
    .bind(patched(changes.name, recipe.name))
    .bind(patched(changes.image, recipe.image))
    .bind(patched(changes.text, recipe.text))
    .bind(patched(changes.cooking_time, recipe.cooking_time))
    .fetch_one(&mut *tx)
    .await?;

    if let Patch::Replace(ingredients) = &changes.ingredients {
        replace_recipe_parts(updated.id, ingredients, &mut tx).await?;
    }
    if let Patch::Replace(tags) = &changes.tags {
        set_recipe_tags(updated.id, tags, &mut tx).await?;
    }

    tx.commit().await?;

    Ok(updated)
}

fn patched<T>(change: Patch<T>, current: T) -> T {
    change.into_option().unwrap_or(current)
}

/// Removes a recipe and every row referring to it.
pub(crate) async fn delete_recipe_rows(recipe_id: Uuid, conn: &mut PgConnection) -> Result<u64, Error> {
    for statement in [
        "DELETE FROM favorites WHERE recipe_id = $1",
        "DELETE FROM shopping_cart WHERE recipe_id = $1",
        "DELETE FROM amounts WHERE recipe_id = $1",
        "DELETE FROM recipe_tags WHERE recipe_id = $1",
    ] {
        sqlx::query(statement)
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;
    }

    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_recipe(recipe: Recipe, pool: &Pool<Postgres>) -> Result<(), Error> {
    let mut tx = pool.begin().await?;

    if delete_recipe_rows(recipe.id, &mut tx).await? == 0 {
        return Err(Error::not_found("No recipe exists with specified id"));
    }

    tx.commit().await?;

    log::info!("Deleted recipe {}", recipe.id);
    Ok(())
}

pub async fn list_author_recipes(
    author_id: Uuid,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, Error> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Uuid, pool: &Pool<Postgres>) -> Result<i64, Error> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}
