use serde::Deserialize;
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::Response,
};

use super::{reply, routes::Context};
use crate::{
    actions,
    constants::{
        MAX_PAGE_SIZE, RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_FILENAME, SUBSCRIPTION_COUNT_PER_PAGE,
        SUBSCRIPTION_RECIPES_LIMIT, USER_COUNT_PER_PAGE,
    },
    error::Error,
    filters::{IngredientFilter, RecipeFilter},
    form::RecipeForm,
    jwt::{Requester, SessionData},
    pagination::PageQuery,
    schema::Uuid,
    shopping_list::download_shopping_list,
    views::{
        recipe_view, recipe_views, subscription_view, user_view, RecipeShortView,
        SubscriptionView, UserView,
    },
};

#[derive(Deserialize, Debug, Default)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}

impl RecipesLimitQuery {
    pub fn resolve(&self) -> i64 {
        self.recipes_limit
            .filter(|limit| *limit >= 0)
            .unwrap_or(SUBSCRIPTION_RECIPES_LIMIT)
            .min(MAX_PAGE_SIZE)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct SubscriptionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DownloadQuery {
    pub user: Option<Uuid>,
}

// Catalog

pub async fn list_tags(ctx: Context) -> Result<Response, Rejection> {
    let tags = actions::list_tags(&ctx.pool).await?;
    Ok(reply::json(&tags, StatusCode::OK))
}

pub async fn get_tag(id: Uuid, ctx: Context) -> Result<Response, Rejection> {
    let tag = actions::get_tag(id, &ctx.pool)
        .await?
        .ok_or_else(|| Error::not_found("No tag exists with specified id"))?;
    Ok(reply::json(&tag, StatusCode::OK))
}

pub async fn list_ingredients(
    filter: IngredientFilter,
    ctx: Context,
) -> Result<Response, Rejection> {
    let ingredients = actions::list_ingredients(&filter, &ctx.pool).await?;
    Ok(reply::json(&ingredients, StatusCode::OK))
}

pub async fn get_ingredient(id: Uuid, ctx: Context) -> Result<Response, Rejection> {
    let ingredient = actions::get_ingredient(id, &ctx.pool)
        .await?
        .ok_or_else(|| Error::not_found("No ingredient exists with specified id"))?;
    Ok(reply::json(&ingredient, StatusCode::OK))
}

// Recipes

pub async fn list_recipes(
    query: String,
    requester: Requester,
    ctx: Context,
) -> Result<Response, Rejection> {
    let filter = RecipeFilter::from_query(&query)?;
    let page = filter.page_query().resolve(RECIPE_COUNT_PER_PAGE);

    let mut recipes = actions::fetch_recipes(&filter, &requester, page, &ctx.pool).await?;
    let rows = std::mem::take(&mut recipes.results);
    let views = recipe_views(rows, &requester, &ctx.pool).await?;

    Ok(reply::json(&recipes.with_results(views), StatusCode::OK))
}

pub async fn get_recipe(
    id: Uuid,
    requester: Requester,
    ctx: Context,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_or_404(id, &ctx.pool).await?;
    let view = recipe_view(recipe, &requester, &ctx.pool).await?;
    Ok(reply::json(&view, StatusCode::OK))
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    ctx: Context,
) -> Result<Response, Rejection> {
    let recipe = form.into_new_recipe()?;

    let created = actions::create_recipe(recipe, &session, &ctx.pool).await?;
    let view = recipe_view(created, &Requester::User(session), &ctx.pool).await?;
    Ok(reply::json(&view, StatusCode::CREATED))
}

pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    form: RecipeForm,
    ctx: Context,
) -> Result<Response, Rejection> {
    let changes = form.into_changes()?;

    let recipe = actions::get_recipe_mut(id, &session, &ctx.pool).await?;
    let updated = actions::update_recipe(recipe, changes, &ctx.pool).await?;
    let view = recipe_view(updated, &Requester::User(session), &ctx.pool).await?;
    Ok(reply::json(&view, StatusCode::OK))
}

pub async fn delete_recipe(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let recipe = actions::get_recipe_mut(id, &session, &ctx.pool).await?;
    actions::delete_recipe(recipe, &ctx.pool).await?;
    Ok(reply::no_content())
}

// Favorites and shopping cart

pub async fn add_favorite(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let recipe = actions::add_to_favorites(id, &session, &ctx.pool).await?;
    Ok(reply::json(&RecipeShortView::from(recipe), StatusCode::CREATED))
}

pub async fn remove_favorite(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    actions::remove_from_favorites(id, &session, &ctx.pool).await?;
    Ok(reply::no_content())
}

pub async fn add_to_shopping_cart(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let recipe = actions::add_to_shopping_cart(id, &session, &ctx.pool).await?;
    Ok(reply::json(&RecipeShortView::from(recipe), StatusCode::CREATED))
}

pub async fn remove_from_shopping_cart(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    actions::remove_from_shopping_cart(id, &session, &ctx.pool).await?;
    Ok(reply::no_content())
}

pub async fn download_shopping_cart(
    query: DownloadQuery,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let document = download_shopping_list(query.user, &session, &ctx.pool).await?;
    Ok(reply::attachment(document, SHOPPING_LIST_FILENAME))
}

// Users and subscriptions

pub async fn list_users(
    query: PageQuery,
    requester: Requester,
    ctx: Context,
) -> Result<Response, Rejection> {
    let page = query.resolve(USER_COUNT_PER_PAGE);
    let mut users = actions::fetch_users(page, &ctx.pool).await?;

    let mut views: Vec<UserView> = Vec::with_capacity(users.results.len());
    for user in std::mem::take(&mut users.results) {
        views.push(user_view(user, &requester, &ctx.pool).await?);
    }

    Ok(reply::json(&users.with_results(views), StatusCode::OK))
}

pub async fn get_user(
    id: Uuid,
    requester: Requester,
    ctx: Context,
) -> Result<Response, Rejection> {
    let user = actions::get_user_or_404(id, &ctx.pool).await?;
    let view = user_view(user, &requester, &ctx.pool).await?;
    Ok(reply::json(&view, StatusCode::OK))
}

pub async fn get_me(session: SessionData, ctx: Context) -> Result<Response, Rejection> {
    let user = actions::get_user_or_404(session.user_id, &ctx.pool).await?;
    // nobody can follow themselves
    Ok(reply::json(&UserView::new(user, false), StatusCode::OK))
}

pub async fn delete_me(session: SessionData, ctx: Context) -> Result<Response, Rejection> {
    actions::delete_user(&session, &ctx.pool).await?;
    Ok(reply::no_content())
}

pub async fn list_subscriptions(
    query: SubscriptionsQuery,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(SUBSCRIPTION_COUNT_PER_PAGE);
    let recipes_limit = RecipesLimitQuery {
        recipes_limit: query.recipes_limit,
    }
    .resolve();

    let mut authors = actions::fetch_subscriptions(&session, page, &ctx.pool).await?;

    let mut views: Vec<SubscriptionView> = Vec::with_capacity(authors.results.len());
    for author in std::mem::take(&mut authors.results) {
        views.push(subscription_view(author, recipes_limit, &ctx.pool).await?);
    }

    Ok(reply::json(&authors.with_results(views), StatusCode::OK))
}

pub async fn subscribe(
    id: Uuid,
    query: RecipesLimitQuery,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    let author = actions::subscribe(id, &session, &ctx.pool).await?;
    let view = subscription_view(author, query.resolve(), &ctx.pool).await?;
    Ok(reply::json(&view, StatusCode::CREATED))
}

pub async fn unsubscribe(
    id: Uuid,
    session: SessionData,
    ctx: Context,
) -> Result<Response, Rejection> {
    actions::unsubscribe(id, &session, &ctx.pool).await?;
    Ok(reply::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_limit_defaults_and_caps() {
        assert_eq!(RecipesLimitQuery::default().resolve(), SUBSCRIPTION_RECIPES_LIMIT);
        assert_eq!(
            RecipesLimitQuery {
                recipes_limit: Some(-1)
            }
            .resolve(),
            SUBSCRIPTION_RECIPES_LIMIT
        );
        assert_eq!(
            RecipesLimitQuery {
                recipes_limit: Some(0)
            }
            .resolve(),
            0
        );
        assert_eq!(
            RecipesLimitQuery {
                recipes_limit: Some(MAX_PAGE_SIZE + 1)
            }
            .resolve(),
            MAX_PAGE_SIZE
        );
    }
}
