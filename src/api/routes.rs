use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, reply::Reply, Filter};

use super::{handlers, reply::handle_rejection};
use crate::{
    constants::MAX_BODY_BYTES,
    filters::IngredientFilter,
    form::RecipeForm,
    jwt::JwtKeys,
    middleware::{with_requester, with_session},
    pagination::PageQuery,
    schema::Uuid,
};

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub keys: JwtKeys,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, keys: JwtKeys) -> Self {
        Self { pool, keys }
    }
}

fn with_context(ctx: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn recipe_form() -> impl Filter<Extract = (RecipeForm,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// The raw query string, empty when the request has none.
fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

/// The whole `/api` surface with rejections rendered as JSON.
pub fn api(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(
            tags(ctx.clone())
                .or(ingredients(ctx.clone()))
                .or(recipes(ctx.clone()))
                .or(users(ctx)),
        )
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

fn tags(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_tags);

    let detail = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::get_tag);

    list.or(detail)
}

fn ingredients(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientFilter>())
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_ingredients);

    let detail = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handlers::get_ingredient);

    list.or(detail)
}

fn recipes(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let keys = ctx.keys.clone();

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(raw_query())
        .and(with_requester(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(recipe_form())
        .and(with_context(ctx.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(warp::query::<handlers::DownloadQuery>())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::download_shopping_cart);

    let detail = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(with_requester(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(keys.clone()))
        .and(recipe_form())
        .and(with_context(ctx.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::delete_recipe);

    let favorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::add_favorite);

    let unfavorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::delete())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::remove_favorite);

    let add_to_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::post())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::add_to_shopping_cart);

    let remove_from_cart = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::delete())
        .and(with_session(keys))
        .and(with_context(ctx))
        .and_then(handlers::remove_from_shopping_cart);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
        .or(favorite)
        .or(unfavorite)
        .or(add_to_cart)
        .or(remove_from_cart)
}

fn users(ctx: Context) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let keys = ctx.keys.clone();

    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(with_requester(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_me);

    let delete_me = warp::path!("users" / "me")
        .and(warp::delete())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::delete_me);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<handlers::SubscriptionsQuery>())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::list_subscriptions);

    let detail = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(with_requester(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(warp::query::<handlers::RecipesLimitQuery>())
        .and(with_session(keys.clone()))
        .and(with_context(ctx.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(keys))
        .and(with_context(ctx))
        .and_then(handlers::unsubscribe);

    list.or(me)
        .or(delete_me)
        .or(subscriptions)
        .or(detail)
        .or(subscribe)
        .or(unsubscribe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::SESSION_COOKIE,
        jwt::{sign_session, tests as jwt_tests},
        schema::UserRole,
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use warp::http::StatusCode;

    /// A pool that never connects. Every request below is decided before the database is touched.
    fn context() -> Context {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://foodgram@localhost:1/foodgram")
            .unwrap();
        Context::new(pool, jwt_tests::keys())
    }

    fn bearer(user_id: Uuid, role: UserRole) -> String {
        let token = sign_session(&jwt_tests::user(user_id, role), &jwt_tests::keys()).unwrap();
        format!("Bearer {token}")
    }

    fn detail(body: &[u8]) -> String {
        let body: Value = serde_json::from_slice(body).unwrap();
        body["detail"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn creating_requires_login() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/")
            .json(&json!({"name": "Soup"}))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_rejects_short_cooking_time() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/")
            .header("authorization", bearer(1, UserRole::User))
            .json(&json!({
                "ingredients": [{"id": 1, "amount": 2}],
                "tags": [1],
                "name": "Soup",
                "image": "soup.png",
                "text": "Stir.",
                "cooking_time": 0
            }))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            detail(response.body()),
            "Cooking time may not be less than one minute"
        );
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ingredients() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/")
            .header("cookie", format!("{SESSION_COOKIE}={}", &bearer(1, UserRole::User)[7..]))
            .json(&json!({
                "ingredients": [{"id": 1, "amount": 2}, {"id": 1, "amount": 3}],
                "tags": [],
                "name": "Soup",
                "image": "soup.png",
                "text": "Stir.",
                "cooking_time": 10
            }))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_rejects_empty_ingredient_list() {
        let response = warp::test::request()
            .method("PATCH")
            .path("/api/recipes/3/")
            .header("authorization", bearer(1, UserRole::User))
            .json(&json!({"ingredients": []}))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/")
            .header("authorization", bearer(1, UserRole::User))
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn self_subscription_is_rejected() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/users/4/subscribe/")
            .header("authorization", bearer(4, UserRole::User))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(detail(response.body()), "You can't subscribe to yourself");
    }

    #[tokio::test]
    async fn foreign_shopping_list_is_forbidden() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/recipes/download_shopping_cart/?user=1")
            .header("authorization", bearer(2, UserRole::User))
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn subscriptions_require_login() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/users/subscriptions/")
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_recipe_filter_is_a_bad_request() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/recipes/?author=someone")
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn anonymous_relation_filter_is_empty() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/recipes/?is_favorited=1")
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"count": 0, "next": null, "previous": null, "results": []}));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = warp::test::request()
            .method("GET")
            .path("/api/pantry/")
            .reply(&api(context()))
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
