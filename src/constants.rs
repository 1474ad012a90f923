pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Recipes shown under each author in subscription views when no `recipes_limit` is given.
pub const SUBSCRIPTION_RECIPES_LIMIT: i64 = 6;

pub const NAME_MAX_LENGTH: usize = 200;
pub const MIN_COOKING_TIME: i32 = 1;
pub const MIN_INGREDIENT_AMOUNT: i32 = 1;

pub const SHOPPING_LIST_HEADER: &str = "Foodgram shopping list";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Recipe images travel inline in the JSON body.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;
