//! Consolidated ingredient list across every recipe in a shopping cart.

use std::collections::HashMap;
use std::fmt::Write;

use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::SHOPPING_LIST_HEADER,
    database::actions::{get_user_or_404, list_shopping_cart_parts},
    error::Error,
    jwt::SessionData,
    schema::{RecipePart, Uuid},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Sums amounts per ingredient. The same ingredient contributed by several
/// recipes is added up, never deduplicated. Output is ordered by name, unit and
/// id so repeated calls over the same rows render identically.
pub fn aggregate<I>(parts: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = RecipePart>,
{
    let mut items: HashMap<Uuid, ShoppingListItem> = HashMap::new();

    for part in parts {
        items
            .entry(part.ingredient_id)
            .and_modify(|item| item.total += i64::from(part.amount))
            .or_insert_with(|| ShoppingListItem {
                ingredient_id: part.ingredient_id,
                total: i64::from(part.amount),
                name: part.name,
                measurement_unit: part.measurement_unit,
            });
    }

    let mut items: Vec<ShoppingListItem> = items.into_values().collect();
    items.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
            .then_with(|| a.ingredient_id.cmp(&b.ingredient_id))
    });
    items
}

pub fn render(items: &[ShoppingListItem]) -> String {
    let mut document = format!("{SHOPPING_LIST_HEADER}\n\n");
    for item in items {
        // writing into a String cannot fail
        let _ = writeln!(
            document,
            "{} ({}): {} ",
            item.name, item.measurement_unit, item.total
        );
    }
    document
}

/// Checks that `session` may read `owner_id`'s cart before anything is loaded.
pub fn authorize_download(owner_id: Uuid, session: &SessionData) -> Result<(), Error> {
    session.authenticate_owner(owner_id, ActionType::ViewAllShoppingCarts)
}

/// Builds the downloadable shopping list of `owner_id`, defaulting to the session's own cart.
pub async fn download_shopping_list(
    owner_id: Option<Uuid>,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<String, Error> {
    let owner_id = owner_id.unwrap_or(session.user_id);
    authorize_download(owner_id, session)?;

    if owner_id != session.user_id {
        get_user_or_404(owner_id, pool).await?;
        log::info!(
            "User {} downloaded the shopping list of user {owner_id}",
            session.user_id
        );
    }

    let parts = list_shopping_cart_parts(owner_id, pool).await?;
    Ok(render(&aggregate(parts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn part(recipe_id: Uuid, ingredient_id: Uuid, name: &str, unit: &str, amount: i32) -> RecipePart {
        RecipePart {
            recipe_id,
            ingredient_id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    fn session(user_id: Uuid, uid: UserRole) -> SessionData {
        SessionData {
            user_id,
            username: format!("user{user_id}"),
            is_admin: uid == UserRole::Admin,
            user_uid: uid,
        }
    }

    #[test]
    fn sums_one_ingredient_across_recipes() {
        let items = aggregate(vec![
            part(1, 10, "Sugar", "g", 2),
            part(2, 10, "Sugar", "g", 3),
        ]);

        assert_eq!(
            items,
            vec![ShoppingListItem {
                ingredient_id: 10,
                name: String::from("Sugar"),
                measurement_unit: String::from("g"),
                total: 5,
            }]
        );
    }

    #[test]
    fn keeps_same_named_ingredients_with_different_ids_apart() {
        let items = aggregate(vec![
            part(1, 10, "Salt", "g", 5),
            part(1, 11, "Salt", "pinch", 1),
            part(2, 10, "Salt", "g", 5),
        ]);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].measurement_unit, "g");
        assert_eq!(items[0].total, 10);
        assert_eq!(items[1].measurement_unit, "pinch");
        assert_eq!(items[1].total, 1);
    }

    #[test]
    fn ordering_does_not_depend_on_input_order() {
        let rows = vec![
            part(1, 3, "Milk", "ml", 200),
            part(1, 1, "Eggs", "pcs", 2),
            part(2, 2, "Butter", "g", 20),
            part(2, 1, "Eggs", "pcs", 1),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let forward = aggregate(rows);
        assert_eq!(forward, aggregate(reversed));

        let names: Vec<&str> = forward.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Butter", "Eggs", "Milk"]);
    }

    #[test]
    fn totals_do_not_overflow_i32() {
        let items = aggregate(vec![
            part(1, 1, "Water", "ml", i32::MAX),
            part(2, 1, "Water", "ml", i32::MAX),
        ]);

        assert_eq!(items[0].total, 2 * i64::from(i32::MAX));
    }

    #[test]
    fn renders_header_blank_line_and_items() {
        let document = render(&aggregate(vec![
            part(1, 2, "Flour", "g", 500),
            part(2, 1, "Eggs", "pcs", 3),
        ]));

        assert_eq!(
            document,
            format!("{SHOPPING_LIST_HEADER}\n\nEggs (pcs): 3 \nFlour (g): 500 \n")
        );
    }

    #[test]
    fn empty_cart_renders_only_the_header() {
        assert_eq!(render(&aggregate(vec![])), format!("{SHOPPING_LIST_HEADER}\n\n"));
    }

    #[test]
    fn only_owner_or_admin_may_download() {
        assert!(authorize_download(1, &session(1, UserRole::User)).is_ok());
        assert!(authorize_download(1, &session(2, UserRole::Admin)).is_ok());
        assert!(matches!(
            authorize_download(1, &session(2, UserRole::User)),
            Err(Error::Permission(_))
        ));
    }
}
