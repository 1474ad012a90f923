use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageOwnAccount,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageOwnAccount,
            ActionType::ManageAllRecipes,
            ActionType::ViewAllShoppingCarts,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,
    ManageOwnAccount,

    ManageAllRecipes,
    ViewAllShoppingCarts,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let user_uid = &session.user_uid;

        ACTION_TABLE
            .iter()
            .find(|(uid, _)| uid == user_uid)
            .map(|(_, actions)| actions.contains(&self))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn session(uid: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("someone"),
            is_admin: uid == UserRole::Admin,
            user_uid: uid,
        }
    }

    #[rstest]
    #[case(ActionType::CreateRecipes)]
    #[case(ActionType::ManageOwnRecipes)]
    #[case(ActionType::ManageOwnFavorites)]
    #[case(ActionType::ManageOwnShoppingCart)]
    #[case(ActionType::ManageOwnSubscriptions)]
    #[case(ActionType::ManageOwnAccount)]
    fn users_manage_their_own_data(#[case] action: ActionType) {
        assert!(action.authenticate(&session(UserRole::User)));
        assert!(action.authenticate(&session(UserRole::Admin)));
    }

    #[rstest]
    #[case(ActionType::ManageAllRecipes)]
    #[case(ActionType::ViewAllShoppingCarts)]
    fn only_admins_reach_other_users_data(#[case] action: ActionType) {
        assert!(!action.authenticate(&session(UserRole::User)));
        assert!(action.authenticate(&session(UserRole::Admin)));
    }
}
