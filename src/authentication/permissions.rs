use super::jwt::Identity;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    User,
}

const ACTION_TABLE: &[(Role, &[ActionType])] = &[
    (Role::Anonymous, &[ActionType::ReadRecipes]),
    (
        Role::User,
        &[
            ActionType::ReadRecipes,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
];

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    ReadRecipes,
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,
}

impl ActionType {
    pub fn authenticate(self, identity: &Identity) -> bool {
        let role = identity.role();

        ACTION_TABLE
            .iter()
            .find_map(|(r, actions)| {
                if *r != role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}
