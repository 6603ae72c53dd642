use std::collections::HashSet;

use crate::domain::entities::{RangeAction, UserHandle};
use crate::domain::ports::AccessPolicy;

// Anyone may run games; editing the graph and managing levels need a moderator role.
#[derive(Debug, Clone)]
pub struct RoleAccessPolicy {
    moderator_roles: HashSet<String>,
}

impl RoleAccessPolicy {
    pub fn new(moderator_roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            moderator_roles: moderator_roles.into_iter().collect(),
        }
    }

    fn is_moderator(&self, user: &UserHandle) -> bool {
        self.moderator_roles.iter().any(|role| user.has_role(role))
    }
}

impl AccessPolicy for RoleAccessPolicy {
    fn allows(&self, user: &UserHandle, action: RangeAction) -> bool {
        match action {
            RangeAction::RunGame => true,
            RangeAction::EditGraph | RangeAction::ManageLevels => self.is_moderator(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoleAccessPolicy {
        RoleAccessPolicy::new(["moderator".to_string(), "host".to_string()])
    }

    #[test]
    fn when_user_has_no_role_then_only_running_games_is_allowed() {
        let user = UserHandle::new(1, "Guest");

        assert!(policy().allows(&user, RangeAction::RunGame));
        assert!(!policy().allows(&user, RangeAction::EditGraph));
        assert!(!policy().allows(&user, RangeAction::ManageLevels));
    }

    #[test]
    fn when_user_has_any_configured_role_then_every_action_is_allowed() {
        let user = UserHandle::new(2, "Host").with_role("host");

        assert!(policy().allows(&user, RangeAction::EditGraph));
        assert!(policy().allows(&user, RangeAction::ManageLevels));
    }
}
