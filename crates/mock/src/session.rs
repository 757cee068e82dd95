//! The one piece of mutable state a scenario carries

use pizza_common::{Identity, RoleKind};
use tracing::info;

/// Which identity, if any, the simulated browser is logged in as
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Anonymous,
    AuthenticatedAs(Identity),
}

impl Session {
    pub fn from_seed(seed: Option<Identity>) -> Self {
        seed.map_or(Session::Anonymous, Session::AuthenticatedAs)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::AuthenticatedAs(identity) => Some(identity),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }

    pub fn has_role(&self, role: RoleKind) -> bool {
        self.identity().is_some_and(|i| i.has_role(role))
    }

    /// Bind the session to `identity`, replacing any previous one
    pub fn authenticate(&mut self, identity: Identity) {
        info!(id = identity.id, email = %identity.email, "session authenticated");
        *self = Session::AuthenticatedAs(identity);
    }

    pub fn clear(&mut self) {
        if let Session::AuthenticatedAs(identity) = self {
            info!(id = identity.id, email = %identity.email, "session cleared");
        }
        *self = Session::Anonymous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizza_common::fixtures;

    #[test]
    fn test_transitions() {
        let diner = fixtures::find_identity_by_email("d@jwt.com").unwrap().clone();
        let admin = fixtures::find_identity_by_email("a@jwt.com").unwrap().clone();

        let mut session = Session::default();
        assert!(session.is_anonymous());

        session.authenticate(diner.clone());
        assert_eq!(session.identity(), Some(&diner));

        session.authenticate(admin.clone());
        assert_eq!(session.identity(), Some(&admin));
        assert!(session.has_role(RoleKind::Administrator));

        session.clear();
        assert!(session.is_anonymous());
        session.clear();
        assert!(session.is_anonymous());
    }

    #[test]
    fn test_from_seed() {
        assert!(Session::from_seed(None).is_anonymous());
        let owner = fixtures::find_identity_by_email("f@jwt.com").cloned();
        assert!(Session::from_seed(owner).has_role(RoleKind::FranchiseOwner));
    }
}
