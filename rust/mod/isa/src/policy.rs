//! Policy evaluation.
//!
//! Every handler asks the same question through [`can_perform`]: given a
//! caller and an investigation, is this [`Action`] allowed?

use std::collections::HashSet;

use isahub_core::Actor;

use crate::model::{AccessType, Action, Contributor, Investigation};
use crate::service::IsaError;

/// The caller as seen by the policy: identity plus project memberships.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub actor: Option<Actor>,
    pub project_ids: HashSet<String>,
}

impl Subject {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(actor: Actor, project_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            actor: Some(actor),
            project_ids: project_ids.into_iter().collect(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor.is_none()
    }

    pub fn id(&self) -> Option<&str> {
        self.actor.as_ref().map(|a| a.id.as_str())
    }
}

/// Highest tier the subject holds on the investigation, ignoring the
/// admin and contributor overrides.
pub fn effective_access(subject: &Subject, inv: &Investigation) -> AccessType {
    let public = inv.policy.access_type;
    let Some(actor) = subject.actor.as_ref() else {
        return public;
    };

    inv.policy
        .permissions
        .iter()
        .filter(|p| match &p.contributor {
            Contributor::Person(id) => *id == actor.id,
            Contributor::Project(id) => subject.project_ids.contains(id),
        })
        .map(|p| p.access_type)
        .fold(public, AccessType::max)
}

/// Whether the subject may perform `action` on the investigation.
///
/// Administrators and the contributor may do anything. Everyone else
/// needs the action's required tier, either publicly or through a grant
/// to themselves or to one of their projects.
pub fn can_perform(subject: &Subject, inv: &Investigation, action: Action) -> bool {
    if let Some(actor) = subject.actor.as_ref() {
        if actor.admin || actor.id == inv.contributor_id {
            return true;
        }
    }
    effective_access(subject, inv) >= action.required_access()
}

/// [`can_perform`] as a guard. Anonymous callers are asked to log in;
/// authenticated ones are refused.
pub fn authorize(subject: &Subject, inv: &Investigation, action: Action) -> Result<(), IsaError> {
    if can_perform(subject, inv, action) {
        return Ok(());
    }
    match subject.id() {
        None => Err(IsaError::Unauthorized(format!(
            "login required to {} investigation '{}'",
            action.as_str(),
            inv.id
        ))),
        Some(id) => Err(IsaError::Forbidden(format!(
            "{} may not {} investigation '{}'",
            id,
            action.as_str(),
            inv.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Permission, Policy};

    fn actor(id: &str) -> Actor {
        Actor {
            id: id.into(),
            name: id.into(),
            admin: false,
        }
    }

    fn inv(access_type: AccessType, permissions: Vec<Permission>) -> Investigation {
        Investigation {
            id: "i1".into(),
            title: "Inv".into(),
            description: None,
            project_ids: vec!["p1".into()],
            contributor_id: "owner".into(),
            creator_ids: vec![],
            other_creators: None,
            policy: Policy {
                access_type,
                permissions,
            },
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    const ALL: [Action; 5] = [
        Action::View,
        Action::Download,
        Action::Edit,
        Action::Manage,
        Action::Delete,
    ];

    #[test]
    fn contributor_and_admin_can_do_anything() {
        let i = inv(AccessType::Private, vec![]);
        let owner = Subject::new(actor("owner"), []);
        let admin = Subject::new(
            Actor {
                admin: true,
                ..actor("root")
            },
            [],
        );
        for action in ALL {
            assert!(can_perform(&owner, &i, action));
            assert!(can_perform(&admin, &i, action));
        }
    }

    #[test]
    fn private_denies_strangers() {
        let i = inv(AccessType::Private, vec![]);
        for action in ALL {
            assert!(!can_perform(&Subject::anonymous(), &i, action));
            assert!(!can_perform(&Subject::new(actor("x"), []), &i, action));
        }
    }

    #[test]
    fn public_tier_applies_to_anonymous() {
        let i = inv(AccessType::Visible, vec![]);
        let anon = Subject::anonymous();
        assert!(can_perform(&anon, &i, Action::View));
        assert!(!can_perform(&anon, &i, Action::Download));

        let i = inv(AccessType::Accessible, vec![]);
        assert!(can_perform(&anon, &i, Action::Download));
        assert!(!can_perform(&anon, &i, Action::Edit));
    }

    #[test]
    fn person_grant() {
        let i = inv(
            AccessType::Private,
            vec![Permission {
                contributor: Contributor::Person("bob".into()),
                access_type: AccessType::Editing,
            }],
        );
        let bob = Subject::new(actor("bob"), []);
        assert!(can_perform(&bob, &i, Action::Edit));
        assert!(!can_perform(&bob, &i, Action::Manage));
        assert!(!can_perform(&bob, &i, Action::Delete));
        assert!(!can_perform(&Subject::new(actor("eve"), []), &i, Action::View));
    }

    #[test]
    fn project_grant_reaches_members_only() {
        let i = inv(
            AccessType::Visible,
            vec![Permission {
                contributor: Contributor::Project("p9".into()),
                access_type: AccessType::Managing,
            }],
        );
        let member = Subject::new(actor("m"), ["p9".to_string()]);
        let outsider = Subject::new(actor("o"), ["p1".to_string()]);
        assert!(can_perform(&member, &i, Action::Delete));
        assert!(can_perform(&outsider, &i, Action::View));
        assert!(!can_perform(&outsider, &i, Action::Edit));
    }

    #[test]
    fn authorize_distinguishes_anonymous() {
        let i = inv(AccessType::Private, vec![]);
        assert!(matches!(
            authorize(&Subject::anonymous(), &i, Action::View),
            Err(IsaError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&Subject::new(actor("eve"), []), &i, Action::View),
            Err(IsaError::Forbidden(_))
        ));
        assert!(authorize(&Subject::new(actor("owner"), []), &i, Action::Delete).is_ok());
    }

    #[test]
    fn grants_never_lower_the_public_tier() {
        let i = inv(
            AccessType::Accessible,
            vec![Permission {
                contributor: Contributor::Person("bob".into()),
                access_type: AccessType::Private,
            }],
        );
        let bob = Subject::new(actor("bob"), []);
        assert_eq!(effective_access(&bob, &i), AccessType::Accessible);
    }
}
