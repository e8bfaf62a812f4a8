/// Policy engine
///
/// Decides whether a [`Principal`] may perform an [`Ability`] on a resource
/// type or on one resource instance.
///
/// # Rules
///
/// Every resource type implements [`Policy`], which maps each ability to an
/// ordered list of [`Rule`]s. The first rule that grants wins; if none grants,
/// the request is denied with the resource's message for that ability.
/// [`Rule::AdminBypass`] heads every list, so holders of the `admin` role are
/// allowed everything.
///
/// | Resource   | viewAny / create | view            | update / delete / restore / forceDelete | role & permission assignment |
/// |------------|------------------|-----------------|-----------------------------------------|------------------------------|
/// | Task       | anyone           | owner or admin  | owner or admin                          | denied                       |
/// | Role       | anyone / admin   | anyone          | admin                                   | admin                        |
/// | Permission | anyone / admin   | anyone          | admin                                   | denied                       |
///
/// # Example
///
/// ```
/// use taskgate_shared::auth::middleware::Principal;
/// use taskgate_shared::auth::policy::Ability;
/// use taskgate_shared::models::role::Role;
/// use uuid::Uuid;
///
/// let member = Principal::new(Uuid::new_v4(), vec!["editor".to_string()]);
///
/// let denied = member.authorize_type::<Role>(Ability::Create).unwrap_err();
/// assert_eq!(denied.message, "You can't update roles.");
/// ```

use std::fmt;

use uuid::Uuid;

use super::middleware::Principal;
use crate::models::{permission::Permission, role::Role, task::Task};

/// Actions subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ability {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
    Restore,
    ForceDelete,
    AssignRole,
    RemoveRole,
    AttachPermission,
    DetachPermission,
}

impl Ability {
    /// Every ability, in declaration order
    pub const ALL: [Ability; 11] = [
        Ability::ViewAny,
        Ability::View,
        Ability::Create,
        Ability::Update,
        Ability::Delete,
        Ability::Restore,
        Ability::ForceDelete,
        Ability::AssignRole,
        Ability::RemoveRole,
        Ability::AttachPermission,
        Ability::DetachPermission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::ViewAny => "viewAny",
            Ability::View => "view",
            Ability::Create => "create",
            Ability::Update => "update",
            Ability::Delete => "delete",
            Ability::Restore => "restore",
            Ability::ForceDelete => "forceDelete",
            Ability::AssignRole => "assignRole",
            Ability::RemoveRole => "removeRole",
            Ability::AttachPermission => "attachPermission",
            Ability::DetachPermission => "detachPermission",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single grant condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Grants to holders of the `admin` role
    AdminBypass,

    /// Grants to any authenticated principal
    Anyone,

    /// Grants when the principal owns the target instance
    OwnerOnly,

    /// Grants to admins only
    AdminOnly,
}

impl Rule {
    fn grants<P: Policy>(&self, principal: &Principal, target: Option<&P>) -> bool {
        match self {
            Rule::AdminBypass | Rule::AdminOnly => principal.is_admin(),
            Rule::Anyone => true,
            Rule::OwnerOnly => target.is_some_and(|t| is_owner_or_admin(principal, t)),
        }
    }
}

/// Authorization failure
///
/// Always maps to HTTP 403 with `message` as the body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PolicyDenied {
    pub message: String,
}

impl PolicyDenied {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Message for abilities a resource type does not support
pub const UNSUPPORTED_ABILITY: &str = "This action is unauthorized.";

/// Per-resource authorization rules
pub trait Policy {
    /// Ordered grant rules for `ability`; empty means always denied
    fn rules(ability: Ability) -> &'static [Rule];

    /// Denial message for `ability`
    fn denial(ability: Ability) -> &'static str;

    /// Owner of this instance, for resources with ownership
    fn owner_id(&self) -> Option<Uuid> {
        None
    }
}

const OPEN: &[Rule] = &[Rule::AdminBypass, Rule::Anyone];
const OWNED: &[Rule] = &[Rule::AdminBypass, Rule::OwnerOnly];
const ADMIN: &[Rule] = &[Rule::AdminBypass, Rule::AdminOnly];
const NOBODY: &[Rule] = &[Rule::AdminBypass];

impl Policy for Task {
    fn rules(ability: Ability) -> &'static [Rule] {
        match ability {
            Ability::ViewAny | Ability::Create => OPEN,
            Ability::View
            | Ability::Update
            | Ability::Delete
            | Ability::Restore
            | Ability::ForceDelete => OWNED,
            Ability::AssignRole
            | Ability::RemoveRole
            | Ability::AttachPermission
            | Ability::DetachPermission => NOBODY,
        }
    }

    fn denial(ability: Ability) -> &'static str {
        match ability {
            Ability::View => "You can't view task.",
            Ability::Update => "You can't update task.",
            Ability::Delete => "You can't delete task.",
            Ability::Restore => "You can't restore task.",
            Ability::ForceDelete => "You can't force delete a task.",
            _ => UNSUPPORTED_ABILITY,
        }
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

impl Policy for Role {
    fn rules(ability: Ability) -> &'static [Rule] {
        match ability {
            Ability::ViewAny | Ability::View => OPEN,
            _ => ADMIN,
        }
    }

    fn denial(ability: Ability) -> &'static str {
        match ability {
            Ability::Create | Ability::Update => "You can't update roles.",
            Ability::Delete => "You can't delete roles.",
            Ability::Restore => "You can't restore roles.",
            Ability::ForceDelete => "You can't delete roles permanently.",
            Ability::AssignRole => "You can't assign roles.",
            Ability::RemoveRole => "You can't remove roles.",
            Ability::AttachPermission => "You can't attach permissions to a role.",
            Ability::DetachPermission => "You can't detach permissions from a role.",
            Ability::ViewAny | Ability::View => UNSUPPORTED_ABILITY,
        }
    }
}

impl Policy for Permission {
    fn rules(ability: Ability) -> &'static [Rule] {
        match ability {
            Ability::ViewAny | Ability::View => OPEN,
            Ability::Create
            | Ability::Update
            | Ability::Delete
            | Ability::Restore
            | Ability::ForceDelete => ADMIN,
            Ability::AssignRole
            | Ability::RemoveRole
            | Ability::AttachPermission
            | Ability::DetachPermission => NOBODY,
        }
    }

    fn denial(ability: Ability) -> &'static str {
        match ability {
            Ability::Create | Ability::Update => "You can't update permissions.",
            Ability::Delete => "You can't delete permissions.",
            Ability::Restore => "You can't restore permissions.",
            Ability::ForceDelete => "You can't delete permissions permanently.",
            _ => UNSUPPORTED_ABILITY,
        }
    }
}

/// Evaluates `P`'s rules for `ability`
///
/// `target` is the instance for row-scoped abilities, or None for
/// type-level checks (`viewAny`, `create`). Ownership rules never grant
/// without a target.
pub fn authorize<P: Policy>(
    principal: &Principal,
    ability: Ability,
    target: Option<&P>,
) -> Result<(), PolicyDenied> {
    if P::rules(ability)
        .iter()
        .any(|rule| rule.grants(principal, target))
    {
        return Ok(());
    }

    tracing::debug!(
        user_id = %principal.user_id,
        ability = %ability,
        "Policy denied"
    );

    Err(PolicyDenied::new(P::denial(ability)))
}

/// Ownership predicate behind every row-scoped Task ability
///
/// Resources without an owner only pass for admins.
pub fn is_owner_or_admin<P: Policy>(principal: &Principal, target: &P) -> bool {
    principal.is_admin() || target.owner_id() == Some(principal.user_id)
}

impl Principal {
    /// Authorizes `ability` against one resource instance
    pub fn authorize<P: Policy>(&self, ability: Ability, target: &P) -> Result<(), PolicyDenied> {
        authorize(self, ability, Some(target))
    }

    /// Authorizes a type-level `ability` (no instance)
    pub fn authorize_type<P: Policy>(&self, ability: Ability) -> Result<(), PolicyDenied> {
        authorize::<P>(self, ability, None)
    }
}
