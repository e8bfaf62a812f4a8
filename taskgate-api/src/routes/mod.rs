/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `tasks`: Task CRUD and soft-delete lifecycle
/// - `roles`: Role CRUD and soft-delete lifecycle
/// - `permissions`: Permission CRUD and soft-delete lifecycle
/// - `assignments`: Role↔permission and user↔role associations
/// - `pages`: Front-end pages

pub mod assignments;
pub mod auth;
pub mod health;
pub mod pages;
pub mod permissions;
pub mod roles;
pub mod tasks;

use serde::Deserialize;
use taskgate_shared::models::Trashed;
use validator::Validate;

use crate::extract::blank_as_none;

/// Query string accepted by list endpoints
///
/// `?trashed=with` includes soft-deleted rows, `?trashed=only` lists only
/// them.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub trashed: Trashed,
}

/// Message for a name already used by a live row
pub(crate) const NAME_TAKEN: &str = "The name has already been taken.";

/// Create and update payload for roles and permissions
#[derive(Debug, Deserialize, Validate)]
pub struct NamedPayload {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "The description field is required."))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFailures;

    #[test]
    fn test_named_payload_requires_both_fields() {
        let payload: NamedPayload = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        let failures = ValidationFailures::check(&payload).into_inner();

        assert_eq!(failures["name"], vec!["The name field is required."]);
        assert_eq!(failures["description"], vec!["The description field is required."]);
    }

    #[test]
    fn test_list_query_scopes() {
        let parse = |qs: &str| -> Trashed {
            serde_json::from_value::<ListQuery>(serde_json::json!({ "trashed": qs }))
                .unwrap()
                .trashed
        };

        assert_eq!(parse("with"), Trashed::With);
        assert_eq!(parse("only"), Trashed::Only);
        assert_eq!(ListQuery::default().trashed, Trashed::Without);
    }
}
