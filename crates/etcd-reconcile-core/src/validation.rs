//! Structural checks on declared values before anything is sent to a store.

use crate::error::ValidationError;
use crate::types::{KeyValue, Role, User};

/// Validate a declared role.
///
/// Permission paths are already checked by [`PermissionSet`](crate::PermissionSet)
/// construction, so only the name is checked here.
pub fn validate_role(role: &Role) -> Result<(), ValidationError> {
    validate_name("role", &role.name)
}

/// Validate a declared user: non-empty username and password.
///
/// Empty role names are allowed in the declaration; they are filtered out
/// before any membership call.
pub fn validate_user(user: &User) -> Result<(), ValidationError> {
    validate_name("user", &user.username)?;
    if user.password.is_empty() {
        return Err(ValidationError::EmptyPassword(user.username.clone()));
    }
    Ok(())
}

pub fn validate_key_value(kv: &KeyValue) -> Result<(), ValidationError> {
    validate_key(&kv.key)
}

pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    Ok(())
}

pub fn validate_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName { kind });
    }
    Ok(())
}
