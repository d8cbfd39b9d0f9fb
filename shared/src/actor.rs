//! Actor context - explicit caller identity for every operation
//!
//! Every operation receives an [`ActorContext`] carrying the caller's
//! identity and authorization scope. There is no ambient "current user";
//! the context is constructed at the API boundary and threaded through
//! explicitly.

use serde::{Deserialize, Serialize};

/// Authorization scope of the caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// A shopper (registered account or guest device)
    #[default]
    Customer,
    /// The store owner - may adjust inventory, approve refunds, ship orders
    StoreOwner,
    /// Internal callers: gateway callbacks, background sweeps
    System,
}

/// Explicit caller identity passed into every operation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActorContext {
    /// Registered account ID, if the caller is signed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Display name (snapshot for audit trails)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    /// Stable opaque device identifier for guest sessions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Authorization scope
    pub role: ActorRole,
}

impl ActorContext {
    /// Context for a registered customer
    pub fn customer(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            actor_name: None,
            device_id: None,
            role: ActorRole::Customer,
        }
    }

    /// Context for a guest identified only by a device token
    pub fn guest(device_id: impl Into<String>) -> Self {
        Self {
            account_id: None,
            actor_name: None,
            device_id: Some(device_id.into()),
            role: ActorRole::Customer,
        }
    }

    /// Context for the store owner
    pub fn store_owner(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            actor_name: None,
            device_id: None,
            role: ActorRole::StoreOwner,
        }
    }

    /// Context for internal operations (sweeps, gateway callbacks)
    pub fn system() -> Self {
        Self {
            account_id: None,
            actor_name: Some("system".to_string()),
            device_id: None,
            role: ActorRole::System,
        }
    }

    pub fn is_store_owner(&self) -> bool {
        self.role == ActorRole::StoreOwner
    }

    pub fn is_system(&self) -> bool {
        self.role == ActorRole::System
    }

    /// Stable identifier for audit trails
    ///
    /// Falls back to the device token for guests and "system" for internal
    /// callers; never empty.
    pub fn audit_id(&self) -> String {
        if let Some(account_id) = &self.account_id {
            return account_id.clone();
        }
        if let Some(device_id) = &self.device_id {
            return format!("device:{}", device_id);
        }
        "system".to_string()
    }
}

fn header<'a>(parts: &'a axum::http::request::Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extract the actor context at the API boundary
///
/// Authentication is an upstream concern (the web tier terminates
/// sessions); these headers are what it forwards. The context is built
/// once here and passed into every operation explicitly - there is no
/// ambient "current user".
impl<S> axum::extract::FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = crate::error::AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let role = match header(parts, "x-actor-role") {
            None | Some("customer") => ActorRole::Customer,
            Some("store_owner") => ActorRole::StoreOwner,
            Some("system") => ActorRole::System,
            Some(other) => {
                return Err(crate::error::AppError::validation(format!(
                    "unknown actor role: {other}"
                )));
            }
        };
        Ok(ActorContext {
            account_id: header(parts, "x-actor-id").map(str::to_string),
            actor_name: header(parts, "x-actor-name").map(str::to_string),
            device_id: header(parts, "x-device-id").map(str::to_string),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_id_prefers_account() {
        let mut ctx = ActorContext::customer("acc-1");
        ctx.device_id = Some("dev-1".to_string());
        assert_eq!(ctx.audit_id(), "acc-1");
    }

    #[test]
    fn guest_audit_id_uses_device() {
        assert_eq!(ActorContext::guest("dev-9").audit_id(), "device:dev-9");
    }
}
