//! Shared types for the Hermit fulfillment engine
//!
//! Common types used by the fulfillment server and its clients: error codes,
//! response envelopes, actor context, and the cart/inventory/order domain
//! model (commands, events, snapshots).

pub mod actor;
pub mod cart;
pub mod error;
pub mod inventory;
pub mod order;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use actor::{ActorContext, ActorRole};
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use response::ApiResponse;
