//! Order state machine - event sourced
//!
//! - **manager**: OrdersManager for command processing and event generation
//! - **actions**: one CommandHandler per command
//! - **appliers**: one pure EventApplier per event type
//! - **reducer**: event replay and snapshot computation
//! - **verify**: periodic snapshot drift detection
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → Events → EngineStorage (redb)
//!                 ↓                        ↓
//!              Broadcast            Snapshot Update
//! ```
//!
//! Transitions are driven by external events (payment callbacks, shipment
//! scans), never by client choice; the event log is the canonical history
//! and the reducer can always rebuild the snapshot from it.

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod money;
pub mod reducer;
pub mod traits;
pub mod verify;

// Re-exports
pub use manager::OrdersManager;
pub use reducer::replay;
pub use traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
pub use verify::{VerifyOutcome, verify_snapshots};

// Re-export shared types for convenience
pub use shared::order::{
    CommandError, CommandResponse, EventPayload, OrderCommand, OrderCommandPayload, OrderEvent,
    OrderEventType, OrderSnapshot, OrderStatus,
};
