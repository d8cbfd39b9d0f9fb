//! Unified error codes for the Hermit fulfillment engine
//!
//! This module defines all error codes used across the server and its
//! clients. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Cart errors
//! - 2xxx: Coupon errors
//! - 3xxx: Inventory errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Shipping errors
//! - 7xxx: Listing errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 6,
    /// Value out of range
    ValueOutOfRange = 7,
    /// Permission denied for this actor
    PermissionDenied = 8,

    // ==================== 1xxx: Cart ====================
    /// Cart is not active (converted, abandoned, or expired)
    CartNotActive = 1001,
    /// Cart has no items
    CartEmpty = 1002,
    /// Item not present in the cart
    CartItemNotFound = 1003,
    /// Another active cart already exists for this owner
    CartAlreadyActive = 1004,

    // ==================== 2xxx: Coupon ====================
    /// Coupon is inactive or outside its validity window
    CouponNotActive = 2001,
    /// Coupon already applied to this cart
    CouponAlreadyApplied = 2002,
    /// Cart subtotal below the coupon minimum purchase
    CouponMinimumNotMet = 2003,
    /// Per-account usage limit reached
    CouponUsageLimitReached = 2004,
    /// Coupon cannot be combined with other coupons
    CouponNotStackable = 2005,

    // ==================== 3xxx: Inventory ====================
    /// Not enough available stock to reserve
    InsufficientStock = 3001,
    /// No inventory record exists for the listing
    InventoryNotFound = 3002,
    /// No reservation exists for the cart/listing pair
    ReservationNotFound = 3003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested state transition is not allowed
    InvalidTransition = 4002,
    /// Operation requires a paid order
    OrderNotPaid = 4003,
    /// Order has already been paid
    OrderAlreadyPaid = 4004,
    /// Shipment not found on the order
    ShipmentNotFound = 4005,
    /// Shipment items exceed the order's unshipped quantities
    NothingToShip = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment intent does not match the order
    PaymentIntentMismatch = 5001,
    /// Refund not found on the order
    RefundNotFound = 5002,
    /// Refund has already been decided
    RefundAlreadyDecided = 5003,
    /// Refund amount exceeds the refundable balance
    RefundExceedsBalance = 5004,

    // ==================== 6xxx: Shipping ====================
    /// Shipping option not found on the cart
    ShippingOptionNotFound = 6001,
    /// No shipping option selected for a cart that needs one
    ShippingNotSelected = 6002,

    // ==================== 7xxx: Listing ====================
    /// Listing not found in the catalog
    ListingNotFound = 7001,
    /// Listing is unpublished or deleted
    ListingNotPurchasable = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    Internal = 9001,
    /// Storage layer error
    Storage = 9002,
    /// Ledger or totals invariant violated - fatal, never auto-repaired
    InvariantViolation = 9003,
    /// External service (payment gateway, rate provider) failed
    ExternalService = 9004,
    /// System is busy, retry later
    SystemBusy = 9005,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::CartNotActive => "Cart is not active",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartItemNotFound => "Item not in cart",
            ErrorCode::CartAlreadyActive => "An active cart already exists",
            ErrorCode::CouponNotActive => "Coupon is not active",
            ErrorCode::CouponAlreadyApplied => "Coupon already applied",
            ErrorCode::CouponMinimumNotMet => "Minimum purchase not met",
            ErrorCode::CouponUsageLimitReached => "Coupon usage limit reached",
            ErrorCode::CouponNotStackable => "Coupon cannot be stacked",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::InventoryNotFound => "Inventory record not found",
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid state transition",
            ErrorCode::OrderNotPaid => "Order is not paid",
            ErrorCode::OrderAlreadyPaid => "Order is already paid",
            ErrorCode::ShipmentNotFound => "Shipment not found",
            ErrorCode::NothingToShip => "Nothing left to ship",
            ErrorCode::PaymentIntentMismatch => "Payment intent mismatch",
            ErrorCode::RefundNotFound => "Refund not found",
            ErrorCode::RefundAlreadyDecided => "Refund already decided",
            ErrorCode::RefundExceedsBalance => "Refund exceeds refundable balance",
            ErrorCode::ShippingOptionNotFound => "Shipping option not found",
            ErrorCode::ShippingNotSelected => "No shipping option selected",
            ErrorCode::ListingNotFound => "Listing not found",
            ErrorCode::ListingNotPurchasable => "Listing is not purchasable",
            ErrorCode::Internal => "Internal server error",
            ErrorCode::Storage => "Storage error",
            ErrorCode::InvariantViolation => "Invariant violation detected",
            ErrorCode::ExternalService => "External service error",
            ErrorCode::SystemBusy => "System busy, please retry",
        }
    }

    /// Error-taxonomy kind exposed in API responses
    ///
    /// Collapses codes into the caller-facing taxonomy: validation,
    /// not_found, insufficient_stock, invariant_violation, external_service,
    /// conflict, internal.
    pub fn kind(&self) -> &'static str {
        match self {
            ErrorCode::Success => "ok",
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidRequest
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::CartEmpty
            | ErrorCode::ShippingNotSelected
            | ErrorCode::RefundExceedsBalance
            | ErrorCode::CouponNotActive
            | ErrorCode::CouponAlreadyApplied
            | ErrorCode::CouponMinimumNotMet
            | ErrorCode::CouponUsageLimitReached
            | ErrorCode::CouponNotStackable => "validation",
            ErrorCode::NotFound
            | ErrorCode::CartItemNotFound
            | ErrorCode::OrderNotFound
            | ErrorCode::ShipmentNotFound
            | ErrorCode::RefundNotFound
            | ErrorCode::ReservationNotFound
            | ErrorCode::InventoryNotFound
            | ErrorCode::ShippingOptionNotFound
            | ErrorCode::ListingNotFound
            | ErrorCode::PermissionDenied => "not_found",
            ErrorCode::InsufficientStock => "insufficient_stock",
            ErrorCode::InvariantViolation => "invariant_violation",
            ErrorCode::ExternalService => "external_service",
            ErrorCode::AlreadyExists
            | ErrorCode::CartNotActive
            | ErrorCode::CartAlreadyActive
            | ErrorCode::InvalidTransition
            | ErrorCode::OrderNotPaid
            | ErrorCode::OrderAlreadyPaid
            | ErrorCode::NothingToShip
            | ErrorCode::PaymentIntentMismatch
            | ErrorCode::RefundAlreadyDecided
            | ErrorCode::ListingNotPurchasable => "conflict",
            ErrorCode::Unknown
            | ErrorCode::Internal
            | ErrorCode::Storage
            | ErrorCode::SystemBusy => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::RequiredField,
            7 => ErrorCode::ValueOutOfRange,
            8 => ErrorCode::PermissionDenied,
            1001 => ErrorCode::CartNotActive,
            1002 => ErrorCode::CartEmpty,
            1003 => ErrorCode::CartItemNotFound,
            1004 => ErrorCode::CartAlreadyActive,
            2001 => ErrorCode::CouponNotActive,
            2002 => ErrorCode::CouponAlreadyApplied,
            2003 => ErrorCode::CouponMinimumNotMet,
            2004 => ErrorCode::CouponUsageLimitReached,
            2005 => ErrorCode::CouponNotStackable,
            3001 => ErrorCode::InsufficientStock,
            3002 => ErrorCode::InventoryNotFound,
            3003 => ErrorCode::ReservationNotFound,
            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::InvalidTransition,
            4003 => ErrorCode::OrderNotPaid,
            4004 => ErrorCode::OrderAlreadyPaid,
            4005 => ErrorCode::ShipmentNotFound,
            4006 => ErrorCode::NothingToShip,
            5001 => ErrorCode::PaymentIntentMismatch,
            5002 => ErrorCode::RefundNotFound,
            5003 => ErrorCode::RefundAlreadyDecided,
            5004 => ErrorCode::RefundExceedsBalance,
            6001 => ErrorCode::ShippingOptionNotFound,
            6002 => ErrorCode::ShippingNotSelected,
            7001 => ErrorCode::ListingNotFound,
            7002 => ErrorCode::ListingNotPurchasable,
            9001 => ErrorCode::Internal,
            9002 => ErrorCode::Storage,
            9003 => ErrorCode::InvariantViolation,
            9004 => ErrorCode::ExternalService,
            9005 => ErrorCode::SystemBusy,
            other => return Err(format!("unknown error code: {}", other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::InsufficientStock,
            ErrorCode::InvalidTransition,
            ErrorCode::InvariantViolation,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn unknown_code_rejected() {
        assert!(ErrorCode::try_from(12345).is_err());
    }
}
