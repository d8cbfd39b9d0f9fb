//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Cart errors
/// - 2xxx: Coupon errors
/// - 3xxx: Inventory errors
/// - 4xxx: Order errors
/// - 5xxx: Payment errors
/// - 6xxx: Shipping errors
/// - 7xxx: Listing errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Cart errors (1xxx)
    Cart,
    /// Coupon errors (2xxx)
    Coupon,
    /// Inventory errors (3xxx)
    Inventory,
    /// Order errors (4xxx)
    Order,
    /// Payment errors (5xxx)
    Payment,
    /// Shipping errors (6xxx)
    Shipping,
    /// Listing errors (7xxx)
    Listing,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Classify an error code by its numeric range
    pub fn from_code(code: ErrorCode) -> Self {
        match u16::from(code) / 1000 {
            0 => ErrorCategory::General,
            1 => ErrorCategory::Cart,
            2 => ErrorCategory::Coupon,
            3 => ErrorCategory::Inventory,
            4 => ErrorCategory::Order,
            5 => ErrorCategory::Payment,
            6 => ErrorCategory::Shipping,
            7 => ErrorCategory::Listing,
            _ => ErrorCategory::System,
        }
    }
}

impl From<ErrorCode> for ErrorCategory {
    fn from(code: ErrorCode) -> Self {
        Self::from_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_range() {
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::ValidationFailed),
            ErrorCategory::General
        );
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::InsufficientStock),
            ErrorCategory::Inventory
        );
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::RefundExceedsBalance),
            ErrorCategory::Payment
        );
        assert_eq!(
            ErrorCategory::from_code(ErrorCode::InvariantViolation),
            ErrorCategory::System
        );
    }
}
