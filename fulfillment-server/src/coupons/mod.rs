//! Coupon evaluation
//!
//! Pure discount logic: no storage access, no clocks - everything the rules
//! need arrives in the context. The cart manager owns fetching coupons and
//! usage counts; checkout re-validates before converting.

pub mod evaluator;

pub use evaluator::{CouponContext, Evaluation, compute_discount, evaluate};
