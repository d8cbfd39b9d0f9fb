//! Payment gateway interface

pub mod gateway;

pub use gateway::{GatewayError, HttpPaymentGateway, MockPaymentGateway, PaymentGateway, PaymentIntent};
