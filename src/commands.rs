//! Command implementations for the checkout binary.

pub mod checkout;
