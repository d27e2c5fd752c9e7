//! Core types for Optic Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod phone;
pub mod status;
pub mod text;

pub use id::*;
pub use money::{DiscountPercent, Money, Quantity};
pub use phone::{Phone, PhoneError};
pub use status::*;
