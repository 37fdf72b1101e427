//! Entity models for users, activities and the user activities linking them.
//!
//! # Responsibility
//! - Define passive value types mirrored by the relational store.
//! - Own the encode/decode contract of the user activity attribute bag.
//!
//! # Invariants
//! - Identifiers are assigned by the store; a value of `0` means "not yet
//!   persisted" and is never written.
//! - Timestamps are Unix epoch milliseconds.

pub mod activity;
pub mod attributes;
pub mod user;
pub mod user_activity;
