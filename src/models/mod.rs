//! Data models for the AdBoard backend
//!
//! This module contains the domain models used throughout the application,
//! organized by their domain (companies, plan rules, notifications).

mod company;
mod notification;
mod rule;

pub use company::*;
pub use notification::*;
pub use rule::*;
