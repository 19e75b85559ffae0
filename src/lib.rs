//! AdBoard Backend Library
//!
//! Plan gating, usage accounting and subscription-limit notifications for
//! the AdBoard platform. The library exposes the core components for
//! testing and embedding; the binary wires them into the sweep command.

pub mod config;
pub mod db;
pub mod error;
pub mod limits;
pub mod models;
pub mod observability;
pub mod plan;
pub mod sweep;
pub mod usage;
