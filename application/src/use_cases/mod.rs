//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod analyze;
pub mod dispatch;
pub mod integration;
pub mod specialist;
