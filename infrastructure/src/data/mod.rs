//! Data provider adapters
//!
//! [`StaticDataProvider`] serves in-memory payloads; [`FixtureDataProvider`]
//! loads them from a JSON file. Both narrow record arrays with the filters
//! extracted from the question.

mod filter;
mod fixture;
mod static_provider;

pub use fixture::{FixtureDataProvider, FixtureError};
pub use static_provider::StaticDataProvider;
