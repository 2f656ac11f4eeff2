#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Greenzone shared types
//!
//! Profile model, the profile store seam and Postgres plumbing used by the
//! billing and API crates.

pub mod db;
pub mod error;
pub mod profiles;
pub mod types;

pub use db::{create_pool, run_migrations};
pub use error::{StoreError, StoreResult};
pub use profiles::{PgProfileStore, ProfileStore};
pub use types::{Field, PlanType, Profile, ProfileUpdate};
