#![warn(missing_docs)]
//! # visitbadge-core
//!
//! Core types for the visitbadge counter engine.
//!
//! This crate holds the pieces shared by every other visitbadge crate and
//! carries no I/O of its own:
//!
//! - **Keys** ([`CacheKey`]) - hashed page identifiers used by cache and store
//! - **Tally** ([`tally()`], [`Digits`]) - in-place decimal increment used on cache hits
//! - **Badges** ([`BadgeOptions`]) - rendering parameters passed to the renderer
//! - **Offload** ([`Offload`]) - background task spawning used for store resyncs

pub mod badge;
pub mod key;
pub mod offload;
pub mod tally;

pub use badge::BadgeOptions;
pub use key::CacheKey;
pub use offload::{DetachedOffload, Offload};
pub use tally::{Digits, MalformedCounter, tally};

#[doc(hidden)]
pub use smol_str::SmolStr;
