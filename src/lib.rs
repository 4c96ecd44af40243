//! Rivet maps table rows to entities.
//!
//! Entity types describe themselves with a [`Definition`]; a [`Connection`]
//! hands out one [`Mapper`] per type, which builds, persists and loads
//! [`Entity`] instances, tracking them in an identity map. Lookups are
//! written as condition maps:
//! ```rust,ignore
//! let cars = connection
//!     .mapper::<Car>()?
//!     .find(conditions! { "manufacturer_id" => 2, "name like" => "M%" })?
//!     .run()?;
//! ```
pub use rivet_core::*;
