//! Great-circle spatial indexing for station coverage optimization.
//!
//! This crate answers the two geometric questions the optimizer asks of a
//! demand point set:
//!
//! - **Radius queries**: which points lie within `r` km of a location
//! - **Nearest neighbor**: which point is closest to a location, and how far
//!
//! # Architecture
//!
//! ```text
//!   (lat, lng) records
//!          │
//!          ▼
//!   SpatialIndexBuilder ── validate (finite, in range) ──► InvalidCoordinates
//!          │
//!          ▼
//!   unit-vector embedding
//!          │
//!          ├── n < linear_scan_threshold ──► linear scan
//!          └── otherwise ──────────────────► R*-tree (rstar)
//!                                                │
//!                                                ▼
//!                                   chord-length ball query
//!                                                │
//!                                                ▼
//!                                   exact haversine refine
//! ```
//!
//! # Modules
//!
//! - [`config`]: Index configuration
//! - [`geometry`]: Haversine distance, embedding, bounding boxes
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod geometry;

mod builder;
mod index;

// Re-export key types
pub use builder::{BuildStats, SpatialIndexBuilder};
pub use config::IndexConfig;
pub use error::{Result, SpatialError};
pub use geometry::{haversine_km, BBox, EARTH_RADIUS_KM};
pub use index::{Nearest, SpatialIndex};
