//! # cylmesh
//!
//! A 2D triangular mesh library for periodic (cylindrical) domains, as
//! used in off-lattice cell-based tissue simulations: the domain
//! `[0, width) x R` has its vertical edges identified, so cells that
//! drift off one side come back on the other.
//!
//! # Features
//!
//! - Mutable triangular meshes with soft deletion and index compaction
//! - Delaunay retriangulation (Bowyer-Watson)
//! - Periodic remeshing on a cylinder via node mirroring and halo fencing
//! - Voronoi dual measures (cell area, perimeter, edge length), periodic-aware
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use cylmesh::prelude::*;
//!
//! // An offset lattice on a cylinder of width 4.
//! let mut points = Vec::new();
//! for row in 0..4 {
//!     let y = row as f64 * 3.0_f64.sqrt() / 2.0;
//!     let offset = if row % 2 == 0 { 0.0 } else { 0.5 };
//!     for column in 0..4 {
//!         points.push(Point2::new(column as f64 + offset, y));
//!     }
//! }
//!
//! let mut mesh = Cylindrical2dMesh::from_nodes(4.0, &points).unwrap();
//!
//! // Nodes keep their indices; elements wrap around the seam.
//! assert_eq!(mesh.mesh().num_nodes(), 16);
//! assert!(mesh.check_voronoi(1e-7));
//!
//! // Moving a node across the seam wraps its coordinate.
//! mesh.set_node(0, Point2::new(-0.25, 0.0), true).unwrap();
//! assert_eq!(mesh.mesh().node(0).point().x(), 3.75);
//! ```
//!
//! # Periodic Remeshing
//!
//! [`Cylindrical2dMesh::periodic_remesh`](core::cylindrical::Cylindrical2dMesh::periodic_remesh)
//! rebuilds the triangulation after nodes move or die. It returns a
//! [`NodeMap`](core::node_map::NodeMap) describing how surviving nodes
//! were renumbered, so callers holding node indices (e.g. a cell
//! population keyed by node) can follow the compaction:
//!
//! ```rust
//! use cylmesh::prelude::*;
//!
//! let mut points = Vec::new();
//! for row in 0..5 {
//!     let y = row as f64 * 3.0_f64.sqrt() / 2.0;
//!     let offset = if row % 2 == 0 { 0.0 } else { 0.5 };
//!     for column in 0..4 {
//!         points.push(Point2::new(column as f64 + offset, y));
//!     }
//! }
//! let mut mesh = Cylindrical2dMesh::from_nodes(4.0, &points).unwrap();
//!
//! mesh.mesh_mut().delete_node(9);
//! let map = mesh.periodic_remesh().unwrap();
//!
//! assert!(map.is_deleted(9));
//! assert_eq!(map.get_new_index(19).unwrap(), 18);
//! ```

// Allow multiple crate versions due to transitive dependencies
#![expect(clippy::multiple_crate_versions)]
// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

/// The `core` module contains the mesh data structures and the periodic
/// remeshing machinery.
///
/// It includes the [`MutableMesh`](core::mutable_mesh::MutableMesh)
/// arena, the [`Cylindrical2dMesh`](core::cylindrical::Cylindrical2dMesh)
/// controller, and the supporting node/element/index-map types.
pub mod core {
    /// Triangulation algorithms for mesh reconstruction
    pub mod algorithms {
        /// Bowyer-Watson Delaunay triangulation of a 2D point set
        pub mod bowyer_watson;
    }
    /// High-performance collection types optimized for mesh bookkeeping
    pub mod collections;
    /// Periodic mesh controller for cylindrical domains
    pub mod cylindrical;
    pub mod element;
    /// Mutable triangular mesh with soft deletion and compaction
    pub mod mutable_mesh;
    pub mod node;
    pub mod node_map;
    /// Voronoi dual measures over a triangulated mesh
    pub mod voronoi;
    // Re-export the `core` modules.
    pub use cylindrical::*;
    pub use element::*;
    pub use mutable_mesh::*;
    pub use node::*;
    pub use node_map::*;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Contains geometric types including the `Point2` struct, the exact-ish
/// predicates the triangulation relies on, and periodic coordinate
/// arithmetic.
pub mod geometry {
    /// Coordinate wrapping and shortest-displacement arithmetic on a cylinder
    pub mod periodic;
    pub mod point;
    pub mod predicates;
    pub use periodic::*;
    pub use point::*;
    pub use predicates::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::bowyer_watson::*, cylindrical::*, element::*, mutable_mesh::*, node::*,
        node_map::*, voronoi::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{periodic::*, point::*, predicates::*};
}

// =============================================================================
// TESTS
// =============================================================================
