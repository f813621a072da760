//! Integration tests for periodic remeshing on a cylindrical honeycomb.
//!
//! The honeycomb lattice is the standard validation mesh: every interior
//! node has exactly six neighbors at unit distance, so the Voronoi cell
//! of every interior node is a regular hexagon with known area
//! (`sqrt(3)/2`), perimeter (`2*sqrt(3)`), and edge length (`3^-0.5`).
//! On the cylinder those figures must also hold for cells straddling
//! the seam.

#![forbid(unsafe_code)]

use approx::assert_relative_eq;
use cylmesh::core::cylindrical::Cylindrical2dMesh;
use cylmesh::geometry::point::Point2;

/// Honeycomb lattice on a cylinder of width `across`: unit horizontal
/// spacing, row pitch `sqrt(3)/2`, odd rows offset by one half. Node
/// index is `row * across + column`.
fn honeycomb(across: usize, up: usize) -> Vec<Point2> {
    let mut points = Vec::with_capacity(across * up);
    for row in 0..up {
        #[allow(clippy::cast_precision_loss)]
        let y = row as f64 * 3.0_f64.sqrt() / 2.0;
        let offset = if row % 2 == 0 { 0.0 } else { 0.5 };
        for column in 0..across {
            #[allow(clippy::cast_precision_loss)]
            points.push(Point2::new(column as f64 + offset, y));
        }
    }
    points
}

/// Number of live elements containing the node.
fn node_degree(mesh: &Cylindrical2dMesh, node_index: usize) -> usize {
    mesh.mesh()
        .live_elements()
        .filter(|e| e.contains_node(node_index))
        .count()
}

/// Multiset fingerprint of the live elements: sorted triples of node
/// positions, rounded to a fixed grid so float noise cannot reorder
/// them.
fn element_fingerprint(mesh: &Cylindrical2dMesh) -> Vec<[(i64, i64); 3]> {
    let mut triples: Vec<[(i64, i64); 3]> = mesh
        .mesh()
        .live_elements()
        .map(|element| {
            let mut triple = element.nodes().map(|n| {
                let p = mesh.mesh().node(n).point();
                (
                    (p.x() * 1e9).round() as i64,
                    (p.y() * 1e9).round() as i64,
                )
            });
            triple.sort_unstable();
            triple
        })
        .collect();
    triples.sort_unstable();
    triples
}

#[test]
fn remesh_preserves_nodes_and_stays_in_domain() {
    let mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(6, 12)).unwrap();

    assert_eq!(mesh.mesh().num_all_nodes(), 72);
    assert_eq!(mesh.mesh().num_nodes(), 72);
    for node in mesh.mesh().nodes() {
        assert!(
            (0.0..6.0).contains(&node.point().x()),
            "node {} at x = {} escaped the domain",
            node.index(),
            node.point().x()
        );
    }
    assert!(mesh.mesh().num_elements() > 0);
    assert!(mesh.mesh().num_boundary_elements() > 0);
    assert!(mesh.check_voronoi(1e-7));
}

#[test]
fn interior_nodes_have_six_neighbors() {
    let across = 6;
    let mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(across, 12)).unwrap();

    // Rows 1..=10 are interior; horizontal wrap leaves no left/right
    // boundary, so every interior node is surrounded by 6 triangles.
    for row in 1..11 {
        for column in 0..across {
            let index = row * across + column;
            assert!(!mesh.mesh().node(index).is_boundary());
            assert_eq!(
                node_degree(&mesh, index),
                6,
                "node {index} (row {row}, column {column}) has wrong degree"
            );
        }
    }
    // Top and bottom rows are genuine boundary.
    for column in 0..across {
        assert!(mesh.mesh().node(column).is_boundary());
        assert!(mesh.mesh().node(11 * across + column).is_boundary());
    }
}

#[test]
fn seam_cells_match_interior_cells() {
    // Nodes 48 and 53 sit in row 8 at x = 0 and x = 5: neighbors across
    // the seam, one unit apart on the cylinder.
    let mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(6, 12)).unwrap();

    let displacement = mesh.get_periodic_displacement(
        &mesh.mesh().node(48).point(),
        &mesh.mesh().node(53).point(),
    );
    assert_relative_eq!(displacement[0].abs(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(displacement[1], 0.0, epsilon = 1e-12);

    // The dual edge crossing the seam has the standard honeycomb length.
    let edge = mesh.voronoi_edge_length(48, 53).unwrap();
    assert_relative_eq!(edge, 1.0 / 3.0_f64.sqrt(), epsilon = 1e-4);

    // Seam cells are regular hexagons like any interior cell.
    for &index in &[48, 53] {
        let area = mesh.voronoi_area(index).unwrap();
        assert_relative_eq!(area, 0.5 * 3.0_f64.sqrt(), epsilon = 1e-4);
        let perimeter = mesh.voronoi_perimeter(index).unwrap();
        assert_relative_eq!(perimeter, 2.0 * 3.0_f64.sqrt(), epsilon = 1e-4);
    }

    // A node in the middle of the domain gives the same figures.
    let area = mesh.voronoi_area(51).unwrap();
    assert_relative_eq!(area, 0.5 * 3.0_f64.sqrt(), epsilon = 1e-4);
}

#[test]
fn remesh_is_idempotent_on_a_honeycomb() {
    let mut mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(6, 12)).unwrap();
    let before = element_fingerprint(&mesh);

    let map = mesh.periodic_remesh().unwrap();
    let after = element_fingerprint(&mesh);

    assert_eq!(before, after, "remeshing unchanged nodes altered elements");
    assert_eq!(map.len(), 72);
    for index in 0..72 {
        assert_eq!(map.get_new_index(index).unwrap(), index);
    }
}

#[test]
fn deleted_nodes_are_compacted_and_reported() {
    let across = 6;
    let mut mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(across, 12)).unwrap();

    // Kill two interior nodes in different rows.
    let victims = [3 * across + 2, 7 * across + 4];
    for &victim in &victims {
        mesh.mesh_mut().delete_node(victim);
    }
    let map = mesh.periodic_remesh().unwrap();

    assert_eq!(mesh.mesh().num_nodes(), 70);
    for &victim in &victims {
        assert!(map.is_deleted(victim));
    }

    // Survivors map onto compact indices and keep their positions.
    let lattice = honeycomb(across, 12);
    for (old_index, expected) in lattice.iter().enumerate() {
        if victims.contains(&old_index) {
            continue;
        }
        let new_index = map.get_new_index(old_index).unwrap();
        let actual = mesh.mesh().node(new_index).point();
        assert_relative_eq!(actual.x(), expected.x(), epsilon = 1e-12);
        assert_relative_eq!(actual.y(), expected.y(), epsilon = 1e-12);
    }
    assert!(mesh.check_voronoi(1e-7));
}

#[test]
fn moved_node_crosses_the_seam_and_remeshes() {
    let across = 6;
    let mut mesh = Cylindrical2dMesh::from_nodes(6.0, &honeycomb(across, 12)).unwrap();

    // Drag a seam-row node just past x = 0; it reappears near x = 6.
    let node = 6 * across;
    mesh.set_node(node, Point2::new(-0.3, mesh.mesh().node(node).point().y()), true)
        .unwrap();
    assert_relative_eq!(mesh.mesh().node(node).point().x(), 5.7);

    let map = mesh.periodic_remesh().unwrap();
    assert!(!map.is_deleted(node));
    assert_eq!(mesh.mesh().num_nodes(), 72);
    assert!(mesh.check_voronoi(1e-7));
}

#[test]
fn consecutive_remeshes_after_growth() {
    let across = 4;
    let mut mesh = Cylindrical2dMesh::from_nodes(4.0, &honeycomb(across, 6)).unwrap();

    // Sprinkle a few extra nodes between lattice rows, remeshing after
    // each, as a cell-division-like workload.
    let h = 3.0_f64.sqrt() / 2.0;
    let extras = [
        Point2::new(1.3, 1.5 * h),
        Point2::new(3.6, 2.5 * h),
        Point2::new(0.1, 3.4 * h),
    ];
    for extra in extras {
        mesh.add_node(extra).unwrap();
        let map = mesh.periodic_remesh().unwrap();
        assert_eq!(map.len(), mesh.mesh().num_nodes());
        assert!(mesh.check_voronoi(1e-7));
    }
    assert_eq!(mesh.mesh().num_nodes(), 24 + 3);
}
