use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::atom::{AtomRecord, ElementMap};
use crate::auxiliary::lattice::{LatticeMetric, DEFAULT_OVERLAP_TOLERANCE};
use crate::auxiliary::structure::PeriodicStructure;
use crate::symmetry::floating_seitz_operator::FloatingSeitzOperator;
use crate::symmetry::orbit::{self, AffineOperation};
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::SeitzOperator;

fn cubic_lattice(a: f64) -> LatticeMetric {
    LatticeMetric::new(Matrix3::from_diagonal_element(a)).unwrap()
}

/// The two-fold screw axis along `z` at the origin together with the identity.
fn screw_pair() -> Vec<SeitzOperator> {
    vec![
        SeitzOperator::identity(),
        SeitzOperator::new(
            RotationMatrix::from_rows([[-1, 0, 0], [0, -1, 0], [0, 0, 1]]).unwrap(),
            Vector3::new(0, 0, 6),
        ),
    ]
}

#[test]
fn test_orbit_affine_operation_exact_and_floating_agree() {
    let exact = screw_pair();
    let floating = exact
        .iter()
        .map(FloatingSeitzOperator::from)
        .collect::<Vec<_>>();
    let position = Vector3::new(0.1, 0.2, 0.3);
    for (e, f) in exact.iter().zip(floating.iter()) {
        assert_relative_eq!(e.act_on(&position), f.act_on(&position), epsilon = 1e-12);
    }
    assert_relative_eq!(
        exact[1].act_on(&position),
        Vector3::new(-0.1, -0.2, 0.8),
        epsilon = 1e-12
    );
}

#[test]
fn test_orbit_symmetric_positions_wrapped() {
    let images = orbit::symmetric_positions(screw_pair().iter(), &Vector3::new(0.1, 0.2, 0.3));
    assert_eq!(images.len(), 2);
    assert_relative_eq!(images[0], Vector3::new(0.1, 0.2, 0.3), epsilon = 1e-12);
    assert_relative_eq!(images[1], Vector3::new(0.9, 0.8, 0.8), epsilon = 1e-12);
}

#[test]
fn test_orbit_expanded_positions_special_site() {
    let lattice = cubic_lattice(4.0);
    let ops = screw_pair();

    // On the screw axis the two images differ by half a lattice vector along `z`.
    let on_axis = orbit::expanded_positions(
        ops.iter(),
        &lattice,
        &Vector3::new(0.0, 0.0, 0.25),
        DEFAULT_OVERLAP_TOLERANCE,
    );
    assert_eq!(on_axis.len(), 2);

    // Identity alone never expands.
    let single = orbit::expanded_positions(
        ops[..1].iter(),
        &lattice,
        &Vector3::new(0.3, 0.3, 0.3),
        DEFAULT_OVERLAP_TOLERANCE,
    );
    assert_eq!(single.len(), 1);
}

#[test]
fn test_orbit_symmetrized_position_requires_stabilizer() {
    let lattice = cubic_lattice(4.0);
    let shift_only = [SeitzOperator::translation_only(Vector3::new(6, 0, 0))];
    assert!(orbit::symmetrized_position(
        shift_only.iter(),
        &lattice,
        &Vector3::new(0.1, 0.1, 0.1),
        DEFAULT_OVERLAP_TOLERANCE
    )
    .is_err());
}

#[test]
fn test_orbit_symmetrized_position_across_cell_boundary() {
    let lattice = cubic_lattice(4.0);
    let ops = vec![
        SeitzOperator::identity(),
        SeitzOperator::inversion_through(&Vector3::zeros()),
    ];

    // A position just below the origin is mapped by the inversion onto a lattice translate
    // of itself; the average must stay next to the original, not jump half a cell.
    let position = Vector3::new(-1e-7, 1e-7, 0.0);
    let symmetrized =
        orbit::symmetrized_position(ops.iter(), &lattice, &position, 1e-5).unwrap();
    assert_relative_eq!(symmetrized, Vector3::zeros(), epsilon = 1e-12);

    let position = Vector3::new(0.5 + 2e-7, 1.0 - 1e-7, 0.5);
    let symmetrized =
        orbit::symmetrized_position(ops.iter(), &lattice, &position, 1e-5).unwrap();
    assert_relative_eq!(symmetrized, Vector3::new(0.5, 1.0, 0.5), epsilon = 1e-12);
}

#[test]
fn test_orbit_asymmetric_atoms_distinguishes_elements() {
    let emap = ElementMap::new();
    let lattice = cubic_lattice(4.0);
    let ops = vec![
        SeitzOperator::identity(),
        SeitzOperator::translation_only(Vector3::new(6, 6, 6)),
    ];
    let mut atoms = vec![
        AtomRecord::new("Cs", Vector3::new(0.0, 0.0, 0.0), &emap).unwrap(),
        AtomRecord::new("Cl", Vector3::new(0.5, 0.5, 0.5), &emap).unwrap(),
    ];
    let representatives =
        orbit::asymmetric_atoms(ops.iter(), &lattice, &mut atoms, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(representatives, vec![0, 1]);
    assert_eq!(atoms[0].asymmetric_type, Some(0));
    assert_eq!(atoms[1].asymmetric_type, Some(1));

    let mut same = vec![
        AtomRecord::new("Fe", Vector3::new(0.0, 0.0, 0.0), &emap).unwrap(),
        AtomRecord::new("Fe", Vector3::new(0.5, 0.5, 0.5), &emap).unwrap(),
    ];
    let representatives =
        orbit::asymmetric_atoms(ops.iter(), &lattice, &mut same, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(representatives, vec![0]);
    assert_eq!(same[1].asymmetric_type, Some(0));
}

#[test]
fn test_orbit_set_equivalent_atoms_no_match() {
    let emap = ElementMap::new();
    let lattice = cubic_lattice(4.0);
    let ops = screw_pair();
    let independent = vec![AtomRecord::new("O", Vector3::new(0.1, 0.2, 0.3), &emap).unwrap()];

    let mut wrong_element = AtomRecord::new("S", Vector3::new(0.9, 0.8, 0.8), &emap).unwrap();
    assert!(!orbit::set_equivalent_atoms(
        ops.iter(),
        &lattice,
        &independent,
        &mut wrong_element,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert_relative_eq!(wrong_element.position, Vector3::new(0.9, 0.8, 0.8));
    assert_eq!(wrong_element.asymmetric_type, None);

    let mut image = AtomRecord::new("O", Vector3::new(-0.1, 0.8, -0.2), &emap).unwrap();
    assert!(orbit::set_equivalent_atoms(
        ops.iter(),
        &lattice,
        &independent,
        &mut image,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert_relative_eq!(image.position, Vector3::new(0.9, 0.8, 0.8), epsilon = 1e-12);
    // The independent atom carries no tag, so none is copied.
    assert_eq!(image.asymmetric_type, None);
}

#[test]
fn test_orbit_is_symmetry_of_floating_operations() {
    let emap = ElementMap::new();
    let structure = PeriodicStructure::from_fractional(
        cubic_lattice(4.0),
        &[
            ("Cs".to_string(), Vector3::new(0.0, 0.0, 0.0)),
            ("Cl".to_string(), Vector3::new(0.5, 0.5, 0.5)),
        ],
        &emap,
    )
    .unwrap();
    let inversion = [FloatingSeitzOperator::new(
        RotationMatrix::inversion(),
        Vector3::zeros(),
    )];
    assert!(orbit::is_symmetry_of(
        inversion.iter(),
        &structure,
        DEFAULT_OVERLAP_TOLERANCE
    ));

    let body_shift = [FloatingSeitzOperator::new(
        RotationMatrix::identity(),
        Vector3::new(0.5, 0.5, 0.5),
    )];
    assert!(!orbit::is_symmetry_of(
        body_shift.iter(),
        &structure,
        DEFAULT_OVERLAP_TOLERANCE
    ));
}

#[test]
fn test_orbit_is_symmetry_of_requires_lattice_isometries() {
    let emap = ElementMap::new();
    let tetragonal = PeriodicStructure::from_fractional(
        LatticeMetric::new(Matrix3::from_diagonal(&Vector3::new(4.0, 4.0, 5.0))).unwrap(),
        &[("Po".to_string(), Vector3::new(0.0, 0.0, 0.0))],
        &emap,
    )
    .unwrap();

    // Both operations fix the only atom, but only the four-fold axis along `z` is an isometry
    // of the tetragonal lattice.
    let c4z = [SeitzOperator::from_xyz_str("-y,x,z").unwrap()];
    let c3_diagonal = [SeitzOperator::from_xyz_str("z,x,y").unwrap()];
    assert!(orbit::is_symmetry_of(
        c4z.iter(),
        &tetragonal,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert!(!orbit::is_symmetry_of(
        c3_diagonal.iter(),
        &tetragonal,
        DEFAULT_OVERLAP_TOLERANCE
    ));
}
