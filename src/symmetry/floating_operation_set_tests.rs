use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crate::auxiliary::atom::{AtomRecord, ElementMap};
use crate::auxiliary::lattice::{LatticeMetric, DEFAULT_OVERLAP_TOLERANCE};
use crate::symmetry::centring::Centring;
use crate::symmetry::change_of_basis::{ChangeOfBasis, RationalMatrix3};
use crate::symmetry::floating_operation_set::FloatingSymmetryOperationSet;
use crate::symmetry::floating_seitz_operator::FloatingSeitzOperator;
use crate::symmetry::operation_set::{decode_operators, SymmetryOperationSet};
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::SeitzOperator;

fn fm3m() -> SymmetryOperationSet {
    let mut generators = decode_operators(b"402045201").unwrap();
    generators.push(SeitzOperator::inversion_through(&Vector3::zeros()));
    SymmetryOperationSet::from_generators(&generators).adding_centring_operations(Centring::Face)
}

#[test]
fn test_floating_operation_set_conversion() {
    let exact = fm3m();
    let floating = exact.to_floating();
    assert_eq!(floating.len(), 192);
    assert_eq!(floating.centring(), Centring::Face);
    assert_eq!(floating.to_exact().unwrap(), exact);
}

#[test]
fn test_floating_operation_set_merging() {
    let noisy = FloatingSymmetryOperationSet::new([
        FloatingSeitzOperator::new(RotationMatrix::identity(), Vector3::zeros()),
        FloatingSeitzOperator::new(RotationMatrix::identity(), Vector3::new(1e-9, 0.0, -1e-9)),
        FloatingSeitzOperator::new(RotationMatrix::identity(), Vector3::new(0.5, 0.5, 0.5)),
        FloatingSeitzOperator::new(
            RotationMatrix::identity(),
            Vector3::new(0.5 - 1e-9, 0.5, 1.5),
        ),
    ])
    .unwrap();
    assert_eq!(noisy.len(), 2);
    assert_eq!(noisy.centring(), Centring::Body);

    let centred = FloatingSymmetryOperationSet::new([FloatingSeitzOperator::new(
        RotationMatrix::identity(),
        Vector3::zeros(),
    )])
    .unwrap()
    .adding_centring_operations(Centring::R)
    .unwrap();
    assert_eq!(centred.len(), 3);
    assert_eq!(centred.centring(), Centring::R);
}

#[test]
fn test_floating_operation_set_changed_basis() {
    let face_to_primitive = ChangeOfBasis::from_rational(
        RationalMatrix3::new(Matrix3::new(0, 1, 1, 1, 0, 1, 1, 1, 0), 2).unwrap(),
    )
    .unwrap();
    let exact = fm3m().changed_basis(&face_to_primitive).unwrap();
    let floating = fm3m()
        .to_floating()
        .changed_basis(&face_to_primitive)
        .unwrap();
    assert_eq!(floating.len(), 48);
    assert_eq!(floating.centring(), Centring::Primitive);
    assert_eq!(floating.to_exact().unwrap(), exact);
}

#[test]
fn test_floating_operation_set_orbits() {
    let emap = ElementMap::new();
    let lattice = LatticeMetric::new(Matrix3::from_diagonal_element(3.61)).unwrap();
    let floating = fm3m().to_floating();
    let mut cu = [
        [0.0, 0.0, 0.0],
        [0.5, 0.5, 1e-7],
        [0.5, 0.0, 0.5],
        [0.0, 0.5, 0.5],
    ]
    .iter()
    .map(|p| AtomRecord::new("Cu", Vector3::from(*p), &emap).unwrap())
    .collect::<Vec<_>>();
    assert_eq!(
        floating.asymmetric_atoms(&lattice, &mut cu, DEFAULT_OVERLAP_TOLERANCE),
        vec![0]
    );

    floating
        .symmetrize(&lattice, &mut cu, DEFAULT_OVERLAP_TOLERANCE)
        .unwrap();
    assert_relative_eq!(cu[1].position, Vector3::new(0.5, 0.5, 0.0), epsilon = 1e-12);

    let representative = vec![cu[0].clone()];
    let mut copy = AtomRecord::new("Cu", Vector3::new(0.5, 1e-7, 0.5), &emap).unwrap();
    assert!(floating.set_equivalent_atoms(
        &lattice,
        &representative,
        &mut copy,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert_relative_eq!(copy.position, Vector3::new(0.5, 0.0, 0.5), epsilon = 1e-12);
    assert_eq!(copy.asymmetric_type, Some(0));

    assert_eq!(
        floating
            .expanded_positions(&lattice, &Vector3::new(0.25, 0.25, 0.25), DEFAULT_OVERLAP_TOLERANCE)
            .len(),
        8
    );
}
