use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};
use proptest::prelude::*;

use crate::auxiliary::atom::{AtomRecord, ElementMap};
use crate::auxiliary::lattice::{LatticeMetric, DEFAULT_OVERLAP_TOLERANCE};
use crate::auxiliary::structure::PeriodicStructure;
use crate::symmetry::centring::Centring;
use crate::symmetry::change_of_basis::{
    monoclinic_centring_settings, ChangeOfBasis, RationalMatrix3,
};
use crate::symmetry::operation_set::{decode_operators, SymmetryOperationSet};
use crate::symmetry::seitz_operator::SeitzOperator;

fn pm3m() -> SymmetryOperationSet {
    let mut generators = decode_operators(b"402045201").unwrap();
    generators.push(SeitzOperator::inversion_through(&Vector3::zeros()));
    SymmetryOperationSet::from_generators(&generators)
}

fn fm3m() -> SymmetryOperationSet {
    pm3m().adding_centring_operations(Centring::Face)
}

fn cubic(a: f64) -> LatticeMetric {
    LatticeMetric::new(Matrix3::from_diagonal_element(a)).unwrap()
}

fn atoms(emap: &ElementMap, specs: &[(&str, [f64; 3])]) -> Vec<AtomRecord> {
    specs
        .iter()
        .map(|(symbol, position)| AtomRecord::new(symbol, Vector3::from(*position), emap).unwrap())
        .collect()
}

#[test]
fn test_operation_set_closure_inversion() {
    let inversion = SeitzOperator::inversion_through(&Vector3::zeros());
    let set = SymmetryOperationSet::from_generators(&[inversion]);
    assert_eq!(set.len(), 2);
    assert!(set.contains(&SeitzOperator::identity()));
    assert!(set.contains(&inversion));
    assert_eq!(set.centring(), Centring::Primitive);
    assert!(set.is_closed());
    assert!(set.is_centrosymmetric());

    let trivial = SymmetryOperationSet::from_generators(&[]);
    assert_eq!(trivial.len(), 1);
    assert!(trivial.contains(&SeitzOperator::identity()));
}

#[test]
fn test_operation_set_closure_cubic() {
    let set = pm3m();
    assert_eq!(set.len(), 48);
    assert!(set.is_closed());
    assert!(set.iter().all(|op| set.contains(&op.inverse())));
    assert_eq!(set.rotations().len(), 48);
    assert_eq!(set.proper_rotations().len(), 24);
    assert_eq!(set.centring(), Centring::Primitive);
    assert_eq!(set.lattice_translations(), vec![Vector3::zeros()]);

    // Duplicated and redundant generators do not change the group.
    let mut generators = decode_operators(b"402045201402012").unwrap();
    generators.push(SeitzOperator::inversion_through(&Vector3::zeros()));
    generators.push(SeitzOperator::inversion_through(&Vector3::zeros()));
    assert_eq!(SymmetryOperationSet::from_generators(&generators), set);
}

#[test]
fn test_operation_set_closure_nonsymmorphic() {
    // P 21 21 21
    let generators = ["-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2"]
        .iter()
        .map(|xyz| SeitzOperator::from_xyz_str(xyz).unwrap())
        .collect::<Vec<_>>();
    let set = SymmetryOperationSet::from_generators(&generators);
    assert_eq!(set.len(), 4);
    assert!(set.is_closed());
    assert!(set.contains(&SeitzOperator::from_xyz_str("x+1/2,-y+1/2,-z").unwrap()));
    assert_eq!(set.centring(), Centring::Primitive);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn test_operation_set_closure_properties(
        choices in proptest::collection::vec((0usize..48, 0i32..8), 1..4)
    ) {
        let rotations = pm3m().rotations();
        let generators = choices
            .iter()
            .map(|(r, bits)| {
                SeitzOperator::new(
                    rotations[*r],
                    Vector3::new(6 * (bits & 1), 6 * ((bits >> 1) & 1), 6 * ((bits >> 2) & 1)),
                )
            })
            .collect::<Vec<_>>();
        let set = SymmetryOperationSet::from_generators(&generators);
        prop_assert!(set.contains(&SeitzOperator::identity()));
        prop_assert!(generators.iter().all(|g| set.contains(g)));
        prop_assert!(set.is_closed());
        prop_assert!(set.iter().all(|op| set.contains(&op.inverse())));
        prop_assert_eq!(set.centring(), Centring::classify(&set.lattice_translations()));
    }
}

#[test]
fn test_operation_set_body_centring() {
    let set = SymmetryOperationSet::from_generators(&[
        SeitzOperator::translation_only(Vector3::new(6, 6, 6)),
        SeitzOperator::inversion_through(&Vector3::zeros()),
    ]);
    assert_eq!(set.len(), 4);
    assert_eq!(
        set.lattice_translations(),
        vec![Vector3::zeros(), Vector3::new(6, 6, 6)]
    );
    assert_eq!(set.centring(), Centring::Body);

    let body = SymmetryOperationSet::from_generators(&[SeitzOperator::inversion_through(
        &Vector3::zeros(),
    )])
    .adding_centring_operations(Centring::Body);
    assert_eq!(body, set);
}

#[test]
fn test_operation_set_centring_round_trip() {
    let p2 = SymmetryOperationSet::from_encoding(b"012315").unwrap();
    for centring in [
        Centring::Primitive,
        Centring::Body,
        Centring::AFace,
        Centring::BFace,
        Centring::CFace,
        Centring::Face,
        Centring::R,
        Centring::H,
        Centring::D,
    ] {
        let set = SymmetryOperationSet::new([SeitzOperator::identity()])
            .adding_centring_operations(centring);
        assert_eq!(set.len(), centring.multiplicity());
        assert_eq!(set.centring(), centring, "{centring}");

        let centred = p2.adding_centring_operations(centring);
        assert_eq!(centred.len(), 2 * centring.multiplicity());
        assert_eq!(centred.centring(), centring, "{centring}");
    }
}

#[test]
fn test_operation_set_face_centring() {
    let set = fm3m();
    assert_eq!(set.len(), 192);
    assert!(set.is_closed());
    assert_eq!(set.centring(), Centring::Face);
    assert_eq!(
        set.lattice_translations(),
        vec![
            Vector3::zeros(),
            Vector3::new(0, 6, 6),
            Vector3::new(6, 0, 6),
            Vector3::new(6, 6, 0)
        ]
    );
}

#[test]
fn test_operation_set_from_encoding() {
    let set = SymmetryOperationSet::from_encoding(b"012342").unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains(&SeitzOperator::from_xyz_str("-x,-y,z").unwrap()));
    assert!(SymmetryOperationSet::from_encoding(b"01234").is_err());
    assert!(SymmetryOperationSet::from_encoding(b"000").is_err());
    assert!(decode_operators(b"").unwrap().is_empty());
}

#[test]
fn test_operation_set_changed_basis() {
    let face_to_primitive = ChangeOfBasis::from_rational(
        RationalMatrix3::new(Matrix3::new(0, 1, 1, 1, 0, 1, 1, 1, 0), 2).unwrap(),
    )
    .unwrap();
    let primitive = fm3m().changed_basis(&face_to_primitive).unwrap();
    assert_eq!(primitive.len(), 48);
    assert_eq!(primitive.centring(), Centring::Primitive);
    assert!(primitive.is_closed());

    let back = primitive
        .changed_basis(&face_to_primitive.inverse().unwrap())
        .unwrap();
    assert_eq!(back, pm3m());
    assert_eq!(back.adding_centring_operations(Centring::Face), fm3m());
}

#[test]
fn test_operation_set_changed_basis_round_trip() {
    let c2 = SymmetryOperationSet::from_encoding(b"012315")
        .unwrap()
        .adding_centring_operations(Centring::CFace);
    let p21 = SymmetryOperationSet::from_generators(&[
        SeitzOperator::from_xyz_str("-x,y+1/2,-z").unwrap()
    ]);
    for cob in monoclinic_centring_settings().unwrap() {
        for set in [&c2, &p21] {
            let transformed = set.changed_basis(&cob).unwrap();
            assert_eq!(transformed.len(), set.len());
            let back = transformed.changed_basis(&cob.inverse()).unwrap();
            assert_eq!(&back, set);
            assert_eq!(back.centring(), set.centring());
        }
    }

    let settings = monoclinic_centring_settings().unwrap();
    assert_eq!(c2.changed_basis(&settings[1]).unwrap().centring(), Centring::AFace);
}

#[test]
fn test_operation_set_face_orbit() {
    let emap = ElementMap::new();
    let lattice = cubic(4.0);
    let mut cu = atoms(
        &emap,
        &[
            ("Cu", [0.0, 0.0, 0.0]),
            ("Cu", [0.5, 0.5, 0.0]),
            ("Cu", [0.5, 0.0, 0.5]),
        ],
    );
    let representatives = fm3m().asymmetric_atoms(&lattice, &mut cu, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(representatives, vec![0]);
    assert!(cu.iter().all(|atom| atom.asymmetric_type == Some(0)));

    // Without centring, the three sites are distinct orbits.
    let representatives = pm3m().asymmetric_atoms(&lattice, &mut cu, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(representatives, vec![0, 1]);
    assert_eq!(
        cu.iter().map(|atom| atom.asymmetric_type).collect::<Vec<_>>(),
        vec![Some(0), Some(1), Some(1)]
    );
}

#[test]
fn test_operation_set_orbits_by_element() {
    let emap = ElementMap::new();
    let lattice = cubic(5.64);
    let mut nacl = atoms(
        &emap,
        &[
            ("Na", [0.0, 0.0, 0.0]),
            ("Na", [0.0, 0.5, 0.5]),
            ("Cl", [0.5, 0.5, 0.5]),
            ("Na", [0.5, 0.0, 0.5]),
            ("Cl", [0.0, 0.0, 0.5]),
            ("Na", [0.5, 0.5, 0.0]),
            ("Cl", [0.5, 0.0, 0.0]),
            ("Cl", [0.0, 0.5, 0.0]),
        ],
    );
    let set = fm3m();
    let representatives = set.asymmetric_atoms(&lattice, &mut nacl, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(representatives, vec![0, 2]);
    let tags = nacl
        .iter()
        .map(|atom| atom.asymmetric_type)
        .collect::<Vec<_>>();
    assert_eq!(
        tags,
        vec![Some(0), Some(0), Some(1), Some(0), Some(1), Some(0), Some(1), Some(1)]
    );

    // Orbit construction is idempotent, also after symmetrisation.
    set.symmetrize(&lattice, &mut nacl, DEFAULT_OVERLAP_TOLERANCE)
        .unwrap();
    set.asymmetric_atoms(&lattice, &mut nacl, DEFAULT_OVERLAP_TOLERANCE);
    assert_eq!(
        nacl.iter()
            .map(|atom| atom.asymmetric_type)
            .collect::<Vec<_>>(),
        tags
    );
}

#[test]
fn test_operation_set_orbit_tie_break_is_order_sensitive() {
    let emap = ElementMap::new();
    let lattice = cubic(1.0);
    let p1 = SymmetryOperationSet::from_generators(&[]);
    let loose = 0.3;

    let mut first = atoms(
        &emap,
        &[("C", [0.0, 0.0, 0.0]), ("C", [0.5, 0.0, 0.0]), ("C", [0.25, 0.0, 0.0])],
    );
    assert_eq!(p1.asymmetric_atoms(&lattice, &mut first, loose), vec![0, 1]);
    assert_eq!(first[2].asymmetric_type, Some(0));

    let mut second = atoms(
        &emap,
        &[("C", [0.5, 0.0, 0.0]), ("C", [0.0, 0.0, 0.0]), ("C", [0.25, 0.0, 0.0])],
    );
    assert_eq!(p1.asymmetric_atoms(&lattice, &mut second, loose), vec![0, 1]);
    // The ambiguous atom joins the orbit of whichever representative comes first.
    assert_eq!(second[2].asymmetric_type, Some(0));
    assert_relative_eq!(second[0].position, Vector3::new(0.5, 0.0, 0.0));
}

#[test]
fn test_operation_set_set_equivalent_atoms() {
    let emap = ElementMap::new();
    let lattice = cubic(10.0);
    let p1bar =
        SymmetryOperationSet::from_generators(&[SeitzOperator::inversion_through(&Vector3::zeros())]);
    let mut independent = atoms(&emap, &[("O", [0.1, 0.2, 0.3]), ("Si", [0.0, 0.0, 0.0])]);
    independent[0].asymmetric_type = Some(0);
    independent[1].asymmetric_type = Some(1);

    let mut copy = AtomRecord::new("O", Vector3::new(0.9 + 1e-7, 0.8, 0.7 - 1e-7), &emap).unwrap();
    assert!(p1bar.set_equivalent_atoms(
        &lattice,
        &independent,
        &mut copy,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert_relative_eq!(copy.position, Vector3::new(0.9, 0.8, 0.7), epsilon = 1e-12);
    assert_eq!(copy.asymmetric_type, Some(0));

    // An atom of another element at the same site is not matched.
    let mut impostor = AtomRecord::new("S", Vector3::new(0.9, 0.8, 0.7), &emap).unwrap();
    assert!(!p1bar.set_equivalent_atoms(
        &lattice,
        &independent,
        &mut impostor,
        DEFAULT_OVERLAP_TOLERANCE
    ));
    assert_relative_eq!(impostor.position, Vector3::new(0.9, 0.8, 0.7));
    assert_eq!(impostor.asymmetric_type, None);

    // With a loose tolerance the first independent atom wins.
    let mut near = atoms(&emap, &[("C", [0.0, 0.0, 0.0]), ("C", [0.02, 0.0, 0.0])]);
    near[0].asymmetric_type = Some(0);
    near[1].asymmetric_type = Some(1);
    let mut ambiguous = AtomRecord::new("C", Vector3::new(0.01, 0.0, 0.0), &emap).unwrap();
    assert!(p1bar.set_equivalent_atoms(&lattice, &near, &mut ambiguous, 0.5));
    assert_eq!(ambiguous.asymmetric_type, Some(0));
    assert_relative_eq!(ambiguous.position, Vector3::zeros());
}

#[test]
fn test_operation_set_symmetrized_position() {
    let lattice = cubic(4.0);
    let set = pm3m();

    let noisy_centre = Vector3::new(0.5 + 1e-7, 0.5 - 1e-7, 0.5);
    assert_relative_eq!(
        set.symmetrized_position(&lattice, &noisy_centre, DEFAULT_OVERLAP_TOLERANCE)
            .unwrap(),
        Vector3::new(0.5, 0.5, 0.5),
        epsilon = 1e-12
    );

    let noisy_edge = Vector3::new(0.5 + 2e-7, -1e-7, 1.0 - 1e-7);
    assert_relative_eq!(
        set.symmetrized_position(&lattice, &noisy_edge, DEFAULT_OVERLAP_TOLERANCE)
            .unwrap()
            .map(|x| x - x.floor()),
        Vector3::new(0.5, 0.0, 0.0),
        epsilon = 1e-12
    );

    let general = Vector3::new(0.1, 0.2, 0.3);
    assert_relative_eq!(
        set.symmetrized_position(&lattice, &general, DEFAULT_OVERLAP_TOLERANCE)
            .unwrap(),
        general,
        epsilon = 1e-12
    );

    // No operation fixes the site.
    let without_identity =
        SymmetryOperationSet::new([SeitzOperator::inversion_through(&Vector3::zeros())]);
    assert!(without_identity
        .symmetrized_position(&lattice, &general, DEFAULT_OVERLAP_TOLERANCE)
        .is_err());
}

#[test]
fn test_operation_set_symmetric_positions() {
    let lattice = cubic(3.6);
    assert_eq!(pm3m().symmetric_positions(&Vector3::zeros()).len(), 48);
    assert_eq!(
        pm3m()
            .expanded_positions(&lattice, &Vector3::zeros(), DEFAULT_OVERLAP_TOLERANCE)
            .len(),
        1
    );
    assert_eq!(
        pm3m()
            .expanded_positions(&lattice, &Vector3::new(0.5, 0.0, 0.0), DEFAULT_OVERLAP_TOLERANCE)
            .len(),
        3
    );
    assert_eq!(
        fm3m()
            .expanded_positions(&lattice, &Vector3::zeros(), DEFAULT_OVERLAP_TOLERANCE)
            .len(),
        4
    );
    let tetrahedral = fm3m().expanded_positions(
        &lattice,
        &Vector3::new(0.25, 0.25, 0.25),
        DEFAULT_OVERLAP_TOLERANCE,
    );
    assert_eq!(tetrahedral.len(), 8);
    assert!(tetrahedral
        .iter()
        .all(|p| p.iter().all(|x| (0.0..1.0).contains(x))));
}

#[test]
fn test_operation_set_is_symmetry_of() {
    let emap = ElementMap::new();
    let cscl = PeriodicStructure::from_fractional(
        cubic(4.12),
        &[
            ("Cs".to_string(), Vector3::new(0.0, 0.0, 0.0)),
            ("Cl".to_string(), Vector3::new(0.5, 0.5, 0.5)),
        ],
        &emap,
    )
    .unwrap();
    assert!(pm3m().is_symmetry_of(&cscl, DEFAULT_OVERLAP_TOLERANCE));
    assert!(!fm3m().is_symmetry_of(&cscl, DEFAULT_OVERLAP_TOLERANCE));
    assert!(!pm3m()
        .adding_centring_operations(Centring::Body)
        .is_symmetry_of(&cscl, DEFAULT_OVERLAP_TOLERANCE));
}
