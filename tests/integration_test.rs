use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};

use crysym::auxiliary::atom::ElementMap;
use crysym::auxiliary::lattice::{CellParameters, LatticeMetric};
use crysym::auxiliary::structure::PeriodicStructure;
use crysym::drivers::space_group_detection::{
    SpaceGroupDetectionDriver, SpaceGroupDetectionParams,
};
use crysym::drivers::CrySymDriver;
use crysym::spacegroup::{BuiltinSpaceGroupTable, SpaceGroupSetting, SpaceGroupTable};
use crysym::symmetry::centring::Centring;
use crysym::symmetry::change_of_basis::{BasisTransformation, ChangeOfBasis, RationalMatrix3};
use crysym::symmetry::seitz_operator::SeitzOperator;

struct MonoclinicTable(Vec<SpaceGroupSetting>);

impl SpaceGroupTable for MonoclinicTable {
    fn lookup(&self, hall_number: u32) -> Option<&SpaceGroupSetting> {
        self.0.iter().find(|setting| setting.hall_number == hall_number)
    }

    fn hall_numbers(&self) -> Vec<u32> {
        self.0.iter().map(|setting| setting.hall_number).collect()
    }
}

fn fcc_copper() -> PeriodicStructure {
    PeriodicStructure::from_fractional(
        LatticeMetric::new(Matrix3::from_diagonal_element(3.61)).unwrap(),
        &[
            ("Cu".to_string(), Vector3::new(0.0, 0.0, 0.0)),
            ("Cu".to_string(), Vector3::new(0.5, 0.5, 0.0)),
            ("Cu".to_string(), Vector3::new(0.5, 0.0, 0.5)),
            ("Cu".to_string(), Vector3::new(0.0, 0.5, 0.5)),
        ],
        &ElementMap::new(),
    )
    .unwrap()
}

#[test]
fn test_detection_with_builtin_table() {
    let structure = fcc_copper();
    let params = SpaceGroupDetectionParams::builder().build().unwrap();
    let table = BuiltinSpaceGroupTable::new();
    let mut driver = SpaceGroupDetectionDriver::builder()
        .parameters(&params)
        .structure(&structure)
        .table(&table)
        .build()
        .unwrap();
    driver.run().unwrap();
    let sg = driver.result().unwrap().space_group.as_ref().unwrap();
    assert_eq!(sg.hm_symbol, "F m -3 m");
    assert_eq!(sg.operations.centring(), Centring::Face);
    assert!(sg.operations.is_closed());
}

#[test]
fn test_detection_with_external_table() {
    let table = MonoclinicTable(vec![
        SpaceGroupSetting {
            hall_number: 1,
            space_group_number: 1,
            hall_symbol: "P 1",
            hm_symbol: "P 1",
            encoded_generators: b"012",
            is_centrosymmetric: false,
            inversion_center: [0, 0, 0],
            centring: Centring::Primitive,
        },
        SpaceGroupSetting {
            hall_number: 4,
            space_group_number: 4,
            hall_symbol: "P 2yb",
            hm_symbol: "P 1 21 1",
            encoded_generators: b"3=5",
            is_centrosymmetric: false,
            inversion_center: [0, 0, 0],
            centring: Centring::Primitive,
        },
    ]);
    let lattice = LatticeMetric::from_parameters(&CellParameters {
        a: 4.0,
        b: 5.0,
        c: 6.0,
        alpha: 90.0,
        beta: 100.0,
        gamma: 90.0,
    })
    .unwrap();
    let structure = PeriodicStructure::from_fractional(
        lattice,
        &[
            ("C".to_string(), Vector3::new(0.1, 0.2, 0.3)),
            ("C".to_string(), Vector3::new(0.9, 0.7, 0.7)),
        ],
        &ElementMap::new(),
    )
    .unwrap();

    let params = SpaceGroupDetectionParams::builder().build().unwrap();
    let mut driver = SpaceGroupDetectionDriver::builder()
        .parameters(&params)
        .structure(&structure)
        .table(&table)
        .build()
        .unwrap();
    driver.run().unwrap();
    let result = driver.result().unwrap();
    assert_eq!(result.trials.len(), 2);
    let sg = result.space_group.as_ref().unwrap();
    assert_eq!(sg.hall_number, 4);
    assert_eq!(sg.operations.len(), 2);
    assert_eq!(sg.asymmetric_atoms, vec![0]);
    assert!(sg
        .operations
        .contains(&SeitzOperator::from_xyz_str("-x,y+1/2,-z").unwrap()));
}

#[test]
fn test_face_centred_to_primitive_setting() {
    let structure = fcc_copper();
    let fm3m = BuiltinSpaceGroupTable::new()
        .get(523)
        .unwrap()
        .full_operations()
        .unwrap();
    let face_to_primitive = ChangeOfBasis::from_rational(
        RationalMatrix3::new(Matrix3::new(0, 1, 1, 1, 0, 1, 1, 1, 0), 2).unwrap(),
    )
    .unwrap();

    let primitive_ops = fm3m.changed_basis(&face_to_primitive).unwrap();
    assert_eq!(primitive_ops.len(), 48);
    assert_eq!(primitive_ops.centring(), Centring::Primitive);

    let primitive_lattice = structure.lattice().transformed(&face_to_primitive).unwrap();
    assert_relative_eq!(
        primitive_lattice.volume(),
        structure.lattice().volume() / 4.0,
        max_relative = 1e-12
    );
    for atom in structure.atoms() {
        let image = face_to_primitive.transform_position(&atom.position);
        assert!(primitive_lattice.is_overlap(&image, &Vector3::zeros(), 1e-8));
    }
}
