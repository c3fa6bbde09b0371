use approx::assert_relative_eq;
use nalgebra::Vector3;

use crate::symmetry::floating_seitz_operator::{fract, FloatingSeitzOperator};
use crate::symmetry::rotation_matrix::RotationMatrix;
use crate::symmetry::seitz_operator::SeitzOperator;

#[test]
fn test_floating_seitz_operator_fract() {
    assert_relative_eq!(
        fract(&Vector3::new(-0.25, 1.5, 3.0)),
        Vector3::new(0.75, 0.5, 0.0)
    );
    let wrapped = fract(&Vector3::new(-1e-18, 0.0, 0.999));
    assert!(wrapped.iter().all(|x| (0.0..1.0).contains(x)));
}

#[test]
fn test_floating_seitz_operator_exact_conversion() {
    let exact = SeitzOperator::from_xyz_str("-y+1/3,x-y+2/3,z+1/6").unwrap();
    let floating = FloatingSeitzOperator::from(&exact);
    assert_relative_eq!(
        *floating.translation(),
        Vector3::new(1.0 / 3.0, 2.0 / 3.0, 1.0 / 6.0),
        epsilon = 1e-12
    );
    assert_eq!(floating.to_exact().unwrap(), exact);

    // Slightly noisy translations round to the nearest twelfth.
    let noisy = FloatingSeitzOperator::new(
        RotationMatrix::identity(),
        Vector3::new(0.5 + 1e-9, -1e-9, 0.25),
    );
    assert_eq!(
        noisy.to_exact().unwrap(),
        SeitzOperator::from_xyz_str("x+1/2,y,z+1/4").unwrap()
    );
}

#[test]
fn test_floating_seitz_operator_composition() {
    let a = FloatingSeitzOperator::from(SeitzOperator::from_xyz_str("-y,x,z+1/4").unwrap());
    let b = FloatingSeitzOperator::from(SeitzOperator::from_xyz_str("-x+1/2,y,-z").unwrap());
    let ab = a * b;
    let ab_exact = SeitzOperator::from_xyz_str("-y,x,z+1/4").unwrap()
        * SeitzOperator::from_xyz_str("-x+1/2,y,-z").unwrap();
    assert!(ab.approx_eq(&FloatingSeitzOperator::from(ab_exact), 1e-12));
    assert!((ab * ab.inverse()).approx_eq(
        &FloatingSeitzOperator::from(SeitzOperator::identity()),
        1e-12
    ));
}

#[test]
fn test_floating_seitz_operator_application() {
    let op = FloatingSeitzOperator::from(SeitzOperator::from_xyz_str("-x+1/2,-y,z+1/2").unwrap());
    assert_relative_eq!(
        op.apply(&Vector3::new(0.1, 0.2, 0.7)),
        Vector3::new(0.4, -0.2, 1.2),
        epsilon = 1e-12
    );
}

#[test]
fn test_floating_seitz_operator_with_origin_at() {
    let origin = Vector3::new(0.1, 0.2, 0.3);
    let inversion = FloatingSeitzOperator::new(RotationMatrix::inversion(), Vector3::zeros());
    let shifted = inversion.with_origin_at(&origin);
    assert_relative_eq!(*shifted.translation(), Vector3::new(0.2, 0.4, 0.6), epsilon = 1e-12);
    assert_relative_eq!(shifted.apply(&origin), origin, epsilon = 1e-12);

    // Pure translations are unaffected by a change of origin.
    let translation = FloatingSeitzOperator::new(RotationMatrix::identity(), Vector3::new(0.5, 0.5, 0.0));
    assert_relative_eq!(
        *translation.with_origin_at(&origin).translation(),
        Vector3::new(0.5, 0.5, 0.0),
        epsilon = 1e-12
    );
}
