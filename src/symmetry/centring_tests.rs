use nalgebra::Vector3;

use crate::symmetry::centring::Centring;

const ALL_CENTRINGS: [Centring; 9] = [
    Centring::Primitive,
    Centring::Body,
    Centring::AFace,
    Centring::BFace,
    Centring::CFace,
    Centring::Face,
    Centring::R,
    Centring::H,
    Centring::D,
];

#[test]
fn test_centring_translations_classify_back() {
    for centring in ALL_CENTRINGS {
        let translations = centring.translations();
        assert_eq!(translations[0], Vector3::zeros());
        assert_eq!(Centring::classify(&translations), centring, "{centring}");
    }
}

#[test]
fn test_centring_multiplicities() {
    assert_eq!(Centring::Primitive.multiplicity(), 1);
    assert_eq!(Centring::Body.multiplicity(), 2);
    assert_eq!(Centring::CFace.multiplicity(), 2);
    assert_eq!(Centring::Face.multiplicity(), 4);
    assert_eq!(Centring::R.multiplicity(), 3);
    assert_eq!(Centring::H.multiplicity(), 3);
    assert_eq!(Centring::D.multiplicity(), 3);
}

#[test]
fn test_centring_classify_fallback() {
    assert_eq!(Centring::classify(&[]), Centring::Primitive);
    let five = [
        Vector3::zeros(),
        Vector3::new(6, 0, 0),
        Vector3::new(0, 6, 0),
        Vector3::new(0, 0, 6),
        Vector3::new(6, 6, 6),
    ];
    assert_eq!(Centring::classify(&five), Centring::Primitive);
}

#[test]
fn test_centring_symbols() {
    for centring in ALL_CENTRINGS {
        assert_eq!(Centring::from_symbol(centring.symbol()).unwrap(), centring);
    }
    assert!(Centring::from_symbol('Q').is_err());

    assert_eq!(Centring::from_hall_symbol("-F 4 2 3").unwrap(), Centring::Face);
    assert_eq!(Centring::from_hall_symbol("P 2y").unwrap(), Centring::Primitive);
    assert_eq!(Centring::from_hall_symbol(" C 2y").unwrap(), Centring::CFace);
    assert!(Centring::from_hall_symbol("").is_err());
    assert_eq!(Centring::Body.to_string(), "body-centred (I)");
}
