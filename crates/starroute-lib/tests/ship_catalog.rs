mod common;

use common::fixtures_dir;
use starroute_lib::error::Error;
use starroute_lib::ShipCatalog;

const HEADER: &str = "name,dry_mass,fuel_capacity,fuel_power,fuel_multiplier,max_fuel_per_jump,optimised_mass,range_bonus,scoop_rate\n";

#[test]
fn loads_fixture_catalog_and_lists_ships() {
    let path = fixtures_dir().join("ship_data.csv");
    let catalog = ShipCatalog::from_path(&path).expect("fixture should load");

    assert_eq!(catalog.ship_names(), vec!["Courier", "Explorer", "Hauler"]);
    assert_eq!(catalog.source_path(), Some(path.as_path()));

    let explorer = catalog.get("explorer").expect("explorer ship present");
    assert_eq!(explorer.fuel_capacity, 32.0);
    assert_eq!(explorer.range_bonus, 10.5);
    assert!(explorer.can_scoop());

    let hauler = catalog.get("HAULER").expect("hauler ship present");
    assert!(!hauler.can_scoop());
}

#[test]
fn rejects_duplicate_names_case_insensitive() {
    let csv = HEADER.to_string()
        + "Courier,936,64,2,0.02,8,2000,0,1\n"
        + "courier,900,32,2,0.02,8,2000,0,1\n";

    let err = ShipCatalog::from_reader(csv.as_bytes()).expect_err("should reject duplicates");
    match err {
        Error::DuplicateShipName { name } => assert_eq!(name, "courier"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn rejects_invalid_numeric_values() {
    let csv = HEADER.to_string() + "Courier,936,64,2,0.02,8,0,0,1\n";

    let err = ShipCatalog::from_reader(csv.as_bytes()).expect_err("should reject invalid values");
    match err {
        Error::ShipDataValidation { message } => assert!(message.contains("optimised_mass")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn optional_columns_default_to_zero() {
    let csv = "name,dry_mass,fuel_capacity,fuel_power,fuel_multiplier,max_fuel_per_jump,optimised_mass\n\
               Sparrow,50,8,2,0.01,4,500\n";

    let catalog = ShipCatalog::from_reader(csv.as_bytes()).expect("optional columns");
    let ship = catalog.get("sparrow").expect("ship present");
    assert_eq!(ship.range_bonus, 0.0);
    assert_eq!(ship.scoop_rate, 0.0);
}

#[test]
fn rejects_unparseable_rows() {
    let csv = HEADER.to_string() + "Courier,heavy,64,2,0.02,8,2000,0,1\n";
    assert!(matches!(
        ShipCatalog::from_reader(csv.as_bytes()),
        Err(Error::ShipDataValidation { .. })
    ));
}
