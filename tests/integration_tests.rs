// End-to-End Integration Tests for MotorDB
// These tests verify complete dealership flows across all three tables

use chrono::{NaiveDate, NaiveDateTime};
use motordb::{Engine, Model, Options, Sale, Vehicle, VehicleStatus};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn timestamp(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn model(id: i64, name: &str, brand: &str) -> Model {
    Model {
        id,
        name: name.to_string(),
        brand: brand.to_string(),
    }
}

fn vehicle(vin: &str, model: i64, price: &str) -> Vehicle {
    Vehicle {
        vin: vin.to_string(),
        model,
        price: price.parse().unwrap(),
        date_start: timestamp(2023, 9, 3),
        status: VehicleStatus::Available,
    }
}

fn sale(vin: &str, cost: &str) -> Sale {
    Sale {
        sales_number: format!("20240105#{}", vin),
        vehicle_vin: vin.to_string(),
        sales_date: timestamp(2024, 1, 5),
        cost: cost.parse().unwrap(),
    }
}

/// Test the complete sell / inspect / revert flow
#[test]
fn test_e2e_sell_and_revert() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), Options::default()).unwrap();

    engine.add_model(model(1, "Vesta", "Lada")).unwrap();
    engine.add_vehicle(vehicle("VIN1", 1, "2500.99")).unwrap();

    // Sell the vehicle
    let sold = engine.sell(sale("VIN1", "2399.99")).unwrap();
    assert_eq!(sold.status, VehicleStatus::Sold);

    // Full info now carries the sale date and cost
    let info = engine.full_info("VIN1").unwrap().unwrap();
    assert_eq!(info.status, VehicleStatus::Sold);
    assert_eq!(info.model_name, "Vesta");
    assert_eq!(info.model_brand, "Lada");
    assert_eq!(info.sales_date, Some(timestamp(2024, 1, 5)));
    assert_eq!(info.sales_cost, Some("2399.99".parse().unwrap()));

    // Revert the sale using its identifier
    let reverted = engine.revert_sale("20240105#VIN1").unwrap();
    assert_eq!(reverted.status, VehicleStatus::Available);

    // The sale fields are empty again
    let info = engine.full_info("VIN1").unwrap().unwrap();
    assert_eq!(info.status, VehicleStatus::Available);
    assert_eq!(info.sales_date, None);
    assert_eq!(info.sales_cost, None);

    assert_eq!(engine.sale_count(), 0);
}

/// Test full info on an unknown vin and on a dangling model reference
#[test]
fn test_e2e_full_info_joins() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), Options::default()).unwrap();

    // Unknown vin is absence, not an error
    assert!(engine.full_info("GHOST").unwrap().is_none());

    // A vehicle referencing a missing model fails the required join
    engine.add_vehicle(vehicle("VIN1", 99, "1000.00")).unwrap();
    assert!(engine.full_info("VIN1").is_err());
}

/// Test filtering vehicles by status
#[test]
fn test_e2e_vehicles_by_status() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), Options::default()).unwrap();

    engine.add_model(model(1, "Vesta", "Lada")).unwrap();
    for vin in ["VIN1", "VIN2", "VIN3"] {
        engine.add_vehicle(vehicle(vin, 1, "2500.00")).unwrap();
    }
    engine.sell(sale("VIN2", "2400.00")).unwrap();

    let available = engine.vehicles_by_status(VehicleStatus::Available).unwrap();
    let vins: Vec<&str> = available.iter().map(|v| v.vin.as_str()).collect();
    assert_eq!(vins, vec!["VIN1", "VIN3"]);

    let sold = engine.vehicles_by_status(VehicleStatus::Sold).unwrap();
    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].vin, "VIN2");

    assert!(engine
        .vehicles_by_status(VehicleStatus::Delivery)
        .unwrap()
        .is_empty());
}

/// Test the top-selling-models report, including the stable tie-break
#[test]
fn test_e2e_top_selling_models() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), Options::default()).unwrap();

    engine.add_model(model(1, "Vesta", "Lada")).unwrap();
    engine.add_model(model(2, "Niva", "Lada")).unwrap();
    engine.add_model(model(3, "Granta", "Lada")).unwrap();
    engine.add_model(model(4, "Logan", "Renault")).unwrap();

    // Six sales across four models: model 1 sells three times, the rest
    // once each, encountered in the order 1, 2, 3, 4.
    let fleet = [
        ("VIN1", 1),
        ("VIN2", 2),
        ("VIN3", 1),
        ("VIN4", 3),
        ("VIN5", 4),
        ("VIN6", 1),
    ];
    for (vin, model_id) in fleet {
        engine.add_vehicle(vehicle(vin, model_id, "2500.00")).unwrap();
    }
    for vin in ["VIN1", "VIN2", "VIN3", "VIN4", "VIN5", "VIN6"] {
        if vin == "VIN5" {
            continue; // model 4's vehicle stays unsold at first
        }
        engine.sell(sale(vin, "2400.00")).unwrap();
    }
    engine.sell(sale("VIN5", "2400.00")).unwrap();

    // Counts: model 1 → 3, models 2, 3, 4 → 1 each. The tie among the
    // single-sale models keeps sales-scan encounter order: 2, then 3.
    let top = engine.top_selling_models(3).unwrap();
    assert_eq!(top.len(), 3);

    assert_eq!(top[0].model_name, "Vesta");
    assert_eq!(top[0].sales_count, 3);
    assert_eq!(top[1].model_name, "Niva");
    assert_eq!(top[1].sales_count, 1);
    assert_eq!(top[2].model_name, "Granta");
    assert_eq!(top[2].sales_count, 1);

    // Asking for more rows than models returns them all.
    let all = engine.top_selling_models(10).unwrap();
    assert_eq!(all.len(), 4);
}

/// Test renaming a vin end to end
#[test]
fn test_e2e_rename_vin() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut engine = Engine::open(dir.path(), Options::default()).unwrap();

    engine.add_model(model(1, "Vesta", "Lada")).unwrap();
    engine.add_vehicle(vehicle("VIN1", 1, "2500.99")).unwrap();

    let renamed = engine.rename_vehicle_vin("VIN1", "VIN1-FIXED").unwrap();
    assert_eq!(renamed.vin, "VIN1-FIXED");

    assert!(engine.full_info("VIN1").unwrap().is_none());
    let info = engine.full_info("VIN1-FIXED").unwrap().unwrap();
    assert_eq!(info.price, "2500.99".parse().unwrap());
}

/// Test that every table survives a close and reopen byte for byte
#[test]
fn test_e2e_persistence_across_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();

    {
        let mut engine = Engine::open(dir.path(), Options::default()).unwrap();
        engine.add_model(model(1, "Vesta", "Lada")).unwrap();
        engine.add_model(model(2, "Niva", "Lada")).unwrap();
        for vin in ["VIN1", "VIN2", "VIN3"] {
            engine.add_vehicle(vehicle(vin, 1, "2500.99")).unwrap();
        }
        engine.sell(sale("VIN3", "2400.00")).unwrap();
        engine.close().unwrap();
    }

    let vehicles_before = std::fs::read(dir.path().join("vehicles.txt")).unwrap();
    let index_before = std::fs::read(dir.path().join("vehicles_index.txt")).unwrap();

    {
        let mut engine = Engine::open(dir.path(), Options::default()).unwrap();
        assert_eq!(engine.vehicle_count(), 3);
        assert_eq!(engine.model_count(), 2);
        assert_eq!(engine.sale_count(), 1);

        let info = engine.full_info("VIN3").unwrap().unwrap();
        assert_eq!(info.status, VehicleStatus::Sold);
        assert_eq!(info.sales_cost, Some("2400.00".parse().unwrap()));
        engine.close().unwrap();
    }

    // Reopening without mutating must not rewrite a single byte.
    assert_eq!(
        std::fs::read(dir.path().join("vehicles.txt")).unwrap(),
        vehicles_before
    );
    assert_eq!(
        std::fs::read(dir.path().join("vehicles_index.txt")).unwrap(),
        index_before
    );
}

/// Test the documented on-disk layout: 501-byte data strides, 31-byte
/// index strides, sorted index entries
#[test]
fn test_e2e_on_disk_layout() {
    init_logging();
    let dir = TempDir::new().unwrap();

    {
        let mut engine = Engine::open(dir.path(), Options::default()).unwrap();
        engine.add_vehicle(vehicle("VIN2", 1, "2500.99")).unwrap();
        engine.add_vehicle(vehicle("VIN1", 1, "2500.99")).unwrap();
        engine.close().unwrap();
    }

    let data = std::fs::read(dir.path().join("vehicles.txt")).unwrap();
    assert_eq!(data.len(), 2 * 501);
    assert_eq!(data[500], b'\n');
    assert_eq!(data[1001], b'\n');
    assert!(data.starts_with(b"VIN2;1;2500.99;2023-09-03 10:00:00;available"));

    let index = std::fs::read_to_string(dir.path().join("vehicles_index.txt")).unwrap();
    let lines: Vec<&str> = index.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].len(), 30);
    // Sorted by key even though VIN2 was inserted first.
    assert_eq!(lines[0].trim_end(), "VIN1;1");
    assert_eq!(lines[1].trim_end(), "VIN2;0");
}
