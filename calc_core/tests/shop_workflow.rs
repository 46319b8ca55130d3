//! End-to-end checks across calculators, history, export and the data file.

use calc_core::calculations::salary::{gross_to_net, PayrollParameters};
use calc_core::calculations::tool_life::taylor_tool_life;
use calc_core::calculations::{CalculationItem, CuttingInput, DrillingInput, ToolLifeInput};
use calc_core::export::{export_history_csv, history_csv_string};
use calc_core::file_io::load_or_create;
use calc_core::machines::{Machine, MachineType};
use calc_core::units::{spindle_speed, MetersPerMinute, Millimeters};
use calc_core::{load_shop, save_shop, FileLock, ShopData};
use tempfile::tempdir;

fn taylor_item(vc: f64) -> CalculationItem {
    CalculationItem::ToolLife(ToolLifeInput {
        label: format!("Vc {}", vc),
        material: None,
        taylor_c: 300.0,
        taylor_n: 0.25,
        cutting_speed_m_min: vc,
        target_life_min: None,
        cutting_time_per_part_min: None,
        tool_change_time_min: 0.0,
        tool_cost_per_edge: 0.0,
        machine_cost_per_min: 0.0,
    })
}

fn shop_with_records(n: usize) -> ShopData {
    let mut shop = ShopData::new("Test Shop", "admin");
    for i in 0..n {
        shop.record(taylor_item(100.0 + i as f64 * 10.0)).unwrap();
    }
    shop
}

#[test]
fn test_reference_values() {
    assert!((taylor_tool_life(300.0, 0.25, 150.0) - 16.0).abs() < 1e-9);
    let rpm = spindle_speed(MetersPerMinute(180.0), Millimeters(20.0));
    assert!((rpm.0 - 2864.79).abs() < 0.01);
}

#[test]
fn test_net_salary_never_drops_when_gross_rises() {
    let params = PayrollParameters::for_year(2025).unwrap();
    for month in 1..=12 {
        let mut previous = 0.0;
        for step in 0..400 {
            let gross = 20_000.0 + step as f64 * 1_500.0;
            let net = gross_to_net(gross, month, None, &params).net;
            assert!(net >= previous - 1e-6, "net fell in month {} at gross {}", month, gross);
            previous = net;
        }
    }
}

#[test]
fn test_csv_has_header_plus_one_row_per_record() {
    for n in [0, 1, 7] {
        let shop = shop_with_records(n);
        let csv = history_csv_string(&shop.history).unwrap();
        assert_eq!(csv.matches("\r\n").count(), n + 1);
    }
}

#[test]
fn test_delete_removes_exactly_one_record() {
    let mut shop = shop_with_records(5);
    let before: Vec<_> = shop.history.iter().map(|r| (r.id, r.created_at)).collect();
    let target = before[2].0;

    shop.delete_record(&target).unwrap();

    let after: Vec<_> = shop.history.iter().map(|r| (r.id, r.created_at)).collect();
    assert_eq!(after.len(), before.len() - 1);
    let expected: Vec<_> = before.into_iter().filter(|(id, _)| *id != target).collect();
    assert_eq!(after, expected);
    assert!(shop.delete_record(&target).is_err());
}

#[test]
fn test_saved_shop_survives_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shop.json");

    let mut shop = load_or_create(&path, "Test Shop", "admin").unwrap();
    shop.add_machine(Machine::new("T-01", "Lathe", MachineType::Lathe, 11.0, 50.0, 4000.0))
        .unwrap();
    let mut cut = CuttingInput::turning("OD rough", "C45", 20.0, 0.2);
    cut.cutting_speed_m_min = Some(180.0);
    cut.machine = Some("T-01".to_string());
    shop.record(CalculationItem::Cutting(cut)).unwrap();
    shop.record(CalculationItem::Drilling(DrillingInput::new("Holes", "C45", 8.5, 30.0, 0.15)))
        .unwrap();
    save_shop(&shop, &path).unwrap();

    let loaded = load_shop(&path).unwrap();
    assert_eq!(loaded.history.len(), 2);
    assert_eq!(loaded.machines.len(), 1);
    let first = loaded.history.list().into_iter().find(|r| r.label == "OD rough").unwrap();
    assert_eq!(first.machine.as_deref(), Some("T-01"));

    // A machine in use by history stays
    let id = loaded.machine_by_code("T-01").unwrap().id;
    let mut loaded = loaded;
    assert!(loaded.remove_machine(&id).is_err());
}

#[test]
fn test_export_file_and_lock() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("shop.json");
    let shop = shop_with_records(3);
    save_shop(&shop, &data).unwrap();

    let lock = FileLock::acquire(&data, "admin").unwrap();
    assert!(FileLock::acquire(&data, "operator").is_err());
    drop(lock);

    let out = dir.path().join("history.csv");
    assert_eq!(export_history_csv(&shop.history, &out).unwrap(), 3);
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with('\u{feff}'));
}
