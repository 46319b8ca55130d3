//! # Shop Data
//!
//! `ShopData` is the root container for everything a shop keeps between
//! sessions. It serializes to a human-readable JSON data file (see
//! [`crate::file_io`]).
//!
//! ## Structure
//!
//! ```text
//! ShopData
//! ├── meta: ShopMetadata (schema version, shop name, timestamps)
//! ├── settings: ShopSettings (currency, default tool, payroll year)
//! ├── materials: MaterialLibrary (custom rows over the built-in catalog)
//! ├── machines: HashMap<Uuid, Machine>
//! ├── history: History (saved calculations)
//! ├── menu: MenuConfig
//! └── permissions: Permissions
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalculationItem, CuttingInput};
//! use calc_core::shop::ShopData;
//!
//! let mut shop = ShopData::new("Atelier 7", "admin");
//! let mut cut = CuttingInput::turning("OD rough", "C45", 50.0, 0.25);
//! cut.depth_of_cut_mm = 2.0;
//!
//! let (id, result) = shop.record(CalculationItem::Cutting(cut)).unwrap();
//! assert!(result["spindle_speed_rpm"].as_f64().unwrap() > 0.0);
//! assert!(shop.history.get(&id).is_some());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::calculations::CalculationItem;
use crate::errors::{CalcError, CalcResult};
use crate::history::{CalculationRecord, History};
use crate::machines::Machine;
use crate::materials::{Material, MaterialLibrary, ToolMaterial};
use crate::menu::{visible_menu, MenuCategory, MenuConfig, Permissions, UserPermission};

/// Current schema version for shop data files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root shop container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopData {
    pub meta: ShopMetadata,

    #[serde(default)]
    pub settings: ShopSettings,

    /// Custom material rows
    #[serde(default)]
    pub materials: MaterialLibrary,

    /// Machine inventory, keyed by UUID
    #[serde(default)]
    pub machines: HashMap<Uuid, Machine>,

    #[serde(default)]
    pub history: History,

    #[serde(default)]
    pub menu: MenuConfig,

    #[serde(default)]
    pub permissions: Permissions,
}

/// Metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub shop_name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Shop-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSettings {
    /// ISO currency code used for costs and payroll
    pub currency: String,
    pub default_tool_material: ToolMaterial,
    pub payroll_year: u16,
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            currency: "TRY".to_string(),
            default_tool_material: ToolMaterial::default(),
            payroll_year: 2025,
        }
    }
}

impl ShopData {
    /// Create an empty shop with one admin user.
    pub fn new(shop_name: impl Into<String>, admin_user: impl Into<String>) -> Self {
        let now = Utc::now();
        ShopData {
            meta: ShopMetadata {
                version: SCHEMA_VERSION.to_string(),
                shop_name: shop_name.into(),
                created: now,
                modified: now,
            },
            settings: ShopSettings::default(),
            materials: MaterialLibrary::default(),
            machines: HashMap::new(),
            history: History::default(),
            menu: MenuConfig::default(),
            permissions: Permissions::with_admin(admin_user),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    // ---- machines ----

    /// Add a machine; codes are unique (case-insensitive).
    pub fn add_machine(&mut self, machine: Machine) -> CalcResult<Uuid> {
        machine.validate()?;
        if self.machine_by_code(&machine.code).is_some() {
            return Err(CalcError::duplicate("machine", machine.code));
        }
        let id = machine.id;
        tracing::info!(code = %machine.code, %id, "machine added");
        self.machines.insert(id, machine);
        self.touch();
        Ok(id)
    }

    /// Replace a machine's data, keeping its id.
    pub fn update_machine(&mut self, id: &Uuid, mut machine: Machine) -> CalcResult<()> {
        machine.validate()?;
        let existing = self
            .machines
            .get(id)
            .ok_or_else(|| CalcError::not_found("machine", id.to_string()))?;
        if !existing.code.eq_ignore_ascii_case(&machine.code) {
            if self.machine_by_code(&machine.code).is_some() {
                return Err(CalcError::duplicate("machine", machine.code));
            }
            if !self.history.for_machine(&existing.code).is_empty() {
                return Err(CalcError::invalid_input(
                    "code",
                    machine.code,
                    "Machine code is referenced by saved calculations",
                ));
            }
        }
        machine.id = *id;
        self.machines.insert(*id, machine);
        self.touch();
        Ok(())
    }

    /// Remove a machine that no saved calculation refers to.
    pub fn remove_machine(&mut self, id: &Uuid) -> CalcResult<Machine> {
        let machine = self
            .machines
            .get(id)
            .ok_or_else(|| CalcError::not_found("machine", id.to_string()))?;
        let references = self.history.for_machine(&machine.code).len();
        if references > 0 {
            return Err(CalcError::invalid_input(
                "machine",
                machine.code.clone(),
                format!("Referenced by {} saved calculations", references),
            ));
        }
        let removed = self
            .machines
            .remove(id)
            .ok_or_else(|| CalcError::not_found("machine", id.to_string()))?;
        tracing::info!(code = %removed.code, "machine removed");
        self.touch();
        Ok(removed)
    }

    pub fn machine_by_code(&self, code: &str) -> Option<&Machine> {
        self.machines.values().find(|m| m.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Machines sorted by code.
    pub fn machines_sorted(&self) -> Vec<&Machine> {
        let mut machines: Vec<&Machine> = self.machines.values().collect();
        machines.sort_by(|a, b| a.code.cmp(&b.code));
        machines
    }

    // ---- materials ----

    pub fn add_custom_material(&mut self, material: Material) -> CalcResult<()> {
        self.materials.add_custom(material)?;
        self.touch();
        Ok(())
    }

    pub fn remove_custom_material(&mut self, name: &str) -> CalcResult<Material> {
        let removed = self.materials.remove_custom(name)?;
        self.touch();
        Ok(removed)
    }

    // ---- calculations and history ----

    /// Evaluate a calculation against this shop's materials and machines.
    pub fn evaluate(&self, item: &CalculationItem) -> CalcResult<Value> {
        item.evaluate(&self.materials, self.machines.values())
    }

    /// Evaluate a calculation and save it to history.
    pub fn record(&mut self, item: CalculationItem) -> CalcResult<(Uuid, Value)> {
        let result = self.evaluate(&item)?;
        let record = CalculationRecord::from_item(&item, result.clone())?;
        let id = self.add_record(record)?;
        Ok((id, result))
    }

    /// Save a prepared record. A machine it names must exist.
    pub fn add_record(&mut self, record: CalculationRecord) -> CalcResult<Uuid> {
        if let Some(code) = record.machine.as_deref() {
            if self.machine_by_code(code).is_none() {
                return Err(CalcError::not_found("machine", code));
            }
        }
        let id = self.history.add(record)?;
        self.touch();
        Ok(id)
    }

    pub fn delete_record(&mut self, id: &Uuid) -> CalcResult<CalculationRecord> {
        let removed = self.history.delete(id)?;
        self.touch();
        Ok(removed)
    }

    // ---- menu and permissions (admin only) ----

    pub fn reorder_menu(&mut self, actor: &str, order: &[&str]) -> CalcResult<()> {
        self.permissions.require_admin(actor, "reorder menu")?;
        self.menu.reorder_categories(order)?;
        self.touch();
        Ok(())
    }

    pub fn move_module(&mut self, actor: &str, key: &str, to_category: &str) -> CalcResult<()> {
        self.permissions.require_admin(actor, "move modules")?;
        self.menu.move_module(key, to_category)?;
        self.touch();
        Ok(())
    }

    pub fn set_module_enabled(&mut self, actor: &str, key: &str, enabled: bool) -> CalcResult<()> {
        self.permissions.require_admin(actor, "enable or disable modules")?;
        self.menu.set_enabled(key, enabled)?;
        self.touch();
        Ok(())
    }

    /// Grant or change a user's permission. Module keys must exist in the menu.
    pub fn set_permission(&mut self, actor: &str, permission: UserPermission) -> CalcResult<()> {
        let known = self.menu.module_keys();
        if let Some(unknown) = permission.allowed_modules.iter().find(|k| !known.contains(*k)) {
            return Err(CalcError::not_found("module", unknown.clone()));
        }
        self.permissions.set(actor, permission)?;
        self.touch();
        Ok(())
    }

    pub fn remove_user(&mut self, actor: &str, user_id: &str) -> CalcResult<UserPermission> {
        let removed = self.permissions.remove(actor, user_id)?;
        self.touch();
        Ok(removed)
    }

    /// The menu a user sees.
    pub fn visible_menu(&self, user_id: &str) -> CalcResult<Vec<MenuCategory>> {
        let user = self
            .permissions
            .get(user_id)
            .ok_or_else(|| CalcError::not_found("user", user_id))?;
        Ok(visible_menu(&self.menu, user))
    }
}

impl Default for ShopData {
    fn default() -> Self {
        ShopData::new("", "admin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{CostInput, CuttingInput};
    use crate::calculations::cost::Blank;
    use crate::machines::MachineType;
    use crate::menu::Role;

    fn lathe() -> Machine {
        Machine::new("L-01", "Puma 2600", MachineType::Lathe, 18.5, 50.0, 4000.0).with_hourly_rate(950.0)
    }

    fn cost_on(machine: &str) -> CalculationItem {
        CalculationItem::Cost(CostInput {
            label: "Bush".to_string(),
            material: "C45".to_string(),
            blank: Blank::RoundBar {
                diameter_mm: 40.0,
                length_mm: 60.0,
            },
            quantity: 10,
            setup_time_min: 30.0,
            cycle_time_min: 4.0,
            hourly_rate: 0.0,
            machine: Some(machine.to_string()),
            tooling_cost_per_part: 2.0,
            overhead_percent: 0.0,
            margin_percent: 0.0,
        })
    }

    #[test]
    fn test_new_shop() {
        let shop = ShopData::new("Atelier", "boss");
        assert_eq!(shop.meta.version, SCHEMA_VERSION);
        assert_eq!(shop.settings.currency, "TRY");
        assert!(shop.permissions.get("boss").unwrap().is_admin());
        assert!(shop.history.is_empty());
    }

    #[test]
    fn test_machine_codes_unique() {
        let mut shop = ShopData::default();
        shop.add_machine(lathe()).unwrap();
        let mut twin = lathe();
        twin.code = "l-01".to_string();
        assert_eq!(shop.add_machine(twin).unwrap_err().error_code(), "DUPLICATE");
    }

    #[test]
    fn test_update_machine_keeps_id() {
        let mut shop = ShopData::default();
        let id = shop.add_machine(lathe()).unwrap();
        let mut changed = lathe();
        changed.power_kw = 22.0;
        shop.update_machine(&id, changed).unwrap();
        assert_eq!(shop.machines[&id].power_kw, 22.0);
        assert_eq!(shop.machines[&id].id, id);
    }

    #[test]
    fn test_record_uses_machine_rate() {
        let mut shop = ShopData::default();
        shop.add_machine(lathe()).unwrap();
        let (id, result) = shop.record(cost_on("L-01")).unwrap();
        assert_eq!(result["hourly_rate"], serde_json::json!(950.0));
        assert_eq!(shop.history.get(&id).unwrap().machine.as_deref(), Some("L-01"));
    }

    #[test]
    fn test_record_requires_existing_machine() {
        let mut shop = ShopData::default();
        assert!(shop.record(cost_on("NOPE")).is_err());
        assert!(shop.history.is_empty());
    }

    #[test]
    fn test_referenced_machine_cannot_be_removed() {
        let mut shop = ShopData::default();
        let id = shop.add_machine(lathe()).unwrap();
        let (record_id, _) = shop.record(cost_on("L-01")).unwrap();
        assert!(shop.remove_machine(&id).is_err());

        shop.delete_record(&record_id).unwrap();
        shop.remove_machine(&id).unwrap();
        assert!(shop.machines.is_empty());
    }

    #[test]
    fn test_touch_on_mutation() {
        let mut shop = ShopData::default();
        let before = shop.meta.modified;
        std::thread::sleep(std::time::Duration::from_millis(5));
        shop.record(CalculationItem::Cutting(CuttingInput::turning("OD", "C45", 40.0, 0.2)))
            .unwrap();
        assert!(shop.meta.modified > before);
    }

    #[test]
    fn test_menu_mutations_admin_only() {
        let mut shop = ShopData::new("Atelier", "boss");
        shop.set_permission("boss", UserPermission::new("op", Role::Operator)).unwrap();

        assert!(shop.set_module_enabled("op", "salary", false).is_err());
        shop.set_module_enabled("boss", "cutting", false).unwrap();

        let visible = shop.visible_menu("op").unwrap();
        assert!(visible.iter().flat_map(|c| &c.modules).all(|m| m.key != "cutting"));
        assert!(shop.visible_menu("ghost").is_err());
    }

    #[test]
    fn test_permission_with_unknown_module_rejected() {
        let mut shop = ShopData::new("Atelier", "boss");
        let mut permission = UserPermission::new("op", Role::Operator);
        permission.allowed_modules.insert("teleport".to_string());
        assert!(shop.set_permission("boss", permission).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut shop = ShopData::new("Atelier", "boss");
        shop.add_machine(lathe()).unwrap();
        shop.record(cost_on("L-01")).unwrap();
        let json = serde_json::to_string_pretty(&shop).unwrap();
        let back: ShopData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.machines.len(), 1);
        assert_eq!(back.history, shop.history);
        assert_eq!(back.menu, shop.menu);
    }

    fn bumped<T>(shop: &mut ShopData, change: impl FnOnce(&mut ShopData) -> T) -> T {
        shop.meta.modified = Utc::now() - chrono::Duration::seconds(60);
        let before = shop.meta.modified;
        let out = change(shop);
        assert!(shop.meta.modified > before, "modified timestamp not updated");
        out
    }

    fn house_c45() -> Material {
        Material {
            name: "c45".to_string(),
            category: crate::materials::MaterialCategory::Steel,
            hardness_hb: 180.0,
            cutting_speed_min: 300.0,
            cutting_speed_max: 400.0,
            feed_min: 0.1,
            feed_max: 0.3,
            taylor_c: 420.0,
            taylor_n: 0.25,
            kc1: 1600.0,
            density: 7.85,
            price_per_kg: 42.0,
            custom: false,
        }
    }

    #[test]
    fn test_custom_material_shadows_builtin_in_evaluate() {
        let mut shop = ShopData::new("Atelier", "boss");
        let item = CalculationItem::Cutting(CuttingInput::turning("OD", "C45", 40.0, 0.2));
        let builtin_vc = shop.evaluate(&item).unwrap()["cutting_speed_m_min"].as_f64().unwrap();

        bumped(&mut shop, |s| s.add_custom_material(house_c45()).unwrap());
        assert!(shop.add_custom_material(house_c45()).is_err());
        let custom_vc = shop.evaluate(&item).unwrap()["cutting_speed_m_min"].as_f64().unwrap();
        assert!(custom_vc > builtin_vc);
        assert!(shop.materials.find("C45").unwrap().custom);

        let removed = bumped(&mut shop, |s| s.remove_custom_material("C45").unwrap());
        assert_eq!(removed.name, "c45");
        let restored_vc = shop.evaluate(&item).unwrap()["cutting_speed_m_min"].as_f64().unwrap();
        assert_eq!(restored_vc, builtin_vc);
        assert!(shop.remove_custom_material("C45").is_err());
    }

    #[test]
    fn test_reorder_menu_admin_only() {
        let mut shop = ShopData::new("Atelier", "boss");
        shop.set_permission("boss", UserPermission::new("op", Role::Operator)).unwrap();

        let err = shop.reorder_menu("op", &["data"]).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_ne!(shop.menu.sorted()[0].id, "data");

        bumped(&mut shop, |s| s.reorder_menu("boss", &["data", "business"]).unwrap());
        let order: Vec<String> = shop.menu.sorted().into_iter().map(|c| c.id).collect();
        assert_eq!(&order[..2], &["data".to_string(), "business".to_string()]);
        assert!(shop.reorder_menu("boss", &["nowhere"]).is_err());
    }

    #[test]
    fn test_menu_edits_update_modified() {
        let mut shop = ShopData::new("Atelier", "boss");
        bumped(&mut shop, |s| s.move_module("boss", "salary", "data").unwrap());
        bumped(&mut shop, |s| s.set_module_enabled("boss", "quiz", false).unwrap());
        assert!(shop.menu.find_module("quiz").is_some_and(|m| !m.enabled));
    }

    #[test]
    fn test_remove_user_admin_only() {
        let mut shop = ShopData::new("Atelier", "boss");
        bumped(&mut shop, |s| {
            s.set_permission("boss", UserPermission::new("op", Role::Operator)).unwrap()
        });
        shop.set_permission("boss", UserPermission::new("viewer", Role::Viewer)).unwrap();

        let err = shop.remove_user("op", "viewer").unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert!(shop.permissions.get("viewer").is_some());

        let removed = bumped(&mut shop, |s| s.remove_user("boss", "op").unwrap());
        assert_eq!(removed.role, Role::Operator);
        assert!(shop.visible_menu("op").is_err());
        assert_eq!(shop.remove_user("boss", "boss").unwrap_err().error_code(), "PERMISSION_DENIED");
        assert!(shop.remove_user("boss", "ghost").is_err());
    }
}
