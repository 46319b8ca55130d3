//! # Menu Configuration and Permissions
//!
//! The navigation menu groups modules (calculators and tools) into ordered
//! categories. Each user has a role and a set of allowed module keys; the
//! menu a user sees is the enabled, permitted subset.
//!
//! Only admins may change the menu or other users' permissions. The checks
//! live in [`Permissions::require_admin`] and are applied by
//! [`crate::shop::ShopData`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// One navigable module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Stable key, e.g. "cutting"
    pub key: String,
    pub title: String,
    pub sort_order: u32,
    pub enabled: bool,
}

/// A group of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub title: String,
    pub sort_order: u32,
    pub modules: Vec<ModuleEntry>,
}

impl MenuCategory {
    fn sorted(&self) -> MenuCategory {
        let mut category = self.clone();
        category.modules.sort_by_key(|m| m.sort_order);
        category
    }

    fn next_sort_order(&self) -> u32 {
        self.modules.iter().map(|m| m.sort_order + 1).max().unwrap_or(0)
    }
}

const DEFAULT_MENU: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "calculators",
        "Calculators",
        &[
            ("cutting", "Cutting Parameters"),
            ("tool-life", "Tool Life"),
            ("threading", "Threading"),
            ("drilling", "Drilling"),
            ("grinding", "Grinding"),
            ("tolerance", "ISO Tolerances"),
        ],
    ),
    (
        "business",
        "Business",
        &[("cost", "Cost Estimation"), ("salary", "Payroll"), ("currency", "Currency")],
    ),
    (
        "assistant",
        "Assistant",
        &[("ai-chat", "AI Chat"), ("quiz", "Quiz")],
    ),
    (
        "data",
        "Shop Data",
        &[("history", "History"), ("machines", "Machines"), ("materials", "Materials")],
    ),
];

/// The whole menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuConfig {
    categories: Vec<MenuCategory>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        let categories = DEFAULT_MENU
            .iter()
            .enumerate()
            .map(|(ci, (id, title, modules))| MenuCategory {
                id: id.to_string(),
                title: title.to_string(),
                sort_order: ci as u32,
                modules: modules
                    .iter()
                    .enumerate()
                    .map(|(mi, (key, title))| ModuleEntry {
                        key: key.to_string(),
                        title: title.to_string(),
                        sort_order: mi as u32,
                        enabled: true,
                    })
                    .collect(),
            })
            .collect();
        MenuConfig { categories }
    }
}

impl MenuConfig {
    /// Categories and modules in display order.
    pub fn sorted(&self) -> Vec<MenuCategory> {
        let mut categories: Vec<MenuCategory> = self.categories.iter().map(MenuCategory::sorted).collect();
        categories.sort_by_key(|c| c.sort_order);
        categories
    }

    /// Every module key in the menu.
    pub fn module_keys(&self) -> BTreeSet<String> {
        self.categories
            .iter()
            .flat_map(|c| c.modules.iter().map(|m| m.key.clone()))
            .collect()
    }

    pub fn find_module(&self, key: &str) -> Option<&ModuleEntry> {
        self.categories.iter().flat_map(|c| c.modules.iter()).find(|m| m.key == key)
    }

    fn find_module_mut(&mut self, key: &str) -> CalcResult<&mut ModuleEntry> {
        self.categories
            .iter_mut()
            .flat_map(|c| c.modules.iter_mut())
            .find(|m| m.key == key)
            .ok_or_else(|| CalcError::not_found("module", key))
    }

    /// Put categories in the given order. Categories not named keep their
    /// relative order after the named ones.
    pub fn reorder_categories(&mut self, order: &[&str]) -> CalcResult<()> {
        if let Some(unknown) = order.iter().find(|id| !self.categories.iter().any(|c| c.id == **id)) {
            return Err(CalcError::not_found("category", *unknown));
        }
        let mut current: Vec<String> = self.sorted().into_iter().map(|c| c.id).collect();
        current.retain(|id| !order.contains(&id.as_str()));
        let ranks: BTreeMap<String, u32> = order
            .iter()
            .map(|id| id.to_string())
            .chain(current)
            .enumerate()
            .map(|(i, id)| (id, i as u32))
            .collect();
        for category in &mut self.categories {
            if let Some(rank) = ranks.get(&category.id) {
                category.sort_order = *rank;
            }
        }
        Ok(())
    }

    /// Move a module to the end of another category.
    pub fn move_module(&mut self, key: &str, to_category: &str) -> CalcResult<()> {
        let target = self
            .categories
            .iter()
            .position(|c| c.id == to_category)
            .ok_or_else(|| CalcError::not_found("category", to_category))?;
        let (source, index) = self
            .categories
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.modules.iter().position(|m| m.key == key).map(|mi| (ci, mi)))
            .ok_or_else(|| CalcError::not_found("module", key))?;
        if source == target {
            return Ok(());
        }
        let mut module = self.categories[source].modules.remove(index);
        module.sort_order = self.categories[target].next_sort_order();
        self.categories[target].modules.push(module);
        Ok(())
    }

    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> CalcResult<()> {
        self.find_module_mut(key)?.enabled = enabled;
        Ok(())
    }
}

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

impl Role {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "operator" | "user" => Ok(Role::Operator),
            "viewer" | "readonly" => Ok(Role::Viewer),
            _ => Err(CalcError::invalid_input("role", s, "Unknown role")),
        }
    }

    /// Modules granted to a new user of this role.
    fn default_modules(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &[],
            Role::Operator => &[
                "cutting",
                "tool-life",
                "threading",
                "drilling",
                "grinding",
                "tolerance",
                "cost",
                "ai-chat",
                "quiz",
                "history",
                "machines",
                "materials",
            ],
            Role::Viewer => &["history", "materials", "machines"],
        }
    }
}

/// What one user may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPermission {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub allowed_modules: BTreeSet<String>,
}

impl UserPermission {
    /// A user with the role's default module set.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        UserPermission {
            user_id: user_id.into(),
            role,
            allowed_modules: role.default_modules().iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, module_key: &str) -> bool {
        self.is_admin() || self.allowed_modules.contains(module_key)
    }
}

/// The menu as one user sees it: enabled and permitted modules only, empty
/// categories dropped.
pub fn visible_menu(menu: &MenuConfig, user: &UserPermission) -> Vec<MenuCategory> {
    menu.sorted()
        .into_iter()
        .filter_map(|mut category| {
            category.modules.retain(|m| m.enabled && user.can_access(&m.key));
            (!category.modules.is_empty()).then_some(category)
        })
        .collect()
}

/// All user permissions, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions {
    users: BTreeMap<String, UserPermission>,
}

impl Permissions {
    /// Permissions with one initial admin.
    pub fn with_admin(user_id: impl Into<String>) -> Self {
        let mut permissions = Permissions::default();
        let admin = UserPermission::new(user_id, Role::Admin);
        permissions.users.insert(admin.user_id.clone(), admin);
        permissions
    }

    pub fn get(&self, user_id: &str) -> Option<&UserPermission> {
        self.users.get(user_id)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserPermission> {
        self.users.values()
    }

    /// Fail with `PermissionDenied` unless `user_id` is an admin.
    pub fn require_admin(&self, user_id: &str, action: &str) -> CalcResult<()> {
        match self.users.get(user_id) {
            Some(user) if user.is_admin() => Ok(()),
            _ => {
                tracing::warn!(user_id, action, "admin action denied");
                Err(CalcError::permission_denied(user_id, action))
            }
        }
    }

    fn admin_count(&self) -> usize {
        self.users.values().filter(|u| u.is_admin()).count()
    }

    /// Insert or replace a user's permission (admin only). The last admin
    /// cannot be demoted.
    pub fn set(&mut self, actor: &str, permission: UserPermission) -> CalcResult<()> {
        self.require_admin(actor, "change permissions")?;
        let demotes_admin = self.users.get(&permission.user_id).is_some_and(|u| u.is_admin()) && !permission.is_admin();
        if demotes_admin && self.admin_count() == 1 {
            return Err(CalcError::permission_denied(actor, "demote the last admin"));
        }
        self.users.insert(permission.user_id.clone(), permission);
        Ok(())
    }

    /// Remove a user (admin only). The last admin cannot be removed.
    pub fn remove(&mut self, actor: &str, user_id: &str) -> CalcResult<UserPermission> {
        self.require_admin(actor, "remove users")?;
        let user = self.users.get(user_id).ok_or_else(|| CalcError::not_found("user", user_id))?;
        if user.is_admin() && self.admin_count() == 1 {
            return Err(CalcError::permission_denied(actor, "remove the last admin"));
        }
        self.users
            .remove(user_id)
            .ok_or_else(|| CalcError::not_found("user", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_menu_covers_all_calculators() {
        let keys = MenuConfig::default().module_keys();
        for key in ["cutting", "tool-life", "threading", "drilling", "grinding", "cost", "salary", "currency"] {
            assert!(keys.contains(key), "{} missing", key);
        }
    }

    #[test]
    fn test_reorder_categories() {
        let mut menu = MenuConfig::default();
        menu.reorder_categories(&["data", "assistant"]).unwrap();
        let order: Vec<_> = menu.sorted().into_iter().map(|c| c.id).collect();
        assert_eq!(order, vec!["data", "assistant", "calculators", "business"]);
        assert!(menu.reorder_categories(&["nope"]).is_err());
    }

    #[test]
    fn test_move_module() {
        let mut menu = MenuConfig::default();
        menu.move_module("cost", "calculators").unwrap();
        let sorted = menu.sorted();
        let calculators = sorted.iter().find(|c| c.id == "calculators").unwrap();
        assert_eq!(calculators.modules.last().unwrap().key, "cost");
        let business = sorted.iter().find(|c| c.id == "business").unwrap();
        assert!(business.modules.iter().all(|m| m.key != "cost"));

        assert!(menu.move_module("cost", "missing").is_err());
        assert!(menu.move_module("missing", "business").is_err());
    }

    #[test]
    fn test_enable_disable() {
        let mut menu = MenuConfig::default();
        menu.set_enabled("grinding", false).unwrap();
        assert!(!menu.find_module("grinding").unwrap().enabled);
        assert!(menu.set_enabled("unknown", true).is_err());
    }

    #[test]
    fn test_visible_menu_filters() {
        let mut menu = MenuConfig::default();
        menu.set_enabled("grinding", false).unwrap();

        let admin = UserPermission::new("boss", Role::Admin);
        let admin_keys: BTreeSet<String> = visible_menu(&menu, &admin)
            .iter()
            .flat_map(|c| c.modules.iter().map(|m| m.key.clone()))
            .collect();
        assert!(admin_keys.contains("salary"));
        assert!(!admin_keys.contains("grinding"));

        let viewer = UserPermission::new("guest", Role::Viewer);
        let categories = visible_menu(&menu, &viewer);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "data");
    }

    #[test]
    fn test_only_admin_mutates_permissions() {
        let mut permissions = Permissions::with_admin("boss");
        permissions.set("boss", UserPermission::new("op", Role::Operator)).unwrap();

        let err = permissions.set("op", UserPermission::new("op", Role::Admin)).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert!(permissions.require_admin("stranger", "edit menu").is_err());
    }

    #[test]
    fn test_last_admin_protected() {
        let mut permissions = Permissions::with_admin("boss");
        let err = permissions.set("boss", UserPermission::new("boss", Role::Viewer)).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        let err = permissions.remove("boss", "boss").unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert!(permissions.get("boss").is_some_and(|u| u.is_admin()));

        permissions.set("boss", UserPermission::new("second", Role::Admin)).unwrap();
        permissions.remove("second", "boss").unwrap();
        assert!(permissions.get("boss").is_none());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::from_str_flexible("Admin").unwrap(), Role::Admin);
        assert!(Role::from_str_flexible("root").is_err());
    }
}
