//! # Materials Database
//!
//! Workpiece materials and the reference tables the calculators consult.
//!
//! ## Contents
//!
//! - **Workpiece materials**: cutting-speed and feed ranges, Taylor constants,
//!   specific cutting force, density and price (see [`catalog`])
//! - **Tool materials**: speed factors relative to uncoated carbide
//! - **Thread standards**: ISO metric and unified pitches (see [`threads`])
//! - **Grinding wheels**: wheel specifications and speed limits (see [`grinding_wheels`])
//!
//! Built-in materials are immutable reference data. Shops add their own
//! variants through [`MaterialLibrary`], which is persisted with the shop data.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::materials::{MaterialLibrary, ToolMaterial};
//!
//! let library = MaterialLibrary::default();
//! let c45 = library.find("c45").unwrap();
//! let vc = c45.recommended_cutting_speed(ToolMaterial::Carbide);
//! assert_eq!(vc, 200.0);
//! ```

pub mod catalog;
pub mod grinding_wheels;
pub mod threads;

pub use catalog::builtin_materials;
pub use grinding_wheels::{find_wheel, Abrasive, GrindingWheel, WheelBond, GRINDING_WHEELS};
pub use threads::{ThreadSize, ThreadStandard};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// ISO 513 workpiece groups plus a bucket for engineering plastics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialCategory {
    /// ISO P - unalloyed and low-alloy steel
    Steel,
    /// ISO M - stainless steel
    Stainless,
    /// ISO K - cast iron
    CastIron,
    /// ISO N - aluminium, copper alloys
    NonFerrous,
    /// ISO S - titanium and heat resistant superalloys
    Superalloy,
    /// ISO H - hardened steel
    Hardened,
    /// Engineering plastics
    Plastic,
}

impl MaterialCategory {
    /// All categories for selection lists
    pub const ALL: [MaterialCategory; 7] = [
        MaterialCategory::Steel,
        MaterialCategory::Stainless,
        MaterialCategory::CastIron,
        MaterialCategory::NonFerrous,
        MaterialCategory::Superalloy,
        MaterialCategory::Hardened,
        MaterialCategory::Plastic,
    ];

    /// ISO 513 letter (plastics have none)
    pub fn iso_code(&self) -> Option<char> {
        match self {
            MaterialCategory::Steel => Some('P'),
            MaterialCategory::Stainless => Some('M'),
            MaterialCategory::CastIron => Some('K'),
            MaterialCategory::NonFerrous => Some('N'),
            MaterialCategory::Superalloy => Some('S'),
            MaterialCategory::Hardened => Some('H'),
            MaterialCategory::Plastic => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MaterialCategory::Steel => "Steel",
            MaterialCategory::Stainless => "Stainless Steel",
            MaterialCategory::CastIron => "Cast Iron",
            MaterialCategory::NonFerrous => "Non-Ferrous",
            MaterialCategory::Superalloy => "Superalloy",
            MaterialCategory::Hardened => "Hardened Steel",
            MaterialCategory::Plastic => "Plastic",
        }
    }
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Cutting tool material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolMaterial {
    /// High speed steel
    Hss,
    /// Uncoated cemented carbide (reference grade for the catalog)
    #[default]
    Carbide,
    /// CVD/PVD coated carbide
    CoatedCarbide,
    Cermet,
    Ceramic,
    /// Cubic boron nitride
    Cbn,
}

impl ToolMaterial {
    pub const ALL: [ToolMaterial; 6] = [
        ToolMaterial::Hss,
        ToolMaterial::Carbide,
        ToolMaterial::CoatedCarbide,
        ToolMaterial::Cermet,
        ToolMaterial::Ceramic,
        ToolMaterial::Cbn,
    ];

    /// Cutting speed multiplier relative to uncoated carbide.
    pub fn speed_factor(&self) -> f64 {
        match self {
            ToolMaterial::Hss => 0.3,
            ToolMaterial::Carbide => 1.0,
            ToolMaterial::CoatedCarbide => 1.3,
            ToolMaterial::Cermet => 1.2,
            ToolMaterial::Ceramic => 2.0,
            ToolMaterial::Cbn => 2.5,
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.to_uppercase().replace([' ', '-', '_'], "").as_str() {
            "HSS" | "HIGHSPEEDSTEEL" => Ok(ToolMaterial::Hss),
            "CARBIDE" | "HM" | "WC" => Ok(ToolMaterial::Carbide),
            "COATEDCARBIDE" | "COATED" => Ok(ToolMaterial::CoatedCarbide),
            "CERMET" => Ok(ToolMaterial::Cermet),
            "CERAMIC" => Ok(ToolMaterial::Ceramic),
            "CBN" => Ok(ToolMaterial::Cbn),
            _ => Err(CalcError::invalid_input("tool_material", s, "Unknown tool material")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ToolMaterial::Hss => "HSS",
            ToolMaterial::Carbide => "Carbide",
            ToolMaterial::CoatedCarbide => "Coated Carbide",
            ToolMaterial::Cermet => "Cermet",
            ToolMaterial::Ceramic => "Ceramic",
            ToolMaterial::Cbn => "CBN",
        }
    }
}

impl std::fmt::Display for ToolMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A workpiece material row.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "C45",
///   "category": "Steel",
///   "hardness_hb": 200.0,
///   "cutting_speed_min": 150.0,
///   "cutting_speed_max": 250.0,
///   "feed_min": 0.1,
///   "feed_max": 0.4,
///   "taylor_c": 350.0,
///   "taylor_n": 0.25,
///   "kc1": 1700.0,
///   "density": 7.85,
///   "price_per_kg": 42.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub category: MaterialCategory,
    /// Brinell hardness
    pub hardness_hb: f64,
    /// Recommended cutting speed range for carbide (m/min)
    pub cutting_speed_min: f64,
    pub cutting_speed_max: f64,
    /// Recommended feed range (mm/rev)
    pub feed_min: f64,
    pub feed_max: f64,
    /// Taylor constant C (m/min for T = 1 min)
    pub taylor_c: f64,
    /// Taylor exponent n
    pub taylor_n: f64,
    /// Specific cutting force kc1.1 (N/mm²)
    pub kc1: f64,
    /// Density (g/cm³)
    pub density: f64,
    /// Stock price per kilogram in the shop currency
    pub price_per_kg: f64,
    /// True for rows added by the shop
    #[serde(default)]
    pub custom: bool,
}

impl Material {
    /// Validate a material row before it is stored.
    pub fn validate(&self) -> CalcResult<()> {
        if self.name.trim().is_empty() {
            return Err(CalcError::missing_field("name"));
        }
        if self.cutting_speed_min <= 0.0 || self.cutting_speed_max < self.cutting_speed_min {
            return Err(CalcError::invalid_input(
                "cutting_speed",
                format!("{}..{}", self.cutting_speed_min, self.cutting_speed_max),
                "Cutting speed range must be positive and ordered",
            ));
        }
        if self.feed_min <= 0.0 || self.feed_max < self.feed_min {
            return Err(CalcError::invalid_input(
                "feed",
                format!("{}..{}", self.feed_min, self.feed_max),
                "Feed range must be positive and ordered",
            ));
        }
        if self.taylor_c <= 0.0 {
            return Err(CalcError::invalid_input(
                "taylor_c",
                self.taylor_c.to_string(),
                "Taylor constant must be positive",
            ));
        }
        if self.taylor_n <= 0.0 || self.taylor_n >= 1.0 {
            return Err(CalcError::invalid_input(
                "taylor_n",
                self.taylor_n.to_string(),
                "Taylor exponent must be between 0 and 1",
            ));
        }
        if self.density <= 0.0 {
            return Err(CalcError::invalid_input(
                "density",
                self.density.to_string(),
                "Density must be positive",
            ));
        }
        if self.price_per_kg < 0.0 {
            return Err(CalcError::invalid_input(
                "price_per_kg",
                self.price_per_kg.to_string(),
                "Price cannot be negative",
            ));
        }
        Ok(())
    }

    /// Middle of the recommended speed range, scaled for the tool material.
    pub fn recommended_cutting_speed(&self, tool: ToolMaterial) -> f64 {
        (self.cutting_speed_min + self.cutting_speed_max) / 2.0 * tool.speed_factor()
    }

    /// Middle of the recommended feed range.
    pub fn recommended_feed(&self) -> f64 {
        (self.feed_min + self.feed_max) / 2.0
    }

    /// Taylor constant C adjusted for the tool material.
    pub fn taylor_c_for(&self, tool: ToolMaterial) -> f64 {
        self.taylor_c * tool.speed_factor()
    }

    /// Check whether a cutting speed is inside the (tool-scaled) range.
    pub fn speed_in_range(&self, vc: f64, tool: ToolMaterial) -> bool {
        let factor = tool.speed_factor();
        vc >= self.cutting_speed_min * factor && vc <= self.cutting_speed_max * factor
    }

    pub fn display_name(&self) -> String {
        match self.category.iso_code() {
            Some(code) => format!("{} ({})", self.name, code),
            None => self.name.clone(),
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Built-in catalog plus the shop's own material rows.
///
/// Serializes as the list of custom rows only; the catalog is never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialLibrary {
    custom: Vec<Material>,
}

impl MaterialLibrary {
    /// Look a material up by case-insensitive name.
    ///
    /// Custom rows shadow built-in rows with the same name.
    pub fn find(&self, name: &str) -> CalcResult<Material> {
        let wanted = name.trim();
        self.custom
            .iter()
            .chain(builtin_materials().iter())
            .find(|m| m.name.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| CalcError::material_not_found(name))
    }

    /// All materials, custom rows first, shadowed built-ins omitted.
    pub fn all(&self) -> Vec<&Material> {
        let mut out: Vec<&Material> = self.custom.iter().collect();
        out.extend(
            builtin_materials()
                .iter()
                .filter(|b| !self.custom.iter().any(|c| c.name.eq_ignore_ascii_case(&b.name))),
        );
        out
    }

    /// Materials of one category.
    pub fn by_category(&self, category: MaterialCategory) -> Vec<&Material> {
        self.all().into_iter().filter(|m| m.category == category).collect()
    }

    /// The shop's own rows.
    pub fn custom(&self) -> &[Material] {
        &self.custom
    }

    /// Add a custom material row. Names are unique among custom rows.
    pub fn add_custom(&mut self, mut material: Material) -> CalcResult<()> {
        material.validate()?;
        if self.custom.iter().any(|m| m.name.eq_ignore_ascii_case(&material.name)) {
            return Err(CalcError::duplicate("Material", material.name));
        }
        material.custom = true;
        tracing::debug!(material = %material.name, "custom material added");
        self.custom.push(material);
        Ok(())
    }

    /// Remove a custom material row by name.
    pub fn remove_custom(&mut self, name: &str) -> CalcResult<Material> {
        let index = self
            .custom
            .iter()
            .position(|m| m.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CalcError::material_not_found(name))?;
        Ok(self.custom.remove(index))
    }
}
