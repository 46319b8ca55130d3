//! Built-in workpiece material catalog.
//!
//! The rows live in `data/materials.toml` and are embedded at compile time,
//! then parsed once on first use.

use once_cell::sync::Lazy;
use serde::Deserialize;

use super::Material;

const MATERIALS_TOML: &str = include_str!("../../data/materials.toml");

#[derive(Deserialize)]
struct CatalogFile {
    material: Vec<Material>,
}

static BUILTIN: Lazy<Vec<Material>> = Lazy::new(|| match parse_catalog(MATERIALS_TOML) {
    Ok(rows) => rows,
    Err(e) => {
        tracing::error!(error = %e, "embedded material catalog is invalid");
        Vec::new()
    }
});

fn parse_catalog(source: &str) -> Result<Vec<Material>, toml::de::Error> {
    let file: CatalogFile = toml::from_str(source)?;
    Ok(file.material)
}

/// The immutable reference materials.
pub fn builtin_materials() -> &'static [Material] {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let rows = parse_catalog(MATERIALS_TOML).unwrap();
        assert!(rows.len() >= 15);
        assert_eq!(rows.len(), builtin_materials().len());
    }

    #[test]
    fn test_every_row_is_valid() {
        for material in builtin_materials() {
            material.validate().unwrap_or_else(|e| panic!("{}: {}", material.name, e));
            assert!(!material.custom);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let rows = builtin_materials();
        for (i, a) in rows.iter().enumerate() {
            for b in &rows[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(&b.name), "duplicate {}", a.name);
            }
        }
    }

    #[test]
    fn test_reference_taylor_row() {
        let row = builtin_materials().iter().find(|m| m.name == "42CrMo4").unwrap();
        assert_eq!(row.taylor_c, 300.0);
        assert_eq!(row.taylor_n, 0.25);
    }
}
