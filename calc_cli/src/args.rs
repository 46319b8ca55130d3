//! `key=value` argument handling.

use std::collections::BTreeMap;

use calc_core::units::coerce_number;

/// Parsed command arguments: `key=value` pairs plus bare words.
#[derive(Debug, Default, Clone)]
pub struct Args {
    pairs: BTreeMap<String, String>,
    pub positional: Vec<String>,
}

impl Args {
    /// Keys are case-insensitive and `-` is read as `_`.
    pub fn parse<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = Args::default();
        for item in raw {
            match item.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    args.pairs.insert(normalize_key(key), value.to_string());
                }
                _ => args.positional.push(item),
            }
        }
        args
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.pairs
            .get(&normalize_key(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or(default).to_string()
    }

    /// Number if given; bad numbers read as 0.
    pub fn opt_num(&self, key: &str) -> Option<f64> {
        self.text(key).map(coerce_number)
    }

    pub fn num(&self, key: &str, default: f64) -> f64 {
        self.opt_num(key).unwrap_or(default)
    }

    pub fn count(&self, key: &str, default: u32) -> u32 {
        self.opt_num(key).map(|v| v.max(0.0).round() as u32).unwrap_or(default)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.text(key).map(|v| v.to_lowercase()).as_deref(),
            Some("1" | "true" | "yes" | "y" | "on")
        )
    }

    /// A list separated by `;` or whitespace.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.text(key)
            .map(|v| {
                v.split([';', ' '])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Args {
        Args::parse(items.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_pairs_and_positional() {
        let a = args(&["list", "D=20", "vc=180", "tool-material=hss"]);
        assert_eq!(a.positional, vec!["list"]);
        assert_eq!(a.num("d", 0.0), 20.0);
        assert_eq!(a.text("tool_material"), Some("hss"));
    }

    #[test]
    fn test_number_coercion() {
        let a = args(&["f=0,25", "bad=abc", "empty="]);
        assert_eq!(a.num("f", 0.0), 0.25);
        assert_eq!(a.num("bad", 5.0), 0.0);
        assert_eq!(a.num("empty", 5.0), 5.0);
        assert_eq!(a.num("missing", 5.0), 5.0);
    }

    #[test]
    fn test_flags_counts_lists() {
        let a = args(&["save=1", "internal=no", "holes=3.6", "rates=36,1;36,4 36,9"]);
        assert!(a.flag("save"));
        assert!(!a.flag("internal"));
        assert!(!a.flag("missing"));
        assert_eq!(a.count("holes", 1), 4);
        assert_eq!(a.list("rates"), vec!["36,1", "36,4", "36,9"]);
    }
}
