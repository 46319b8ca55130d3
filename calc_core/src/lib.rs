//! # calc_core - Machining Shop Calculation Engine
//!
//! `calc_core` is the computational heart of Shopfloor: machining calculators
//! (cutting data, tool life, threading, drilling, grinding, tolerances),
//! business calculators (cost, payroll, currency), and the shop's local data
//! store with history, machines, menu and permissions. All inputs and outputs
//! are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless calculators**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculations::tool_life::taylor_tool_life;
//! use calc_core::units::{spindle_speed, Millimeters, MetersPerMinute};
//!
//! let rpm = spindle_speed(MetersPerMinute(180.0), Millimeters(20.0));
//! assert!((rpm.0 - 2864.8).abs() < 0.1);
//!
//! let minutes = taylor_tool_life(300.0, 0.25, 150.0);
//! assert!((minutes - 16.0).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - All calculators and the `CalculationItem` wrapper
//! - [`materials`] - Workpiece catalog, tool materials, threads, grinding wheels
//! - [`machines`] - Machine inventory entries
//! - [`history`] - Saved calculation records
//! - [`menu`] - Menu configuration and user permissions
//! - [`shop`] - `ShopData` persistence root
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`export`] - CSV export
//! - [`ai`] - Assistant chat and quiz client
//! - [`config`] - Application configuration
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod ai;
pub mod calculations;
pub mod config;
pub mod errors;
pub mod export;
pub mod file_io;
pub mod history;
pub mod machines;
pub mod materials;
pub mod menu;
pub mod shop;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::CalculationItem;
pub use config::AppConfig;
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_shop, save_shop, FileLock};
pub use shop::{ShopData, ShopMetadata, ShopSettings};
