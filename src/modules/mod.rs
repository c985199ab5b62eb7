//! Feature module discovery and ordering

pub mod planner;
pub mod registry;

pub use planner::{ModulePlan, ModulePlanner};
pub use registry::{ModuleRegistry, StatusFileModuleRegistry};
