//! Data models.

pub mod instance;
pub mod policy;

pub use instance::{AuthMode, Instance, InstanceStatus};
pub use policy::{Filter, FilterType, Policy, Trigger, TriggerSettings, TriggerType};
