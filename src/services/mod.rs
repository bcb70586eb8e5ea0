//! Service layer.

pub mod preheat_service;
pub mod trigger_reconciler;

pub use preheat_service::PreheatService;
pub use trigger_reconciler::{TriggerDiff, TriggerReconciler};
