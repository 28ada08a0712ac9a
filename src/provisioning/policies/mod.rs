pub mod admin_access;

pub use admin_access::{AdminAccessPolicy, ListenerRulePlan, RuleAction};
