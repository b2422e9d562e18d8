pub mod reconcile;
pub mod system;
