pub mod allocator;
pub mod cache;
pub mod catalog;
pub mod eligibility;
pub mod engine;
pub mod result;
pub mod store_client;

pub use engine::{place_slots, PlacementOrchestrator, PlacementOutcome};
