pub mod adapters;
pub mod campaign;
pub mod context;
pub mod placements;
