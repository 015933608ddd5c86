mod handler;
mod model;

pub use handler::{clear_profile, get_profile, list_tiers, update_profile};
pub use model::ProfileResponse;
