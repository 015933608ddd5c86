mod handler;
mod model;

pub use handler::{clear_checkins, get_checkin, list_checkins, reset_flow, scan};
pub use model::{ScanRequest, ScanResponse};
