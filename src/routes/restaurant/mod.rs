mod handler;

pub use handler::{find_nearby, find_restaurant};
