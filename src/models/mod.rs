mod checkin;
mod restaurant;
mod review;
pub mod tier;
mod user;

pub use checkin::CheckIn;
pub use restaurant::{NearbyRestaurant, Restaurant};
pub use review::{Review, ReviewDraft, ReviewVisibility, MAX_RATING};
pub use tier::{Tier, TierLevel};
pub use user::{ProfileValidationError, UserProfile, UserProfileUpdate, DEFAULT_AVATAR};
