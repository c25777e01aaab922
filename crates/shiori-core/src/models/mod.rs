mod media;
mod rating;

pub use media::{MediaKind, MediaRef};
pub use rating::Rating;
