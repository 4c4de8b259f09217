pub mod ids;
pub mod model;

pub use ids::{CategoryType, MediaId};
pub use model::TrackMetadata;
