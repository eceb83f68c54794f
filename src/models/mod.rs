pub mod clip;
pub mod store;

pub use clip::{Clip, ClipMeta, FavoriteOutcome};
pub use store::{ClipStore, Settings, Snapshot};
