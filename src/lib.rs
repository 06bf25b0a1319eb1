pub mod code_filter;
pub mod constants;
pub mod features;
pub mod grouping;
pub mod map_params;
pub mod markers;
pub mod reconcile;
pub mod state;
pub mod telemap;
pub mod telemap_errors;
pub mod time;

pub use features::feature_file::{FeatureFile, PointFile};
pub use grouping::stats::GroupSetExt;
pub use reconcile::RenderHandle;
