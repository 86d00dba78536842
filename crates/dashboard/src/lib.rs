//! Whale dashboard: parameters, data sources, refresh scheduling and text
//! rendering on top of the Amp client.

pub mod params;
pub mod refresher;
pub mod render;
pub mod snapshot;
pub mod source;
pub mod stats;
pub mod synthetic;

pub use params::{DashboardParams, ParamsError, QueryPlan};
pub use refresher::{RefreshHandle, Refresher};
pub use snapshot::{FetchStatus, Snapshot, refresh};
pub use source::{LiveSource, SourceKind, WhaleSource};
pub use synthetic::SyntheticSource;
