//! Shared state for API handlers

use std::sync::Arc;

use dashboard::{DashboardParams, RefreshHandle, WhaleSource};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    source: Arc<dyn WhaleSource>,
    defaults: DashboardParams,
    refresher: Arc<RefreshHandle>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("source", &self.source.kind())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ApiState {
    /// Create a new [`ApiState`].
    ///
    /// `defaults` fill in query parameters a request leaves out; `refresher`
    /// backs the dashboard endpoints.
    pub fn new(
        source: Arc<dyn WhaleSource>,
        defaults: DashboardParams,
        refresher: Arc<RefreshHandle>,
    ) -> Self {
        Self { source, defaults, refresher }
    }

    /// Source used by the ad-hoc query endpoints.
    pub fn source(&self) -> &dyn WhaleSource {
        self.source.as_ref()
    }

    /// Parameters used when a request does not override them.
    pub const fn defaults(&self) -> &DashboardParams {
        &self.defaults
    }

    /// Background dashboard refresher.
    pub fn refresher(&self) -> &RefreshHandle {
        &self.refresher
    }
}
