//! Query execution.

use std::sync::Arc;

use groundtruth_store::ReportStore;
use groundtruth_types::Report;

use crate::{QueryError, ReportQuery};

/// Runs [`ReportQuery`]s against a store. Never writes.
pub struct QueryEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for QueryEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReportStore + ?Sized> QueryEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Reports matching `query`, newest first.
    pub fn query(&self, query: &ReportQuery) -> Result<Vec<Report>, QueryError> {
        let reports = self.store.find_by_filter(&query.to_filter())?;
        tracing::debug!(
            status = ?query.status,
            near = query.near.is_some(),
            results = reports.len(),
            "report query"
        );
        Ok(reports)
    }
}
