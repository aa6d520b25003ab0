//! Shared handler state.

use std::sync::Arc;

use groundtruth_ledger::ReportLedger;
use groundtruth_query::QueryEngine;
use groundtruth_verification::VerificationLedger;

use crate::RpcMetrics;

/// Everything a request handler can reach. Cheap to clone.
pub struct AppState<S> {
    pub ledger: ReportLedger<S>,
    pub verification: VerificationLedger<S>,
    pub query: QueryEngine<S>,
    pub metrics: Arc<RpcMetrics>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            verification: self.verification.clone(),
            query: self.query.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(
        ledger: ReportLedger<S>,
        verification: VerificationLedger<S>,
        query: QueryEngine<S>,
        metrics: Arc<RpcMetrics>,
    ) -> Self {
        Self {
            ledger,
            verification,
            query,
            metrics,
        }
    }
}
