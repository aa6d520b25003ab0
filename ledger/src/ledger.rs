//! The report submission pipeline and moderation actions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use groundtruth_crypto::digest;
use groundtruth_store::{
    ActivityStore, BlobStore, LedgerStore, ModerationStore, ReportStore, StatusChange, StoreError,
};
use groundtruth_types::{
    ActivityEntry, AnalysisSignal, Clock, ModerationAction, ModerationLogEntry, NewReport, Report,
    ReportId, ReportStatus, Roster, UserId, UserRole,
};

use crate::audit::{audit_chain, ChainAudit};
use crate::linker::ChainLinker;
use crate::submission::ReportSubmission;
use crate::LedgerError;

fn default_max_link_attempts() -> u32 {
    5
}

/// Tunables for [`ReportLedger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// How many times a submission re-reads the head after losing an
    /// insert race before giving up with [`LedgerError::Conflict`].
    #[serde(default = "default_max_link_attempts")]
    pub max_link_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_link_attempts: default_max_link_attempts(),
        }
    }
}

/// Hashes, uploads, links and stores reports, and applies moderation.
pub struct ReportLedger<S> {
    store: Arc<S>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    roster: Arc<Roster>,
}

impl<S> Clone for ReportLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            blobs: Arc::clone(&self.blobs),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            roster: Arc::clone(&self.roster),
        }
    }
}

impl<S: LedgerStore> ReportLedger<S> {
    pub fn new(
        store: Arc<S>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            clock,
            config,
            roster: Arc::default(),
        }
    }

    /// Replace the default roster, under which nobody may moderate.
    pub fn with_roster(mut self, roster: Arc<Roster>) -> Self {
        self.roster = roster;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn role_of(&self, user: &UserId) -> UserRole {
        self.roster.role_of(user)
    }

    fn require(
        &self,
        user: &UserId,
        allowed: fn(UserRole) -> bool,
        action: &'static str,
    ) -> Result<(), LedgerError> {
        let role = self.roster.role_of(user);
        if allowed(role) {
            return Ok(());
        }
        tracing::debug!(%user, %role, action, "action refused");
        Err(LedgerError::Forbidden {
            user: user.to_string(),
            role,
            action,
        })
    }

    /// Accept a report.
    ///
    /// The media is uploaded before linking, so a failed upload leaves
    /// nothing on the chain. Losing an insert race re-links against the new
    /// head, up to `max_link_attempts` times.
    pub fn submit(
        &self,
        submission: ReportSubmission,
        signal: AnalysisSignal,
    ) -> Result<Report, LedgerError> {
        self.require(
            submission.creator_id(),
            UserRole::can_contribute,
            "submit reports",
        )?;
        let hash = digest(submission.file_bytes());
        let media_url = self.blobs.put(
            submission.file_bytes(),
            submission.file_name(),
            submission.mime_type(),
        )?;
        tracing::debug!(%hash, %media_url, "media stored");

        let attempts = self.config.max_link_attempts.max(1);
        for attempt in 1..=attempts {
            let linked = ChainLinker::link(&*self.store, hash)?;
            let new = NewReport {
                title: submission.title().to_string(),
                creator_id: submission.creator_id().clone(),
                media_url: media_url.clone(),
                location: submission.location(),
                content_hash: linked.hash,
                previous_hash: linked.previous_hash,
                timestamp: self.clock.now(),
                analysis: signal.clone(),
            };
            match self.store.insert_report(new) {
                Ok(report) => {
                    tracing::info!(
                        id = %report.id,
                        hash = %report.content_hash,
                        previous = %report.previous_hash,
                        attempt,
                        "report accepted"
                    );
                    return Ok(report);
                }
                Err(StoreError::Conflict { previous, head }) => {
                    tracing::debug!(attempt, %previous, %head, "chain head moved, relinking");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(%hash, attempts, "gave up linking report");
        Err(LedgerError::Conflict { attempts })
    }

    pub fn get_report(&self, id: &ReportId) -> Result<Report, LedgerError> {
        self.store
            .get_report(id)?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Archive a report. Only admins may archive. Archiving an archived
    /// report changes nothing and logs nothing.
    pub fn archive(
        &self,
        id: &ReportId,
        actor: &UserId,
        reason: Option<String>,
    ) -> Result<Report, LedgerError> {
        self.require(actor, UserRole::can_moderate, "archive reports")?;
        let now = self.clock.now();
        match self
            .store
            .update_report_status(id, ReportStatus::Archived, actor, now)?
        {
            StatusChange::Unchanged(report) => Ok(report),
            StatusChange::Changed { report, .. } => {
                self.store.append_moderation(&ModerationLogEntry {
                    action: ModerationAction::ArchiveReport {
                        report_id: id.clone(),
                        reason,
                    },
                    performed_by: actor.clone(),
                    timestamp: now,
                })?;
                tracing::info!(id = %id, actor = %actor, "report archived");
                Ok(report)
            }
        }
    }

    /// Admin status override.
    pub fn set_status(
        &self,
        id: &ReportId,
        status: ReportStatus,
        actor: &UserId,
    ) -> Result<Report, LedgerError> {
        self.require(actor, UserRole::can_moderate, "override report status")?;
        if status.is_archived() {
            return self.archive(id, actor, None);
        }
        let now = self.clock.now();
        match self.store.update_report_status(id, status, actor, now)? {
            StatusChange::Unchanged(report) => Ok(report),
            StatusChange::Changed { from, report } => {
                self.store.append_moderation(&ModerationLogEntry {
                    action: ModerationAction::SetStatus {
                        report_id: id.clone(),
                        from,
                        to: status,
                    },
                    performed_by: actor.clone(),
                    timestamp: now,
                })?;
                tracing::info!(id = %id, actor = %actor, %from, to = %status, "status overridden");
                Ok(report)
            }
        }
    }

    pub fn moderation_log(
        &self,
        id: Option<&ReportId>,
    ) -> Result<Vec<ModerationLogEntry>, LedgerError> {
        Ok(self.store.moderation_log(id)?)
    }

    /// Uploads and votes by `user`, oldest first.
    pub fn activity_log(&self, user: &UserId) -> Result<Vec<ActivityEntry>, LedgerError> {
        Ok(self.store.activity_log(Some(user))?)
    }

    pub fn verify_chain(&self) -> Result<ChainAudit, LedgerError> {
        let audit = audit_chain(&*self.store)?;
        if !audit.is_intact() {
            tracing::warn!(faults = audit.faults.len(), "chain audit found faults");
        }
        Ok(audit)
    }
}
