//! Nullable store: thread-safe in-memory ledger storage for testing.
//!
//! A single mutex guards all state, so the chain-head check in
//! `insert_report`, the duplicate check in `insert_vote` and the tally in
//! `settle_status` are atomic with their writes, the same guarantee the LMDB
//! write transaction gives.

use groundtruth_store::{
    check_chain_append, sort_newest_first, ActivityStore, ChainStore, ModerationStore,
    ReportFilter, ReportStore, Settlement, StatusChange, StatusRule, StoreError, VoteStore,
};
use groundtruth_types::{
    ActivityEntry, ChainRecord, ModerationAction, ModerationLogEntry, NewReport, PreviousHash,
    Report, ReportId, ReportStatus, Timestamp, UserId, Vote, VoteTally,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// Insertion order, which is also timestamp order.
    reports: Vec<Report>,
    by_id: HashMap<ReportId, usize>,
    chain: Vec<ChainRecord>,
    votes: Vec<Vote>,
    vote_keys: HashSet<(ReportId, UserId)>,
    moderation: Vec<ModerationLogEntry>,
    activity: Vec<ActivityEntry>,
    next_seq: u64,
    unavailable: bool,
    interlopers: Vec<NewReport>,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("null store offline".into()));
        }
        Ok(())
    }

    fn append(&mut self, new: NewReport) -> Result<Report, StoreError> {
        let timestamp = check_chain_append(&new, self.reports.last())?;
        let id = ReportId::from_sequence(self.next_seq);
        self.next_seq += 1;
        let mut report = Report::from_new(id.clone(), new);
        report.timestamp = timestamp;
        self.chain.push(report.chain_record());
        self.by_id.insert(id, self.reports.len());
        self.activity.push(ActivityEntry::upload(&report));
        self.reports.push(report.clone());
        Ok(report)
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// An in-memory report/vote/moderation store for testing.
pub struct NullStore {
    inner: Mutex<Inner>,
    before_settle: Mutex<Vec<Hook>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            before_settle: Mutex::new(Vec::new()),
        }
    }

    /// Run `hook` at the start of the next `settle_status`, before it takes
    /// the store lock. Lets a test slip another writer between a vote and
    /// the consensus decision that follows it.
    pub fn before_next_settle(&self, hook: impl FnOnce() + Send + 'static) {
        self.before_settle.lock().unwrap().push(Box::new(hook));
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    /// Simulate a concurrent writer: `report` is appended (linked to
    /// whatever the head is at that moment) immediately before the next
    /// `insert_report` performs its head check.
    pub fn inject_concurrent_insert(&self, report: NewReport) {
        self.inner.lock().unwrap().interlopers.push(report);
    }

    /// Overwrite a stored chain record, for tamper-detection tests.
    pub fn tamper_chain_record(&self, index: usize, record: ChainRecord) {
        self.inner.lock().unwrap().chain[index] = record;
    }

    /// Edit a stored report document in place, bypassing every check.
    pub fn tamper_report(&self, id: &ReportId, edit: impl FnOnce(&mut Report)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&idx) = inner.by_id.get(id) {
            edit(&mut inner.reports[idx]);
        }
    }

    /// Make a report unreachable by id while leaving its chain record.
    pub fn lose_report(&self, id: &ReportId) {
        self.inner.lock().unwrap().by_id.remove(id);
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore for NullStore {
    fn insert_report(&self, report: NewReport) -> Result<Report, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let interlopers = std::mem::take(&mut inner.interlopers);
        for mut racer in interlopers {
            racer.previous_hash = inner
                .reports
                .last()
                .map(|h| h.content_hash.into())
                .unwrap_or(PreviousHash::Genesis);
            inner.append(racer)?;
        }
        inner.append(report)
    }

    fn find_latest(&self) -> Result<Option<Report>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.reports.last().cloned())
    }

    fn get_report(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.by_id.get(id).map(|&i| inner.reports[i].clone()))
    }

    fn find_by_filter(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let mut out: Vec<Report> = inner
            .reports
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    fn update_report_status(
        &self,
        id: &ReportId,
        status: ReportStatus,
        actor: &UserId,
        at: Timestamp,
    ) -> Result<StatusChange, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let idx = *inner
            .by_id
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("report {id}")))?;
        let report = &mut inner.reports[idx];
        let from = report.status;
        if report.apply_status(status, actor, at) {
            Ok(StatusChange::Changed {
                from,
                report: report.clone(),
            })
        } else {
            Ok(StatusChange::Unchanged(report.clone()))
        }
    }

    fn report_count(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.reports.len() as u64)
    }
}

impl ChainStore for NullStore {
    fn chain_records(&self) -> Result<Vec<ChainRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.chain.clone())
    }

    fn chain_len(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.chain.len() as u64)
    }
}

impl VoteStore for NullStore {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        if !inner.by_id.contains_key(&vote.report_id) {
            return Err(StoreError::NotFound(format!("report {}", vote.report_id)));
        }
        let key = (vote.report_id.clone(), vote.user_id.clone());
        if !inner.vote_keys.insert(key) {
            return Err(StoreError::DuplicateVote {
                report_id: vote.report_id.to_string(),
                user_id: vote.user_id.to_string(),
            });
        }
        inner.votes.push(vote.clone());
        inner.activity.push(ActivityEntry::vote(vote));
        Ok(())
    }

    fn votes_for(&self, report_id: &ReportId) -> Result<Vec<Vote>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .votes
            .iter()
            .filter(|v| &v.report_id == report_id)
            .cloned()
            .collect())
    }

    fn settle_status(
        &self,
        report_id: &ReportId,
        at: Timestamp,
        rule: StatusRule<'_>,
    ) -> Result<Settlement, StoreError> {
        let hooks = std::mem::take(&mut *self.before_settle.lock().unwrap());
        for hook in hooks {
            hook();
        }

        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        inner.check_available()?;
        let idx = *inner
            .by_id
            .get(report_id)
            .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))?;
        let tally =
            VoteTally::from_votes(inner.votes.iter().filter(|v| &v.report_id == report_id));

        let report = &mut inner.reports[idx];
        let from = report.status;
        let to = rule(from, &tally);
        if report.apply_status(to, &UserId::consensus(), at) {
            inner.moderation.push(ModerationLogEntry {
                action: ModerationAction::ConsensusTransition {
                    report_id: report_id.clone(),
                    from,
                    to,
                    tally,
                },
                performed_by: UserId::consensus(),
                timestamp: at,
            });
        }
        Ok(Settlement {
            tally,
            from,
            report: inner.reports[idx].clone(),
        })
    }
}

impl ModerationStore for NullStore {
    fn append_moderation(&self, entry: &ModerationLogEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.moderation.push(entry.clone());
        Ok(())
    }

    fn moderation_log(
        &self,
        report_id: Option<&ReportId>,
    ) -> Result<Vec<ModerationLogEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .moderation
            .iter()
            .filter(|e| report_id.map_or(true, |id| e.action.report_id() == id))
            .cloned()
            .collect())
    }
}

impl ActivityStore for NullStore {
    fn activity_log(&self, user_id: Option<&UserId>) -> Result<Vec<ActivityEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .activity
            .iter()
            .filter(|e| user_id.map_or(true, |u| &e.user_id == u))
            .cloned()
            .collect())
    }
}
