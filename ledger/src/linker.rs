//! Chain linking: bind a fresh digest to the current chain head.

use groundtruth_store::{ReportStore, StoreError};
use groundtruth_types::{ContentHash, PreviousHash, Timestamp};

/// A digest paired with the head it was linked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkedHash {
    pub hash: ContentHash,
    pub previous_hash: PreviousHash,
    /// Timestamp of the head at link time; `None` on an empty chain.
    pub head_timestamp: Option<Timestamp>,
}

/// Reads the chain head on every call; holds no state between links.
pub struct ChainLinker;

impl ChainLinker {
    /// Link `hash` to the most recent report, or to the genesis sentinel
    /// when the ledger is empty.
    ///
    /// A head read here may be stale by the time the report is inserted;
    /// the store's conditional insert is what enforces the chain.
    pub fn link<S>(store: &S, hash: ContentHash) -> Result<LinkedHash, StoreError>
    where
        S: ReportStore + ?Sized,
    {
        let head = store.find_latest()?;
        Ok(match head {
            Some(head) => LinkedHash {
                hash,
                previous_hash: PreviousHash::Hash(head.content_hash),
                head_timestamp: Some(head.timestamp),
            },
            None => LinkedHash {
                hash,
                previous_hash: PreviousHash::Genesis,
                head_timestamp: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundtruth_nullables::NullStore;
    use groundtruth_types::{AnalysisSignal, GeoPoint, NewReport, UserId};

    #[test]
    fn empty_chain_links_to_genesis() {
        let store = NullStore::new();
        let linked = ChainLinker::link(&store, ContentHash::new([1; 32])).unwrap();
        assert!(linked.previous_hash.is_genesis());
        assert_eq!(linked.head_timestamp, None);
    }

    #[test]
    fn links_to_latest_report() {
        let store = NullStore::new();
        store
            .insert_report(NewReport {
                title: "first".into(),
                creator_id: UserId::new("u").unwrap(),
                media_url: "memory://1".into(),
                location: GeoPoint::new(0.0, 0.0).unwrap(),
                content_hash: ContentHash::new([1; 32]),
                previous_hash: PreviousHash::Genesis,
                timestamp: Timestamp::from_millis(7),
                analysis: AnalysisSignal::absent(),
            })
            .unwrap();

        let linked = ChainLinker::link(&store, ContentHash::new([2; 32])).unwrap();
        assert_eq!(
            linked.previous_hash,
            PreviousHash::Hash(ContentHash::new([1; 32]))
        );
        assert_eq!(linked.head_timestamp, Some(Timestamp::from_millis(7)));
    }

    #[test]
    fn store_failure_fails_the_link() {
        let store = NullStore::new();
        store.set_unavailable(true);
        assert!(ChainLinker::link(&store, ContentHash::new([1; 32])).is_err());
    }
}
