//! Implementation-index snapshots.
//!
//! A snapshot is the JSON encoding of every `(key, impl)` entry of an
//! [`ImplIndexStore`]. Decoding is strict: a snapshot that does not parse,
//! or was written in another format, is reported as corrupted and the
//! caller must rebuild the index from source.

use serde::{Deserialize, Serialize};

use crate::syntax::NodeId;

use super::error::IndexError;
use super::impls::{ImplIndexStore, ImplKey};

const FORMAT: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    entries: Vec<(ImplKey, NodeId)>,
}

/// Serialize every entry of `store`.
pub fn encode_snapshot(store: &dyn ImplIndexStore) -> Result<String, IndexError> {
    let snapshot = Snapshot { format: FORMAT, entries: store.entries() };
    serde_json::to_string(&snapshot).map_err(|err| IndexError::Encode { reason: err.to_string() })
}

/// Decode the entries of a snapshot.
pub fn decode_snapshot(text: &str) -> Result<Vec<(ImplKey, NodeId)>, IndexError> {
    let snapshot: Snapshot = serde_json::from_str(text).map_err(|err| {
        tracing::warn!(error = %err, "implementation index snapshot failed to decode");
        IndexError::Corrupted { reason: err.to_string() }
    })?;
    if snapshot.format != FORMAT {
        tracing::warn!(format = snapshot.format, expected = FORMAT, "implementation index snapshot has unknown format");
        return Err(IndexError::Corrupted { reason: format!("unsupported snapshot format {}", snapshot.format) });
    }
    Ok(snapshot.entries)
}

/// Decode a snapshot into `store`. Returns the number of entries loaded.
/// Nothing is inserted if decoding fails.
pub fn load_snapshot(store: &dyn ImplIndexStore, text: &str) -> Result<usize, IndexError> {
    let entries = decode_snapshot(text)?;
    let count = entries.len();
    for (key, imp) in entries {
        store.insert(key, imp);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::hir::MemoryImplStore;
    use crate::syntax::{LocalNodeId, PrimTy, QualifiedPath};

    #[test]
    fn test_snapshot_restores_probe_results() {
        let store = MemoryImplStore::default();
        let imp = NodeId::new(FileId::new(2), LocalNodeId::new(5));
        store.insert(ImplKey::Path(QualifiedPath::parse("a::Foo").unwrap()), imp);
        store.insert(ImplKey::Primitive(PrimTy::Bool), NodeId::new(FileId::new(2), LocalNodeId::new(9)));

        let text = encode_snapshot(&store).unwrap();
        let restored = MemoryImplStore::default();
        assert_eq!(load_snapshot(&restored, &text).unwrap(), 2);
        assert_eq!(restored.probe(&ImplKey::hole()), vec![imp]);
    }

    #[test]
    fn test_malformed_snapshot_is_corrupted() {
        let store = MemoryImplStore::default();
        let err = load_snapshot(&store, "{\"format\":1,\"entries\":[[").unwrap_err();
        assert!(matches!(err, IndexError::Corrupted { .. }));
        assert!(store.is_empty());

        let err = decode_snapshot("{\"format\":99,\"entries\":[]}").unwrap_err();
        assert!(matches!(err, IndexError::Corrupted { reason } if reason.contains("99")));
    }
}
