//! Change-notification wiring
//!
//! The store emits a change event after every successful commit: one Created
//! per fresh insert, one Updated per reconciled duplicate delivery, one
//! Deleted per bulk pool deletion. Emission is fire-and-forget; an emitter
//! must never influence transaction outcome, and the store never emits on a
//! rolled-back path.

use std::fmt;
use uuid::Uuid;

/// Collection name carried on every transfer change event
pub const TOKEN_TRANSFERS_COLLECTION: &str = "tokentransfers";

/// The kind of change an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A fresh row was inserted
    Created,
    /// A duplicate delivery was reconciled against an existing row
    Updated,
    /// A namespace+pool scope was bulk-deleted
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A post-commit change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Collection the change belongs to
    pub collection: &'static str,
    /// Kind of change
    pub kind: ChangeKind,
    /// Namespace the change happened in
    pub namespace: String,
    /// Local ID of the affected row (None for scope-level deletes)
    pub local_id: Option<Uuid>,
    /// Pool the change is scoped to
    pub pool_id: Option<Uuid>,
}

impl ChangeEvent {
    /// Event for a freshly inserted transfer
    pub fn created(namespace: &str, local_id: Uuid, pool_id: Uuid) -> Self {
        Self {
            collection: TOKEN_TRANSFERS_COLLECTION,
            kind: ChangeKind::Created,
            namespace: namespace.to_string(),
            local_id: Some(local_id),
            pool_id: Some(pool_id),
        }
    }

    /// Event for a reconciled duplicate delivery
    pub fn updated(namespace: &str, local_id: Uuid, pool_id: Uuid) -> Self {
        Self {
            collection: TOKEN_TRANSFERS_COLLECTION,
            kind: ChangeKind::Updated,
            namespace: namespace.to_string(),
            local_id: Some(local_id),
            pool_id: Some(pool_id),
        }
    }

    /// Event for a bulk deletion of a namespace+pool scope
    pub fn deleted_scope(namespace: &str, pool_id: Uuid) -> Self {
        Self {
            collection: TOKEN_TRANSFERS_COLLECTION,
            kind: ChangeKind::Deleted,
            namespace: namespace.to_string(),
            local_id: None,
            pool_id: Some(pool_id),
        }
    }
}

/// Receiver for post-commit change events
///
/// Implementations must be cheap and must not fail: the return value of an
/// emission is never consulted, and by the time an event fires the commit
/// has already durably landed.
pub trait ChangeEmitter: Send + Sync {
    /// Deliver a change event (fire and forget)
    fn emit(&self, event: ChangeEvent);
}

/// Emitter that drops every event
#[derive(Debug, Default)]
pub struct NullEmitter;

impl ChangeEmitter for NullEmitter {
    fn emit(&self, _event: ChangeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let local = Uuid::now_v7();
        let pool = Uuid::now_v7();

        let created = ChangeEvent::created("ns1", local, pool);
        assert_eq!(created.kind, ChangeKind::Created);
        assert_eq!(created.local_id, Some(local));
        assert_eq!(created.collection, TOKEN_TRANSFERS_COLLECTION);

        let deleted = ChangeEvent::deleted_scope("ns1", pool);
        assert_eq!(deleted.kind, ChangeKind::Deleted);
        assert_eq!(deleted.local_id, None);
        assert_eq!(deleted.pool_id, Some(pool));
    }

    #[test]
    fn test_change_kind_display() {
        assert_eq!(ChangeKind::Created.to_string(), "created");
        assert_eq!(ChangeKind::Updated.to_string(), "updated");
        assert_eq!(ChangeKind::Deleted.to_string(), "deleted");
    }
}
