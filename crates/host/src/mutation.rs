use std::time::{SystemTime, UNIX_EPOCH};

use annot_model::{apply_value_action, AnnotationDraft, AnnotationPatch, ValueAction};
use uuid::Uuid;

use crate::store::ValueStore;

/// Applies annotation mutations to the persisted value through a store.
///
/// The channel is fire-and-forget: it reads the current value, applies the
/// action, and writes back only when the value actually changed. Unknown ids
/// therefore never touch the store.
pub struct MutationChannel<'a, S: ValueStore> {
    store: &'a mut S,
}

impl<'a, S: ValueStore> MutationChannel<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Commit a draft: assign a fresh id and timestamp, append, bump the
    /// version. Returns the assigned id.
    pub fn add(&mut self, draft: AnnotationDraft) -> String {
        let id = Uuid::new_v4().to_string();
        let annotation = draft.into_annotation(id.clone(), current_timestamp_ms());

        let mut value = self.store.read();
        apply_value_action(&mut value, ValueAction::Add { annotation });
        self.store.write(&value);

        id
    }

    pub fn update(&mut self, id: &str, patch: AnnotationPatch) {
        self.apply_if_changed(ValueAction::Update { id: id.to_owned(), patch });
    }

    pub fn delete(&mut self, id: &str) {
        self.apply_if_changed(ValueAction::Delete { id: id.to_owned() });
    }

    fn apply_if_changed(&mut self, action: ValueAction) {
        let mut value = self.store.read();
        let version_before = value.version;

        apply_value_action(&mut value, action);

        if value.version != version_before {
            self.store.write(&value);
        }
    }
}

fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryValueStore;
    use annot_model::PdfValue;

    struct CountingStore {
        inner: MemoryValueStore,
        writes: usize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self { inner: MemoryValueStore::default(), writes: 0 }
        }
    }

    impl ValueStore for CountingStore {
        fn read(&self) -> PdfValue {
            self.inner.read()
        }

        fn write(&mut self, value: &PdfValue) {
            self.writes += 1;
            self.inner.write(value);
        }
    }

    fn highlight_draft() -> AnnotationDraft {
        AnnotationDraft::highlight(1, 0.0, 10.0, 100.0, 20.0, "rgba(255, 255, 0, 0.3)".to_owned())
    }

    #[test]
    fn add_assigns_identity_and_bumps_version() {
        let mut store = MemoryValueStore::default();
        let id = MutationChannel::new(&mut store).add(highlight_draft());

        let value = store.read();
        assert!(!id.is_empty());
        assert_eq!(value.annotations.len(), 1);
        assert_eq!(value.annotations[0].id, id);
        assert!(value.annotations[0].timestamp > 0);
        assert_eq!(value.version, 2);
    }

    #[test]
    fn add_assigns_distinct_ids() {
        let mut store = MemoryValueStore::default();
        let mut channel = MutationChannel::new(&mut store);

        let first = channel.add(highlight_draft());
        let second = channel.add(highlight_draft());

        assert_ne!(first, second);
    }

    #[test]
    fn update_rewrites_the_stored_value() {
        let mut store = MemoryValueStore::default();
        let id = MutationChannel::new(&mut store).add(highlight_draft());

        MutationChannel::new(&mut store).update(&id, AnnotationPatch::content("note"));

        let value = store.read();
        assert_eq!(value.annotations[0].content.as_deref(), Some("note"));
        assert_eq!(value.version, 3);
    }

    #[test]
    fn delete_removes_and_bumps() {
        let mut store = MemoryValueStore::default();
        let id = MutationChannel::new(&mut store).add(highlight_draft());

        MutationChannel::new(&mut store).delete(&id);

        let value = store.read();
        assert!(value.annotations.is_empty());
        assert_eq!(value.version, 3);
    }

    #[test]
    fn unknown_id_update_never_writes() {
        let mut store = CountingStore::new();

        MutationChannel::new(&mut store).update("missing", AnnotationPatch::content("x"));

        assert_eq!(store.writes, 0);
        assert_eq!(store.read().version, 1);
    }

    #[test]
    fn unknown_id_delete_never_writes() {
        let mut store = CountingStore::new();

        MutationChannel::new(&mut store).delete("missing");

        assert_eq!(store.writes, 0);
        assert_eq!(store.read().version, 1);
    }
}
