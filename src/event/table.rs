use std::collections::HashMap;
use std::sync::Arc;

use super::callback::Callback;
use super::error::RegistryError;
use super::handler::EventHandler;
use super::types::EventType;

/// Handles that can be matched by identity when unsubscribing
pub trait SameHandle {
    fn same_handle(&self, other: &Self) -> bool;
}

impl<P> SameHandle for Callback<P> {
    fn same_handle(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<P> SameHandle for Arc<dyn EventHandler<P>> {
    fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Event type -> ordered subscriber list
///
/// Holds no lock of its own; the owning registry serializes access.
#[derive(Debug)]
pub(crate) struct SubscriberTable<H> {
    lists: HashMap<EventType, Vec<H>>,
}

impl<H: SameHandle + Clone> SubscriberTable<H> {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }

    /// Appends every handle to every type's list (types outer, handles
    /// inner). Returns the number of entries appended.
    pub fn subscribe(&mut self, types: &[EventType], handles: &[H]) -> usize {
        for event_type in types {
            self.lists
                .entry(event_type.clone())
                .or_default()
                .extend(handles.iter().cloned());
        }
        types.len() * handles.len()
    }

    /// Removes the first occurrence of each handle from each type's list.
    ///
    /// All types are checked before anything is removed, so an unknown type
    /// leaves the table untouched. Returns the number of entries removed.
    pub fn unsubscribe(
        &mut self,
        types: &[EventType],
        handles: &[H],
    ) -> Result<usize, RegistryError> {
        if let Some(unknown) = types.iter().find(|t| !self.lists.contains_key(*t)) {
            return Err(RegistryError::UnknownEventType(unknown.clone()));
        }

        let mut removed = 0;
        for event_type in types {
            let Some(list) = self.lists.get_mut(event_type) else {
                continue;
            };
            for handle in handles {
                if let Some(index) = list.iter().position(|h| h.same_handle(handle)) {
                    list.remove(index);
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Copy of a type's list as it is right now, or `None` if the type was
    /// never subscribed
    pub fn snapshot(&self, event_type: &EventType) -> Option<Vec<H>> {
        self.lists.get(event_type).cloned()
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.lists.get(event_type).map_or(0, Vec::len)
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.lists.contains_key(event_type)
    }

    /// Known event types, sorted
    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.lists.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn total_subscriptions(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Handle(Arc<&'static str>);

    impl Handle {
        fn new(name: &'static str) -> Self {
            Self(Arc::new(name))
        }
    }

    impl SameHandle for Handle {
        fn same_handle(&self, other: &Self) -> bool {
            Arc::ptr_eq(&self.0, &other.0)
        }
    }

    fn types(names: &[&str]) -> Vec<EventType> {
        names.iter().map(|n| EventType::from(*n)).collect()
    }

    fn listed(table: &SubscriberTable<Handle>, event_type: &str) -> Vec<&'static str> {
        table
            .snapshot(&event_type.into())
            .unwrap_or_default()
            .iter()
            .map(|h| *h.0)
            .collect()
    }

    #[test]
    fn test_subscribe_creates_then_appends() {
        let mut table = SubscriberTable::new();
        let (f, g) = (Handle::new("f"), Handle::new("g"));

        assert!(!table.contains("fn"));
        table.subscribe(&types(&["fn"]), &[f.clone()]);
        assert_eq!(listed(&table, "fn"), vec!["f"]);

        table.subscribe(&types(&["fn"]), &[g]);
        assert_eq!(listed(&table, "fn"), vec!["f", "g"]);
    }

    #[test]
    fn test_subscribe_is_cartesian() {
        let mut table = SubscriberTable::new();
        let handles = [Handle::new("f"), Handle::new("g")];

        let appended = table.subscribe(&types(&["a", "b", "c"]), &handles);

        assert_eq!(appended, 6);
        for t in ["a", "b", "c"] {
            assert_eq!(listed(&table, t), vec!["f", "g"]);
        }
    }

    #[test]
    fn test_subscribe_with_no_handles_still_registers_type() {
        let mut table: SubscriberTable<Handle> = SubscriberTable::new();
        table.subscribe(&types(&["empty"]), &[]);
        assert!(table.contains("empty"));
        assert_eq!(table.subscriber_count("empty"), 0);
    }

    #[test]
    fn test_unsubscribe_removes_first_occurrence_only() {
        let mut table = SubscriberTable::new();
        let (f, g) = (Handle::new("f"), Handle::new("g"));
        table.subscribe(&types(&["e"]), &[f.clone(), g.clone(), f.clone()]);

        let removed = table.unsubscribe(&types(&["e"]), &[f]).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(listed(&table, "e"), vec!["g", "f"]);
    }

    #[test]
    fn test_unsubscribe_missing_handle_leaves_list_alone() {
        let mut table = SubscriberTable::new();
        let (f, g) = (Handle::new("f"), Handle::new("g"));
        table.subscribe(&types(&["e"]), &[f]);

        let removed = table.unsubscribe(&types(&["e"]), &[g]).unwrap();

        assert_eq!(removed, 0);
        assert_eq!(listed(&table, "e"), vec!["f"]);
    }

    #[test]
    fn test_unsubscribe_with_unknown_type_is_all_or_nothing() {
        let mut table = SubscriberTable::new();
        let f = Handle::new("f");
        table.subscribe(&types(&["known"]), &[f.clone()]);

        let err = table
            .unsubscribe(&types(&["known", "missing"]), &[f])
            .unwrap_err();

        assert_eq!(err, RegistryError::UnknownEventType("missing".into()));
        assert_eq!(listed(&table, "known"), vec!["f"]);
    }

    #[test]
    fn test_emptied_list_stays_known() {
        let mut table = SubscriberTable::new();
        let f = Handle::new("f");
        table.subscribe(&types(&["e"]), &[f.clone()]);
        table.unsubscribe(&types(&["e"]), &[f.clone()]).unwrap();

        assert!(table.contains("e"));
        assert_eq!(table.unsubscribe(&types(&["e"]), &[f]), Ok(0));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut table = SubscriberTable::new();
        let f = Handle::new("f");
        table.subscribe(&types(&["e"]), &[f.clone()]);

        let snapshot = table.snapshot(&"e".into()).unwrap();
        table.subscribe(&types(&["e"]), &[f]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.subscriber_count("e"), 2);
        assert_eq!(table.total_subscriptions(), 2);
        assert!(table.snapshot(&"other".into()).is_none());
    }
}
