use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Name of a class of publishable events
///
/// Compared by exact string match: no case folding, no trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&String> for EventType {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}

impl From<&EventType> for EventType {
    fn from(event_type: &EventType) -> Self {
        event_type.clone()
    }
}

/// Argument that is either a single item or an ordered list of items
///
/// Every registry operation accepts its event types and callbacks through
/// this type, so `"a"`, `["a", "b"]` and `vec![cb1, cb2]` all work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens into an ordered list; `One` becomes a single-element list
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

// Event types: a bare name becomes `One`, any list of names becomes `Many`.

impl From<EventType> for OneOrMany<EventType> {
    fn from(event_type: EventType) -> Self {
        OneOrMany::One(event_type)
    }
}

impl From<&EventType> for OneOrMany<EventType> {
    fn from(event_type: &EventType) -> Self {
        OneOrMany::One(event_type.clone())
    }
}

impl From<&str> for OneOrMany<EventType> {
    fn from(name: &str) -> Self {
        OneOrMany::One(name.into())
    }
}

impl From<String> for OneOrMany<EventType> {
    fn from(name: String) -> Self {
        OneOrMany::One(name.into())
    }
}

impl From<&String> for OneOrMany<EventType> {
    fn from(name: &String) -> Self {
        OneOrMany::One(name.into())
    }
}

impl<S: Into<EventType>> From<Vec<S>> for OneOrMany<EventType> {
    fn from(names: Vec<S>) -> Self {
        OneOrMany::Many(names.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<EventType>, const N: usize> From<[S; N]> for OneOrMany<EventType> {
    fn from(names: [S; N]) -> Self {
        OneOrMany::Many(names.into_iter().map(Into::into).collect())
    }
}

impl<S> From<&[S]> for OneOrMany<EventType>
where
    for<'a> &'a S: Into<EventType>,
{
    fn from(names: &[S]) -> Self {
        OneOrMany::Many(names.iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(types: OneOrMany<EventType>) -> Vec<String> {
        types
            .into_vec()
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect()
    }

    #[rstest]
    #[case("App.loaded".into(), vec!["App.loaded"])]
    #[case(String::from("App.done").into(), vec!["App.done"])]
    #[case(vec!["a", "b"].into(), vec!["a", "b"])]
    #[case(["x", "y", "z"].into(), vec!["x", "y", "z"])]
    #[case(Vec::<&str>::new().into(), vec![])]
    fn test_event_type_normalization(
        #[case] types: OneOrMany<EventType>,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(names(types), expected);
    }

    #[test]
    fn test_single_name_is_one_even_when_list_like() {
        // A name is never split, whatever it contains
        let types: OneOrMany<EventType> = "a,b".into();
        assert!(matches!(types, OneOrMany::One(_)));
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn test_event_type_is_case_sensitive_and_untrimmed() {
        assert_ne!(EventType::from("Loaded"), EventType::from("loaded"));
        assert_ne!(EventType::from("loaded "), EventType::from("loaded"));
    }

    #[test]
    fn test_slice_of_strings_preserves_order() {
        let owned = vec!["second".to_string(), "first".to_string()];
        let types: OneOrMany<EventType> = owned.as_slice().into();
        assert_eq!(names(types), vec!["second", "first"]);
    }
}
