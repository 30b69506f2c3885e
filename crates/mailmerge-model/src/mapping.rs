use serde::{Deserialize, Serialize};

use crate::FieldValue;

/// Field name to value bindings for exactly one record.
///
/// Entries keep header (column) order. Inserting a name that already exists replaces its value
/// in place, so a duplicated header resolves to the right-most column while keeping the position
/// of the first one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMapping
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = FieldMapping::new();
        for (name, value) in iter {
            mapping.insert(name, value);
        }
        mapping
    }
}

/// Fields that must be present and non-blank for a row to produce a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredFields(Vec<String>);

impl Default for RequiredFields {
    fn default() -> Self {
        Self(vec!["Name".to_string(), "Address".to_string()])
    }
}

impl RequiredFields {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Returns the first required field that is absent or blank in `mapping`.
    pub fn first_missing<'a>(&'a self, mapping: &FieldMapping) -> Option<&'a str> {
        self.0
            .iter()
            .find(|name| mapping.get(name).map_or(true, FieldValue::is_blank))
            .map(String::as_str)
    }

    pub fn is_satisfied_by(&self, mapping: &FieldMapping) -> bool {
        self.first_missing(mapping).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_names_keep_first_position_and_last_value() {
        let mapping: FieldMapping = [("Name", "a"), ("Address", "b"), ("Name", "c")]
            .into_iter()
            .collect();
        assert_eq!(mapping.names().collect::<Vec<_>>(), vec!["Name", "Address"]);
        assert_eq!(mapping.get("Name"), Some(&FieldValue::from("c")));
    }

    #[test]
    fn default_policy_requires_name_and_address() {
        let policy = RequiredFields::default();

        let both: FieldMapping = [("Name", "Bob"), ("Address", "X")].into_iter().collect();
        assert!(policy.is_satisfied_by(&both));

        let no_address: FieldMapping = [("Name", "Bob"), ("Address", "")].into_iter().collect();
        assert_eq!(policy.first_missing(&no_address), Some("Address"));

        let no_name: FieldMapping = [("Name", ""), ("Address", "X")].into_iter().collect();
        assert_eq!(policy.first_missing(&no_name), Some("Name"));

        let mut absent = FieldMapping::new();
        absent.insert("Address", "X");
        assert_eq!(policy.first_missing(&absent), Some("Name"));
    }

    #[test]
    fn empty_policy_accepts_everything() {
        let policy = RequiredFields::new(Vec::<String>::new());
        assert!(policy.is_satisfied_by(&FieldMapping::new()));
    }
}
