use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::spec::step::StepKey;

/// Shared in-memory form data: one payload per step key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormData(BTreeMap<StepKey, Value>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: StepKey) -> Option<&Value> {
        self.0.get(&key)
    }

    pub fn insert(&mut self, key: StepKey, payload: Value) -> Option<Value> {
        self.0.insert(key, payload)
    }

    pub fn keys(&self) -> impl Iterator<Item = StepKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StepKey, &Value)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the payload under `key` carries anything: a non-empty object
    /// or array, a non-empty string, or any other non-null scalar.
    pub fn has_data(&self, key: StepKey) -> bool {
        self.get(key).is_some_and(value_has_data)
    }

    /// Builds form data from a wire object. Unknown keys are ignored; when
    /// both a current and a legacy `paso_N` name are present the current one wins.
    pub fn from_wire_map(map: &Map<String, Value>) -> Self {
        let mut data = FormData::new();
        let mut from_current = BTreeMap::new();
        for (name, value) in map {
            let Some(key) = StepKey::from_wire(name) else {
                continue;
            };
            let legacy = StepKey::is_legacy_name(name);
            if legacy && from_current.get(&key) == Some(&true) {
                continue;
            }
            data.insert(key, value.clone());
            from_current.insert(key, !legacy);
        }
        data
    }

    pub fn from_wire_value(value: &Value) -> Self {
        value.as_object().map(Self::from_wire_map).unwrap_or_default()
    }

    /// Copies every key present in `other`, leaving the rest untouched.
    pub fn merge_from(&mut self, other: &FormData) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key.wire_name(), value)?;
        }
        map.end()
    }
}

impl FromIterator<(StepKey, Value)> for FormData {
    fn from_iter<I: IntoIterator<Item = (StepKey, Value)>>(iter: I) -> Self {
        FormData(iter.into_iter().collect())
    }
}

pub(crate) fn value_has_data(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
