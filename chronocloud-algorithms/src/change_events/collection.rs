use std::{collections::HashMap, iter::FromIterator};

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::{
    event::ChangeEvent,
    features::FeatureTable,
    rules::{Rule, RuleSet},
};

/// Set of change events with unique ids, iterated in insertion order. Serializes as a plain list of events
#[derive(Debug, Clone, Default)]
pub struct ChangeEventCollection {
    events: Vec<ChangeEvent>,
    index_by_id: HashMap<Uuid, usize>,
}

impl ChangeEventCollection {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeEvent> {
        self.events.iter()
    }

    pub fn contains(&self, object_id: &Uuid) -> bool {
        self.index_by_id.contains_key(object_id)
    }

    pub fn get(&self, object_id: &Uuid) -> Option<&ChangeEvent> {
        self.index_by_id
            .get(object_id)
            .map(|index| &self.events[*index])
    }

    /// Adds the event unless an event with the same id is already part of the collection. Returns whether the
    /// event was added
    pub fn add(&mut self, event: ChangeEvent) -> bool {
        if self.index_by_id.contains_key(&event.object_id()) {
            return false;
        }
        self.index_by_id.insert(event.object_id(), self.events.len());
        self.events.push(event);
        true
    }

    /// Adds all events with ids not yet present. Returns the number of events added
    pub fn extend<I: IntoIterator<Item = ChangeEvent>>(&mut self, events: I) -> usize {
        events
            .into_iter()
            .map(|event| self.add(event))
            .filter(|added| *added)
            .count()
    }

    /// Adds all events of `other` with ids not yet present. Merging the same collection twice has no effect
    pub fn merge(&mut self, other: ChangeEventCollection) -> usize {
        let added = self.extend(other.events);
        debug!("Merged {} new change events, {} in total", added, self.len());
        added
    }

    /// Sets the label of the event with the given id. Returns `false` if there is no such event
    pub fn set_event_type<S: Into<String>>(&mut self, object_id: &Uuid, event_type: S) -> bool {
        match self.index_by_id.get(object_id) {
            Some(index) => {
                self.events[*index].set_event_type(event_type);
                true
            }
            None => false,
        }
    }

    /// One feature table per event, in collection order
    pub fn feature_table(&self) -> Vec<FeatureTable> {
        self.events.iter().map(FeatureTable::from_event).collect()
    }

    /// New collection with the events that match `rule`
    pub fn filter(&self, rule: &Rule) -> ChangeEventCollection {
        self.events
            .iter()
            .filter(|event| rule.matches(&FeatureTable::from_event(event)))
            .cloned()
            .collect()
    }

    /// Labels every event with the first matching rule of `rules`. Events without a matching rule keep their
    /// label. Returns the number of events that were labelled
    pub fn classify(&mut self, rules: &RuleSet) -> usize {
        let mut labelled = 0;
        for event in self.events.iter_mut() {
            let features = FeatureTable::from_event(event);
            if let Some(label) = rules.classify(&features) {
                event.set_event_type(label);
                labelled += 1;
            }
        }
        debug!(
            "Classified {} of {} change events",
            labelled,
            self.events.len()
        );
        labelled
    }
}

impl FromIterator<ChangeEvent> for ChangeEventCollection {
    fn from_iter<T: IntoIterator<Item = ChangeEvent>>(iter: T) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<'a> IntoIterator for &'a ChangeEventCollection {
    type Item = &'a ChangeEvent;
    type IntoIter = std::slice::Iter<'a, ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl IntoIterator for ChangeEventCollection {
    type Item = ChangeEvent;
    type IntoIter = std::vec::IntoIter<ChangeEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl Serialize for ChangeEventCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.events.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChangeEventCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<ChangeEvent>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}
