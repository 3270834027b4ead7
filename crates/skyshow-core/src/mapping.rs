//! Slot → vehicle mapping of a mission.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::collection::OrderedCollection;
use crate::error::{EngineError, Result};
use crate::models::Vehicle;

/// Ordered binding from mission slots to vehicle identifiers.
///
/// Entry `i` holds the vehicle flying slot `i`, or `None` if the slot is
/// empty. A vehicle identifier never appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct Mapping(Vec<Option<String>>);

impl Mapping {
    /// Mapping of `len` empty slots.
    pub fn empty(len: usize) -> Self {
        Self(vec![None; len])
    }

    /// Wrap raw entries, rejecting duplicate vehicle identifiers.
    pub fn from_entries(entries: Vec<Option<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for id in entries.iter().flatten() {
            if !seen.insert(id.as_str()) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "vehicle {} is mapped to more than one slot",
                    id
                )));
            }
        }
        Ok(Self(entries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|entry| entry.as_deref())
    }

    pub fn entries(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<Option<String>> {
        self.0
    }

    /// Indices of slots without a vehicle.
    pub fn empty_slots(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.0.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn assigned_ids(&self) -> HashSet<&str> {
        self.0.iter().flatten().map(String::as_str).collect()
    }

    pub fn slot_of(&self, vehicle_id: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|entry| entry.as_deref() == Some(vehicle_id))
    }

    /// Vehicles of the snapshot that are not bound to any slot, in snapshot
    /// order.
    pub fn spare_ids(&self, vehicles: &OrderedCollection<Vehicle>) -> Vec<String> {
        let assigned = self.assigned_ids();
        vehicles
            .ids()
            .iter()
            .filter(|id| !assigned.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Mapped vehicles that are absent from the snapshot, in slot order.
    pub fn missing_ids(&self, vehicles: &OrderedCollection<Vehicle>) -> Vec<String> {
        self.0
            .iter()
            .flatten()
            .filter(|id| !vehicles.contains(id))
            .cloned()
            .collect()
    }

    /// Whether every entry refers to a vehicle of the snapshot and no
    /// identifier repeats.
    pub fn is_valid_for(&self, vehicles: &OrderedCollection<Vehicle>) -> bool {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .flatten()
            .all(|id| vehicles.contains(id) && seen.insert(id.as_str()))
    }

    /// Bind `vehicle_id` to `slot`. If the vehicle was bound elsewhere that
    /// slot is emptied. Returns the vehicle previously in `slot`.
    pub fn assign(&mut self, slot: usize, vehicle_id: impl Into<String>) -> Result<Option<String>> {
        self.check_slot(slot)?;
        let vehicle_id = vehicle_id.into();
        if let Some(existing) = self.slot_of(&vehicle_id) {
            if existing == slot {
                return Ok(Some(vehicle_id));
            }
            self.0[existing] = None;
        }
        Ok(self.0[slot].replace(vehicle_id))
    }

    pub fn clear_slot(&mut self, slot: usize) -> Result<Option<String>> {
        self.check_slot(slot)?;
        Ok(self.0[slot].take())
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_slot(a)?;
        self.check_slot(b)?;
        self.0.swap(a, b);
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.0.iter_mut().for_each(|entry| *entry = None);
    }

    /// Empty every slot whose vehicle is absent from the snapshot. Returns the
    /// indices that were cleared.
    pub fn remove_missing(&mut self, vehicles: &OrderedCollection<Vehicle>) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (index, entry) in self.0.iter_mut().enumerate() {
            let missing = entry
                .as_ref()
                .map(|id| !vehicles.contains(id))
                .unwrap_or(false);
            if missing {
                *entry = None;
                cleared.push(index);
            }
        }
        cleared
    }

    pub(crate) fn set(&mut self, slot: usize, vehicle_id: String) {
        self.0[slot] = Some(vehicle_id);
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot < self.0.len() {
            Ok(())
        } else {
            Err(EngineError::SlotOutOfRange {
                index: slot,
                len: self.0.len(),
            })
        }
    }
}

impl TryFrom<Vec<Option<String>>> for Mapping {
    type Error = EngineError;

    fn try_from(entries: Vec<Option<String>>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<Mapping> for Vec<Option<String>> {
    fn from(mapping: Mapping) -> Self {
        mapping.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn entries(ids: &[Option<&str>]) -> Vec<Option<String>> {
        ids.iter().map(|id| id.map(str::to_string)).collect()
    }

    fn fleet(ids: &[&str]) -> OrderedCollection<Vehicle> {
        OrderedCollection::from_items(
            ids.iter()
                .map(|id| Vehicle::new(*id, Position::default())),
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_vehicles() {
        let result = Mapping::from_entries(entries(&[Some("a"), None, Some("a")]));
        assert!(matches!(result, Err(EngineError::InvalidSnapshot(_))));
    }

    #[test]
    fn assign_moves_vehicle_between_slots() {
        let mut mapping = Mapping::from_entries(entries(&[Some("a"), Some("b"), None])).unwrap();

        let previous = mapping.assign(2, "a").unwrap();
        assert_eq!(previous, None);
        assert_eq!(mapping.entries(), entries(&[None, Some("b"), Some("a")]).as_slice());

        let previous = mapping.assign(1, "c").unwrap();
        assert_eq!(previous.as_deref(), Some("b"));
        assert_eq!(mapping.slot_of("c"), Some(1));
    }

    #[test]
    fn out_of_range_slots_are_rejected() {
        let mut mapping = Mapping::empty(2);
        assert_eq!(
            mapping.assign(5, "a"),
            Err(EngineError::SlotOutOfRange { index: 5, len: 2 })
        );
        assert!(mapping.swap(0, 2).is_err());
        assert!(mapping.clear_slot(9).is_err());
    }

    #[test]
    fn spare_and_missing_ids() {
        let mapping = Mapping::from_entries(entries(&[Some("a"), Some("ghost"), None])).unwrap();
        let vehicles = fleet(&["c", "a", "b"]);

        assert_eq!(mapping.spare_ids(&vehicles), vec!["c", "b"]);
        assert_eq!(mapping.missing_ids(&vehicles), vec!["ghost"]);
        assert!(!mapping.is_valid_for(&vehicles));
    }

    #[test]
    fn remove_missing_clears_only_vanished_vehicles() {
        let mut mapping =
            Mapping::from_entries(entries(&[Some("a"), Some("ghost"), None, Some("b")])).unwrap();
        let cleared = mapping.remove_missing(&fleet(&["a", "b"]));

        assert_eq!(cleared, vec![1]);
        assert_eq!(mapping.empty_slots(), vec![1, 2]);
        assert_eq!(mapping.filled_count(), 2);
    }

    #[test]
    fn swap_and_clear_all() {
        let mut mapping = Mapping::from_entries(entries(&[Some("a"), None, Some("b")])).unwrap();
        mapping.swap(0, 1).unwrap();
        assert_eq!(mapping.get(1), Some("a"));
        assert_eq!(mapping.get(0), None);

        mapping.clear_all();
        assert_eq!(mapping, Mapping::empty(3));
    }

    #[test]
    fn serializes_as_plain_array() {
        let mapping = Mapping::from_entries(entries(&[Some("a"), None])).unwrap();
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"["a",null]"#);

        let duplicate: std::result::Result<Mapping, _> = serde_json::from_str(r#"["a","a"]"#);
        assert!(duplicate.is_err());
    }
}
