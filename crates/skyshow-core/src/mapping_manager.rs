//! Full recalculation and incremental augmentation of the mission mapping.
//!
//! Both operations take immutable snapshots and return a fresh mapping; the
//! caller decides whether to store it. Nothing is written on failure.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::collection::OrderedCollection;
use crate::cost_matrix::CostMatrixBuilder;
use crate::error::{EngineError, Result};
use crate::mapping::Mapping;
use crate::models::{ensure_finite, MissionSlot, Vehicle};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Whether vehicles reported as lost may still receive new slots
    pub assign_lost_vehicles: bool,
}

/// Result of a mapping computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    pub mapping: Mapping,
    /// Entries written by this call (pinned bindings included)
    pub assigned: usize,
    /// Summed distance of the bindings chosen by the solver
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MappingManager {
    config: MappingConfig,
}

/// Work left over once pinned slots are taken care of.
struct Plan<'a> {
    pinned_fills: Vec<(usize, String)>,
    open_slots: Vec<&'a MissionSlot>,
    candidates: Vec<&'a Vehicle>,
}

impl MappingManager {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Compute a mapping from scratch. Only pinned bindings survive.
    ///
    /// Vehicles beyond the number of targeted slots stay spare; targeted slots
    /// beyond the number of vehicles stay empty.
    pub fn recalculate(
        &self,
        vehicles: &OrderedCollection<Vehicle>,
        slots: &OrderedCollection<MissionSlot>,
    ) -> Result<MappingOutcome> {
        validate_snapshot(vehicles, slots)?;

        let pinned: HashSet<&str> = slots.iter().filter_map(|s| s.pinned.as_deref()).collect();

        let pinned_fills: Vec<(usize, String)> = slots
            .iter()
            .filter_map(|slot| {
                let id = slot.pinned.as_ref()?;
                vehicles.contains(id).then(|| (slot.index, id.clone()))
            })
            .collect();
        let open_slots: Vec<&MissionSlot> = slots
            .iter()
            .filter(|slot| slot.pinned.is_none() && slot.target.is_some())
            .collect();
        let candidates: Vec<&Vehicle> = vehicles
            .iter()
            .filter(|v| !pinned.contains(v.id.as_str()) && self.is_candidate(v))
            .collect();

        let outcome = self.solve_into(
            Mapping::empty(slots.len()),
            Plan {
                pinned_fills,
                open_slots,
                candidates,
            },
        )?;

        tracing::debug!(
            "Recalculated mapping: {}/{} slots filled, {} vehicles, cost {:.1}",
            outcome.mapping.filled_count(),
            slots.len(),
            vehicles.len(),
            outcome.total_cost
        );
        Ok(outcome)
    }

    /// Fill empty slots with spare vehicles without touching any slot that is
    /// already bound.
    pub fn augment_from_spares(
        &self,
        current: &Mapping,
        vehicles: &OrderedCollection<Vehicle>,
        slots: &OrderedCollection<MissionSlot>,
    ) -> Result<MappingOutcome> {
        check_length(current, slots)?;
        validate_snapshot(vehicles, slots)?;

        let plan = self.plan_augmentation(current, vehicles, slots);
        let outcome = self.solve_into(current.clone(), plan)?;

        tracing::debug!(
            "Augmented mapping with {} spare(s): {}/{} slots filled",
            outcome.assigned,
            outcome.mapping.filled_count(),
            slots.len()
        );
        Ok(outcome)
    }

    /// Whether [`augment_from_spares`](Self::augment_from_spares) would bind at
    /// least one vehicle.
    pub fn can_augment(
        &self,
        current: &Mapping,
        vehicles: &OrderedCollection<Vehicle>,
        slots: &OrderedCollection<MissionSlot>,
    ) -> Result<bool> {
        check_length(current, slots)?;
        let plan = self.plan_augmentation(current, vehicles, slots);
        Ok(!plan.pinned_fills.is_empty()
            || (!plan.open_slots.is_empty() && !plan.candidates.is_empty()))
    }

    fn is_candidate(&self, vehicle: &Vehicle) -> bool {
        self.config.assign_lost_vehicles || vehicle.status.is_assignable()
    }

    fn plan_augmentation<'a>(
        &self,
        current: &Mapping,
        vehicles: &'a OrderedCollection<Vehicle>,
        slots: &'a OrderedCollection<MissionSlot>,
    ) -> Plan<'a> {
        let assigned = current.assigned_ids();
        let pinned: HashSet<&str> = slots.iter().filter_map(|s| s.pinned.as_deref()).collect();
        let is_spare = |id: &str| vehicles.contains(&id.to_string()) && !assigned.contains(id);

        let mut pinned_fills = Vec::new();
        let mut open_slots = Vec::new();
        for slot in slots.iter() {
            if current.get(slot.index).is_some() {
                continue;
            }
            match &slot.pinned {
                Some(id) if is_spare(id) => pinned_fills.push((slot.index, id.clone())),
                Some(_) => {}
                None if slot.target.is_some() => open_slots.push(slot),
                None => {}
            }
        }

        let candidates = vehicles
            .iter()
            .filter(|v| {
                !assigned.contains(v.id.as_str())
                    && !pinned.contains(v.id.as_str())
                    && self.is_candidate(v)
            })
            .collect();

        Plan {
            pinned_fills,
            open_slots,
            candidates,
        }
    }

    fn solve_into(&self, mut mapping: Mapping, plan: Plan<'_>) -> Result<MappingOutcome> {
        let mut assigned = 0;
        for (slot, id) in plan.pinned_fills {
            mapping.set(slot, id);
            assigned += 1;
        }

        let matrix = CostMatrixBuilder::default().build(&plan.open_slots, &plan.candidates);
        let solution = matrix.solve()?;
        for &(row, col) in &solution.pairs {
            mapping.set(matrix.slot_indices[row], matrix.vehicle_ids[col].clone());
            assigned += 1;
        }

        Ok(MappingOutcome {
            mapping,
            assigned,
            total_cost: solution.total_cost,
        })
    }
}

fn check_length(current: &Mapping, slots: &OrderedCollection<MissionSlot>) -> Result<()> {
    if current.len() != slots.len() {
        return Err(EngineError::InvalidMappingLength {
            expected: slots.len(),
            actual: current.len(),
        });
    }
    Ok(())
}

/// Enforce the input contract: slots are indexed 0..N-1 in order, all
/// coordinates are finite and no vehicle is pinned to two slots.
fn validate_snapshot(
    vehicles: &OrderedCollection<Vehicle>,
    slots: &OrderedCollection<MissionSlot>,
) -> Result<()> {
    for vehicle in vehicles.iter() {
        ensure_finite(&vehicle.position, &format!("vehicle {}", vehicle.id))?;
    }

    let mut pinned = HashSet::new();
    for (position, slot) in slots.iter().enumerate() {
        if slot.index != position {
            return Err(EngineError::InvalidSnapshot(format!(
                "slot at position {} has index {}",
                position, slot.index
            )));
        }
        if let Some(target) = &slot.target {
            ensure_finite(target, &format!("slot {}", slot.index))?;
        }
        if let Some(id) = &slot.pinned {
            if !pinned.insert(id.as_str()) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "vehicle {} is pinned to more than one slot",
                    id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, VehicleStatus};

    fn vehicles(points: &[(&str, f64, f64)]) -> OrderedCollection<Vehicle> {
        OrderedCollection::from_items(
            points
                .iter()
                .map(|(id, x, y)| Vehicle::new(*id, Position::flat(*x, *y))),
        )
        .unwrap()
    }

    fn slots(points: &[(f64, f64)]) -> OrderedCollection<MissionSlot> {
        OrderedCollection::from_items(
            points
                .iter()
                .enumerate()
                .map(|(index, (x, y))| MissionSlot::new(index, Position::flat(*x, *y))),
        )
        .unwrap()
    }

    fn mapping(ids: &[Option<&str>]) -> Mapping {
        Mapping::from_entries(ids.iter().map(|id| id.map(str::to_string)).collect()).unwrap()
    }

    #[test]
    fn recalculate_binds_coincident_vehicles() {
        let fleet = vehicles(&[("v2", 0.0, 10.0), ("v0", 0.0, 0.0), ("v1", 10.0, 0.0)]);
        let show = slots(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);

        let outcome = MappingManager::default().recalculate(&fleet, &show).unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("v0"), Some("v1"), Some("v2")]));
        assert_eq!(outcome.total_cost, 0.0);
        assert_eq!(outcome.assigned, 3);
    }

    #[test]
    fn recalculate_leaves_surplus_as_spares_or_empty_slots() {
        let manager = MappingManager::default();

        let fleet = vehicles(&[("a", 0.0, 0.0), ("b", 100.0, 0.0), ("c", 1.0, 0.0)]);
        let outcome = manager.recalculate(&fleet, &slots(&[(0.0, 0.0), (2.0, 0.0)])).unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("a"), Some("c")]));
        assert_eq!(outcome.mapping.spare_ids(&fleet), vec!["b"]);

        let small = vehicles(&[("a", 5.0, 0.0)]);
        let outcome = manager
            .recalculate(&small, &slots(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]))
            .unwrap();
        assert_eq!(outcome.mapping, mapping(&[None, Some("a"), None]));
    }

    #[test]
    fn recalculate_keeps_pinned_slots() {
        let fleet = vehicles(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]);
        let mut show = slots(&[(0.0, 0.0), (10.0, 0.0)]);
        // Pin the far vehicle to slot 0; the other slot gets what is left.
        show.insert_at_end(MissionSlot::new(0, Position::flat(0.0, 0.0)).pinned_to("b"));

        let outcome = MappingManager::default().recalculate(&fleet, &show).unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("b"), Some("a")]));
    }

    #[test]
    fn pinned_vehicle_absent_from_snapshot_leaves_slot_empty() {
        let fleet = vehicles(&[("a", 0.0, 0.0)]);
        let mut show = slots(&[(0.0, 0.0), (10.0, 0.0)]);
        show.insert_at_end(MissionSlot::new(0, Position::flat(0.0, 0.0)).pinned_to("gone"));

        let outcome = MappingManager::default().recalculate(&fleet, &show).unwrap();
        assert_eq!(outcome.mapping, mapping(&[None, Some("a")]));
    }

    #[test]
    fn untargeted_slots_and_lost_vehicles_are_skipped() {
        let fleet = OrderedCollection::from_items(vec![
            Vehicle::new("lost", Position::flat(0.0, 0.0)).with_status(VehicleStatus::Lost),
            Vehicle::new("ok", Position::flat(50.0, 0.0)),
        ])
        .unwrap();
        let show = OrderedCollection::from_items(vec![
            MissionSlot::new(0, Position::flat(0.0, 0.0)),
            MissionSlot::untargeted(1),
        ])
        .unwrap();

        let outcome = MappingManager::default().recalculate(&fleet, &show).unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("ok"), None]));

        let permissive = MappingManager::new(MappingConfig {
            assign_lost_vehicles: true,
        });
        let outcome = permissive.recalculate(&fleet, &show).unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("lost"), None]));
    }

    #[test]
    fn recalculate_is_deterministic() {
        let fleet = vehicles(&[
            ("a", 1.0, 1.0),
            ("b", 1.0, 1.0),
            ("c", 4.0, 2.0),
            ("d", -3.0, 7.0),
        ]);
        let show = slots(&[(0.0, 0.0), (2.0, 2.0), (5.0, 5.0)]);
        let manager = MappingManager::default();
        assert_eq!(
            manager.recalculate(&fleet, &show).unwrap(),
            manager.recalculate(&fleet, &show).unwrap()
        );
    }

    #[test]
    fn augment_fills_empty_slots_only() {
        let fleet = vehicles(&[
            ("a", 0.0, 0.0),
            ("b", 10.0, 0.0),
            ("s1", 21.0, 0.0),
            ("s2", 39.0, 0.0),
            ("s3", 31.0, 0.0),
        ]);
        let show = slots(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0), (40.0, 0.0)]);
        // The filled slots deliberately hold sub-optimal bindings.
        let current = mapping(&[Some("b"), Some("a"), None, None, None]);

        let manager = MappingManager::default();
        assert!(manager.can_augment(&current, &fleet, &show).unwrap());

        let outcome = manager.augment_from_spares(&current, &fleet, &show).unwrap();
        assert_eq!(
            outcome.mapping,
            mapping(&[Some("b"), Some("a"), Some("s1"), Some("s3"), Some("s2")])
        );
        assert_eq!(outcome.assigned, 3);
        assert!((outcome.total_cost - 3.0).abs() < 1e-9);
        assert!(!manager.can_augment(&outcome.mapping, &fleet, &show).unwrap());
    }

    #[test]
    fn augment_keeps_entries_for_vanished_vehicles() {
        let fleet = vehicles(&[("spare", 0.0, 0.0)]);
        let show = slots(&[(0.0, 0.0), (1.0, 0.0)]);
        let current = mapping(&[Some("ghost"), None]);

        let outcome = MappingManager::default()
            .augment_from_spares(&current, &fleet, &show)
            .unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("ghost"), Some("spare")]));
    }

    #[test]
    fn augment_restores_pinned_vehicle() {
        let fleet = vehicles(&[("p", 100.0, 0.0), ("q", 0.0, 0.0)]);
        let mut show = slots(&[(0.0, 0.0), (1.0, 0.0)]);
        show.insert_at_end(MissionSlot::new(0, Position::flat(0.0, 0.0)).pinned_to("p"));

        let outcome = MappingManager::default()
            .augment_from_spares(&Mapping::empty(2), &fleet, &show)
            .unwrap();
        assert_eq!(outcome.mapping, mapping(&[Some("p"), Some("q")]));
    }

    #[test]
    fn cannot_augment_without_spares_or_empty_slots() {
        let manager = MappingManager::default();
        let fleet = vehicles(&[("a", 0.0, 0.0)]);
        let show = slots(&[(0.0, 0.0), (1.0, 0.0)]);

        assert!(!manager
            .can_augment(&mapping(&[Some("a"), None]), &fleet, &show)
            .unwrap());

        let two = vehicles(&[("a", 0.0, 0.0), ("b", 1.0, 0.0)]);
        assert!(!manager
            .can_augment(&mapping(&[Some("a"), Some("b")]), &two, &show)
            .unwrap());
    }

    #[test]
    fn mapping_length_must_match_slots() {
        let manager = MappingManager::default();
        let fleet = vehicles(&[("a", 0.0, 0.0)]);
        let show = slots(&[(0.0, 0.0), (1.0, 0.0)]);
        let short = Mapping::empty(1);

        let expected = EngineError::InvalidMappingLength {
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            manager.augment_from_spares(&short, &fleet, &show),
            Err(expected.clone())
        );
        assert_eq!(manager.can_augment(&short, &fleet, &show), Err(expected));
    }

    #[test]
    fn rejects_invalid_snapshots() {
        let manager = MappingManager::default();
        let fleet = vehicles(&[("a", 0.0, 0.0)]);

        let gapped = OrderedCollection::from_items(vec![
            MissionSlot::new(0, Position::flat(0.0, 0.0)),
            MissionSlot::new(2, Position::flat(1.0, 0.0)),
        ])
        .unwrap();
        assert!(matches!(
            manager.recalculate(&fleet, &gapped),
            Err(EngineError::InvalidSnapshot(_))
        ));

        let double_pin = OrderedCollection::from_items(vec![
            MissionSlot::new(0, Position::flat(0.0, 0.0)).pinned_to("a"),
            MissionSlot::new(1, Position::flat(1.0, 0.0)).pinned_to("a"),
        ])
        .unwrap();
        assert!(matches!(
            manager.recalculate(&fleet, &double_pin),
            Err(EngineError::InvalidSnapshot(_))
        ));

        let nan = vehicles(&[("a", f64::NAN, 0.0)]);
        assert!(matches!(
            manager.recalculate(&nan, &slots(&[(0.0, 0.0)])),
            Err(EngineError::InvalidSnapshot(_))
        ));
    }
}
