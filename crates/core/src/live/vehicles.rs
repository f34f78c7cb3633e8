use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use roadview_protocol::Point;

use crate::model::{VehicleEntity, VehicleKind};

/// One published set of vehicles. Never mutated after publication.
#[derive(Debug, Clone, Default)]
pub struct VehicleGeneration {
    /// Increments on every `replace`/`clear`; 0 for the initial empty set.
    pub generation: u64,
    /// Sorted by id for stable draw order.
    pub vehicles: Vec<VehicleEntity>,
}

impl VehicleGeneration {
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn count_by_kind(&self, kind: VehicleKind) -> usize {
        self.vehicles.iter().filter(|v| v.kind == kind).count()
    }
}

/// Cross-thread vehicle set: one producer replaces it wholesale, the render
/// loop reads whichever generation was published last.
#[derive(Debug, Default)]
pub struct LiveVehicleState {
    current: RwLock<Arc<VehicleGeneration>>,
    counter: AtomicU64,
}

impl LiveVehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new generation built from the producer's three maps.
    ///
    /// Vehicles without a type are cars; vehicles without a speed are
    /// stationary. Non-finite positions are dropped and negative speeds
    /// clamp to zero.
    pub fn replace(
        &self,
        positions: &HashMap<String, Point>,
        types: &HashMap<String, String>,
        speeds: &HashMap<String, f64>,
    ) -> u64 {
        let mut vehicles: Vec<VehicleEntity> = positions
            .iter()
            .filter(|(_, p)| p.is_finite())
            .map(|(id, position)| VehicleEntity {
                id: id.clone(),
                position: *position,
                kind: types
                    .get(id)
                    .map_or(VehicleKind::Car, |t| VehicleKind::from_type_str(t)),
                speed: speeds
                    .get(id)
                    .copied()
                    .filter(|s| s.is_finite())
                    .unwrap_or(0.0)
                    .max(0.0),
            })
            .collect();
        vehicles.sort_by(|a, b| a.id.cmp(&b.id));
        self.publish(vehicles)
    }

    /// Publish an empty generation.
    pub fn clear(&self) -> u64 {
        self.publish(Vec::new())
    }

    /// The generation published most recently.
    pub fn snapshot(&self) -> Arc<VehicleGeneration> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn publish(&self, vehicles: Vec<VehicleEntity>) -> u64 {
        let generation = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let next = Arc::new(VehicleGeneration {
            generation,
            vehicles,
        });
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        // A slower producer must not overwrite a newer generation.
        if guard.generation < generation {
            *guard = next;
        }
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn maps(n: usize, kind: &str, speed: f64) -> (HashMap<String, Point>, HashMap<String, String>, HashMap<String, f64>) {
        let mut positions = HashMap::new();
        let mut types = HashMap::new();
        let mut speeds = HashMap::new();
        for i in 0..n {
            let id = format!("v{i:03}");
            positions.insert(id.clone(), Point::new(i as f64, 0.0));
            types.insert(id.clone(), kind.to_string());
            speeds.insert(id, speed);
        }
        (positions, types, speeds)
    }

    #[test]
    fn missing_auxiliary_fields_use_defaults() {
        let state = LiveVehicleState::new();
        let mut positions = HashMap::new();
        positions.insert("a".to_string(), Point::new(1.0, 2.0));
        positions.insert("b".to_string(), Point::new(3.0, 4.0));
        let mut types = HashMap::new();
        types.insert("b".to_string(), "Bus".to_string());
        let mut speeds = HashMap::new();
        speeds.insert("b".to_string(), -4.0);

        state.replace(&positions, &types, &speeds);
        let snap = state.snapshot();
        assert_eq!(snap.vehicles[0].id, "a");
        assert_eq!(snap.vehicles[0].kind, VehicleKind::Car);
        assert_eq!(snap.vehicles[0].speed, 0.0);
        assert_eq!(snap.vehicles[1].kind, VehicleKind::Bus);
        assert_eq!(snap.vehicles[1].speed, 0.0);
    }

    #[test]
    fn replace_is_wholesale_and_sorted() {
        let state = LiveVehicleState::new();
        let (p, t, s) = maps(5, "truck", 3.0);
        assert_eq!(state.replace(&p, &t, &s), 1);
        let (p, t, s) = maps(2, "car", 1.0);
        assert_eq!(state.replace(&p, &t, &s), 2);

        let snap = state.snapshot();
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.count_by_kind(VehicleKind::Car), 2);
        let ids: Vec<&str> = snap.vehicles.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v000", "v001"]);
    }

    #[test]
    fn clear_publishes_empty_generation() {
        let state = LiveVehicleState::new();
        let (p, t, s) = maps(3, "car", 1.0);
        state.replace(&p, &t, &s);
        let held = state.snapshot();
        state.clear();
        assert!(state.snapshot().is_empty());
        // Readers holding the old generation keep it.
        assert_eq!(held.len(), 3);
    }

    #[test]
    fn readers_never_see_mixed_generations() {
        let state = Arc::new(LiveVehicleState::new());
        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for round in 0..200 {
                    let (kind, n) = if round % 2 == 0 { ("car", 10) } else { ("truck", 20) };
                    let (p, t, s) = maps(n, kind, round as f64);
                    state.replace(&p, &t, &s);
                }
            })
        };

        let mut last = 0;
        for _ in 0..500 {
            let snap = state.snapshot();
            assert!(snap.generation >= last);
            last = snap.generation;
            if snap.generation == 0 {
                continue;
            }
            // Every vehicle in one generation shares kind, speed and count.
            let first = &snap.vehicles[0];
            let expected = if first.kind == VehicleKind::Car { 10 } else { 20 };
            assert_eq!(snap.len(), expected);
            assert!(snap
                .vehicles
                .iter()
                .all(|v| v.kind == first.kind && v.speed == first.speed));
        }
        writer.join().unwrap();
    }
}
