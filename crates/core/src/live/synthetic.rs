//! Deterministic stand-in for the external simulation connection.
//!
//! Vehicles drive along lane polylines with a free-road acceleration model
//! and stop at lane ends while a per-lane signal cycle is red. The producer
//! thread publishes a new vehicle generation and one trend sample per tick.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use roadview_protocol::Point;
use tracing::{debug, info, warn};

use super::{LiveVehicleState, TrendSeriesBuffer};
use crate::model::{LaneGeometry, NetworkSnapshot};

const MAX_ACCELERATION: f64 = 2.0;
const BRAKING: f64 = 4.5;
const SIGNAL_CYCLE_SEC: f64 = 40.0;
/// Distance before a lane end at which vehicles stop for red.
const STOP_ZONE_M: f64 = 12.0;
const STOPPED_SPEED: f64 = 0.1;

#[derive(Debug, Clone)]
struct SimVehicle {
    id: String,
    type_name: &'static str,
    lane: usize,
    distance: f64,
    speed: f64,
    speed_limit: f64,
    waiting_sec: f64,
}

/// A small traffic model over the lanes of one network.
#[derive(Debug, Clone)]
pub struct SyntheticTraffic {
    lanes: Vec<LaneGeometry>,
    vehicles: Vec<SimVehicle>,
    elapsed_sec: f64,
    completed: u64,
}

impl SyntheticTraffic {
    /// Seed `count` vehicles spread over the non-internal lanes.
    pub fn new(network: &NetworkSnapshot, count: usize) -> Self {
        let lanes: Vec<LaneGeometry> = network
            .lanes
            .iter()
            .filter(|lane| !lane.internal && lane.length() > 0.0)
            .cloned()
            .collect();

        let vehicles = if lanes.is_empty() {
            Vec::new()
        } else {
            (0..count)
                .map(|i| {
                    let lane = i % lanes.len();
                    let spread = (i / lanes.len()) as f64 * 0.37;
                    SimVehicle {
                        id: format!("veh{i}"),
                        type_name: type_for_index(i),
                        lane,
                        distance: lanes[lane].length() * spread.fract(),
                        speed: 0.0,
                        speed_limit: speed_limit_for_index(i),
                        waiting_sec: 0.0,
                    }
                })
                .collect()
        };

        Self {
            lanes,
            vehicles,
            elapsed_sec: 0.0,
            completed: 0,
        }
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Advance the model by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        if self.lanes.is_empty() || dt <= 0.0 {
            return;
        }
        self.elapsed_sec += dt;

        for vehicle in &mut self.vehicles {
            let lane_len = self.lanes[vehicle.lane].length();
            let remaining = lane_len - vehicle.distance;
            let red = signal_is_red(vehicle.lane, self.elapsed_sec);

            if red && remaining <= STOP_ZONE_M {
                vehicle.speed = (vehicle.speed - BRAKING * dt).max(0.0);
            } else {
                // Free-road term: full acceleration at rest, none at the limit.
                let ratio = vehicle.speed / vehicle.speed_limit;
                let acc = MAX_ACCELERATION * (1.0 - ratio.powi(4));
                vehicle.speed = (vehicle.speed + acc * dt).clamp(0.0, vehicle.speed_limit);
            }

            if vehicle.speed < STOPPED_SPEED {
                vehicle.waiting_sec += dt;
            } else {
                vehicle.waiting_sec = 0.0;
            }

            vehicle.distance += vehicle.speed * dt;
            if vehicle.distance >= lane_len {
                vehicle.distance -= lane_len;
                vehicle.lane = (vehicle.lane + 1) % self.lanes.len();
                let next_len = self.lanes[vehicle.lane].length();
                vehicle.distance = vehicle.distance.min(next_len);
                self.completed += 1;
            }
        }
    }

    /// Current positions, types and speeds keyed by vehicle id, in the shape
    /// a simulation connection delivers them.
    pub fn frame(
        &self,
    ) -> (
        HashMap<String, Point>,
        HashMap<String, String>,
        HashMap<String, f64>,
    ) {
        let mut positions = HashMap::with_capacity(self.vehicles.len());
        let mut types = HashMap::with_capacity(self.vehicles.len());
        let mut speeds = HashMap::with_capacity(self.vehicles.len());
        for vehicle in &self.vehicles {
            let Some((point, _)) = self.lanes[vehicle.lane].point_at(vehicle.distance) else {
                continue;
            };
            positions.insert(vehicle.id.clone(), point);
            types.insert(vehicle.id.clone(), vehicle.type_name.to_string());
            speeds.insert(vehicle.id.clone(), vehicle.speed);
        }
        (positions, types, speeds)
    }

    /// `(avg_wait_sec, throughput_per_hour, congestion_index)` for the
    /// current state.
    pub fn sample(&self) -> (f64, f64, f64) {
        if self.vehicles.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let n = self.vehicles.len() as f64;

        let waiting: Vec<f64> = self
            .vehicles
            .iter()
            .filter(|v| v.waiting_sec > 0.0)
            .map(|v| v.waiting_sec)
            .collect();
        let avg_wait = if waiting.is_empty() {
            0.0
        } else {
            waiting.iter().sum::<f64>() / waiting.len() as f64
        };

        let throughput = if self.elapsed_sec > 0.0 {
            self.completed as f64 / self.elapsed_sec * 3600.0
        } else {
            0.0
        };

        let relative_speed: f64 = self
            .vehicles
            .iter()
            .map(|v| v.speed / v.speed_limit)
            .sum::<f64>()
            / n;
        let congestion = (1.0 - relative_speed).clamp(0.0, 1.0);

        (avg_wait, throughput, congestion)
    }

    /// Publish the current frame and one trend sample.
    pub fn publish(&self, vehicles: &LiveVehicleState, trends: &TrendSeriesBuffer) {
        let (positions, types, speeds) = self.frame();
        vehicles.replace(&positions, &types, &speeds);
        let (wait, throughput, congestion) = self.sample();
        trends.add_sample(wait, throughput, congestion);
    }
}

fn type_for_index(i: usize) -> &'static str {
    match i % 10 {
        0..=5 => "car",
        6 | 7 => "truck",
        8 => "bus",
        _ => "motorcycle",
    }
}

fn speed_limit_for_index(i: usize) -> f64 {
    match type_for_index(i) {
        "truck" => 11.0,
        "bus" => 12.5,
        _ => 13.9 + (i % 4) as f64,
    }
}

fn signal_is_red(lane: usize, elapsed_sec: f64) -> bool {
    let phase = lane as f64 * 0.9;
    (elapsed_sec / SIGNAL_CYCLE_SEC * TAU + phase).sin() < 0.0
}

/// Running producer thread; stops on [`stop`](Self::stop) or drop.
#[derive(Debug)]
pub struct FeedHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("synthetic feed thread panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `traffic` on a background thread, stepping by `tick` and publishing
/// after every step.
pub fn spawn_feed(
    mut traffic: SyntheticTraffic,
    vehicles: Arc<LiveVehicleState>,
    trends: Arc<TrendSeriesBuffer>,
    tick: Duration,
) -> std::io::Result<FeedHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    info!(
        vehicles = traffic.vehicle_count(),
        tick_ms = tick.as_millis() as u64,
        "starting synthetic feed"
    );

    let thread = thread::Builder::new()
        .name("synthetic-feed".into())
        .spawn(move || {
            let dt = tick.as_secs_f64();
            let mut ticks: u64 = 0;
            while !thread_stop.load(Ordering::Relaxed) {
                traffic.step(dt);
                traffic.publish(&vehicles, &trends);
                ticks += 1;
                if ticks % 100 == 0 {
                    debug!(ticks, "synthetic feed progress");
                }
                thread::sleep(tick);
            }
            vehicles.clear();
            debug!(ticks, "synthetic feed stopped");
        })?;

    Ok(FeedHandle {
        stop,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleKind;

    fn network() -> NetworkSnapshot {
        let mut net = NetworkSnapshot::empty();
        net.lanes = vec![
            LaneGeometry {
                edge_id: "e1".into(),
                lane_index: 0,
                internal: false,
                width_meters: 3.2,
                points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            },
            LaneGeometry {
                edge_id: ":j_0".into(),
                lane_index: 0,
                internal: true,
                width_meters: 3.2,
                points: vec![Point::new(100.0, 0.0), Point::new(100.0, 5.0)],
            },
            LaneGeometry {
                edge_id: "e2".into(),
                lane_index: 0,
                internal: false,
                width_meters: 3.2,
                points: vec![Point::new(100.0, 0.0), Point::new(100.0, 80.0)],
            },
        ];
        net
    }

    #[test]
    fn vehicles_stay_on_regular_lanes() {
        let mut traffic = SyntheticTraffic::new(&network(), 20);
        for _ in 0..500 {
            traffic.step(0.2);
        }
        let (positions, types, speeds) = traffic.frame();
        assert_eq!(positions.len(), 20);
        assert_eq!(types.len(), 20);
        for (id, p) in &positions {
            let on_e1 = p.y.abs() < 1e-9 && (0.0..=100.0).contains(&p.x);
            let on_e2 = (p.x - 100.0).abs() < 1e-9 && (0.0..=80.0).contains(&p.y);
            assert!(on_e1 || on_e2, "{id} off road at {p:?}");
            assert!(speeds[id] >= 0.0);
        }
    }

    #[test]
    fn stepping_is_deterministic() {
        let mut a = SyntheticTraffic::new(&network(), 12);
        let mut b = SyntheticTraffic::new(&network(), 12);
        for _ in 0..50 {
            a.step(0.25);
            b.step(0.25);
        }
        assert_eq!(a.frame().0, b.frame().0);
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn sample_stays_in_range() {
        let mut traffic = SyntheticTraffic::new(&network(), 30);
        for _ in 0..400 {
            traffic.step(0.5);
            let (wait, throughput, congestion) = traffic.sample();
            assert!(wait >= 0.0);
            assert!(throughput >= 0.0);
            assert!((0.0..=1.0).contains(&congestion));
        }
        assert!(traffic.sample().1 > 0.0);
    }

    #[test]
    fn empty_network_yields_no_vehicles() {
        let mut traffic = SyntheticTraffic::new(&NetworkSnapshot::empty(), 10);
        traffic.step(1.0);
        assert_eq!(traffic.vehicle_count(), 0);
        assert_eq!(traffic.sample(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn publish_feeds_both_buffers() {
        let traffic = SyntheticTraffic::new(&network(), 10);
        let vehicles = LiveVehicleState::new();
        let trends = TrendSeriesBuffer::default();
        traffic.publish(&vehicles, &trends);
        traffic.publish(&vehicles, &trends);

        let snap = vehicles.snapshot();
        assert_eq!(snap.generation, 2);
        assert_eq!(snap.len(), 10);
        assert_eq!(snap.count_by_kind(VehicleKind::Truck), 2);
        assert_eq!(snap.count_by_kind(VehicleKind::Other), 1);
        assert_eq!(trends.snapshot().len(), 2);
    }

    #[test]
    fn feed_thread_publishes_and_stops() {
        let vehicles = Arc::new(LiveVehicleState::new());
        let trends = Arc::new(TrendSeriesBuffer::default());
        let mut handle = spawn_feed(
            SyntheticTraffic::new(&network(), 5),
            Arc::clone(&vehicles),
            Arc::clone(&trends),
            Duration::from_millis(2),
        )
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while trends.snapshot().len() < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(trends.snapshot().len() >= 3);

        handle.stop();
        assert!(!handle.is_running());
        assert!(vehicles.snapshot().is_empty());
    }
}
