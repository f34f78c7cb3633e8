use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TREND_CAPACITY: usize = 120;
pub const MIN_TREND_CAPACITY: usize = 30;

/// Consistent copy of the three series; all have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub avg_wait_sec: Vec<f64>,
    pub throughput_per_hour: Vec<f64>,
    pub congestion_index: Vec<f64>,
}

impl TrendSnapshot {
    pub fn len(&self) -> usize {
        self.avg_wait_sec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avg_wait_sec.is_empty()
    }

    /// The three series with their legend names, in draw order.
    pub fn series(&self) -> [(&'static str, &[f64]); 3] {
        [
            ("AvgWait(s)", self.avg_wait_sec.as_slice()),
            ("VPH", self.throughput_per_hour.as_slice()),
            ("Cong", self.congestion_index.as_slice()),
        ]
    }
}

#[derive(Debug, Default)]
struct Series {
    wait: VecDeque<f64>,
    throughput: VecDeque<f64>,
    congestion: VecDeque<f64>,
}

/// Sliding window over the last `capacity` trend samples.
#[derive(Debug)]
pub struct TrendSeriesBuffer {
    capacity: usize,
    series: Mutex<Series>,
}

impl TrendSeriesBuffer {
    /// `capacity` below [`MIN_TREND_CAPACITY`] is raised to it.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_TREND_CAPACITY);
        Self {
            capacity,
            series: Mutex::new(Series {
                wait: VecDeque::with_capacity(capacity + 1),
                throughput: VecDeque::with_capacity(capacity + 1),
                congestion: VecDeque::with_capacity(capacity + 1),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one sample to all three series at once.
    pub fn add_sample(&self, avg_wait_sec: f64, throughput_per_hour: f64, congestion_index: f64) {
        let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        push_bounded(&mut series.wait, avg_wait_sec, self.capacity);
        push_bounded(&mut series.throughput, throughput_per_hour, self.capacity);
        push_bounded(&mut series.congestion, congestion_index, self.capacity);
    }

    pub fn snapshot(&self) -> TrendSnapshot {
        let series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        TrendSnapshot {
            avg_wait_sec: series.wait.iter().copied().collect(),
            throughput_per_hour: series.throughput.iter().copied().collect(),
            congestion_index: series.congestion.iter().copied().collect(),
        }
    }

    pub fn clear(&self) {
        let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        series.wait.clear();
        series.throughput.clear();
        series.congestion.clear();
    }
}

impl Default for TrendSeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_CAPACITY)
    }
}

fn push_bounded(series: &mut VecDeque<f64>, value: f64, capacity: usize) {
    series.push_back(value);
    while series.len() > capacity {
        series.pop_front();
    }
}
