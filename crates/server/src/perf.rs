use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use shared_types::{PerformanceSummary, RequestSample, RouteStats};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default number of samples kept in memory.
pub const DEFAULT_CAPACITY: usize = 500;

/// Samples returned verbatim in the summary's `recent` list.
const RECENT_SAMPLES: usize = 20;

#[derive(Debug, Clone)]
struct Sample {
    method: String,
    route: String,
    status: u16,
    duration: Duration,
    recorded_at: DateTime<Utc>,
}

/// Bounded in-memory ring buffer of request timings.
///
/// Once `capacity` samples are held, each new sample evicts the oldest.
#[derive(Clone)]
pub struct PerfMonitor {
    inner: Arc<Mutex<PerfInner>>,
}

struct PerfInner {
    samples: VecDeque<Sample>,
    capacity: usize,
    slow_threshold: Duration,
}

impl PerfMonitor {
    pub fn new(capacity: usize, slow_threshold: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(PerfInner {
                samples: VecDeque::with_capacity(capacity),
                capacity,
                slow_threshold,
            })),
        }
    }

    /// Build from `PERF_BUFFER_SIZE` and `PERF_SLOW_REQUEST_MS`.
    pub fn from_env() -> Self {
        let capacity = crate::config::env_or("PERF_BUFFER_SIZE", DEFAULT_CAPACITY);
        let slow_ms = crate::config::env_or("PERF_SLOW_REQUEST_MS", 1000u64);
        Self::new(capacity, Duration::from_millis(slow_ms))
    }

    fn lock(&self) -> MutexGuard<'_, PerfInner> {
        // A panic while holding the lock leaves the buffer usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a sample. Returns true when it crossed the slow threshold.
    pub fn record(&self, method: &str, route: &str, status: u16, duration: Duration) -> bool {
        let mut inner = self.lock();
        if inner.samples.len() >= inner.capacity {
            inner.samples.pop_front();
        }
        inner.samples.push_back(Sample {
            method: method.to_string(),
            route: route.to_string(),
            status,
            duration,
            recorded_at: Utc::now(),
        });
        duration > inner.slow_threshold
    }

    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn reset(&self) {
        self.lock().samples.clear();
    }

    /// Aggregate the current buffer.
    pub fn summary(&self) -> PerformanceSummary {
        let inner = self.lock();
        let count = inner.samples.len();
        if count == 0 {
            return PerformanceSummary {
                capacity: inner.capacity,
                ..Default::default()
            };
        }

        let mut total_ms = 0.0;
        let mut max_ms: f64 = 0.0;
        let mut errors = 0usize;
        let mut per_route: HashMap<(String, String), (u64, f64, f64)> = HashMap::new();

        for s in &inner.samples {
            let ms = as_ms(s.duration);
            total_ms += ms;
            max_ms = max_ms.max(ms);
            if s.status >= 500 {
                errors += 1;
            }
            let entry = per_route
                .entry((s.method.clone(), s.route.clone()))
                .or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += ms;
            entry.2 = entry.2.max(ms);
        }

        let mut routes: Vec<RouteStats> = per_route
            .into_iter()
            .map(|((method, route), (n, sum, max))| RouteStats {
                method,
                route,
                count: n,
                avg_ms: sum / n as f64,
                max_ms: max,
            })
            .collect();
        routes.sort_by(|a, b| b.avg_ms.total_cmp(&a.avg_ms));

        let recent = inner
            .samples
            .iter()
            .rev()
            .take(RECENT_SAMPLES)
            .map(|s| RequestSample {
                method: s.method.clone(),
                route: s.route.clone(),
                status: s.status,
                duration_ms: as_ms(s.duration),
                recorded_at: s.recorded_at.to_rfc3339(),
            })
            .collect();

        PerformanceSummary {
            capacity: inner.capacity,
            sample_count: count,
            avg_ms: total_ms / count as f64,
            max_ms,
            error_rate: errors as f64 / count as f64,
            routes,
            recent,
        }
    }
}

fn as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Time each routed request and store it in the monitor.
///
/// Must be attached with `route_layer` so that `MatchedPath` is present.
pub async fn perf_middleware(
    State(monitor): State<PerfMonitor>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status().as_u16();

    if monitor.record(&method, &route, status, elapsed) {
        tracing::warn!(
            %method,
            %route,
            status,
            duration_ms = as_ms(elapsed),
            "Slow request"
        );
    }

    response
}
