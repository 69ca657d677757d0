//! ==============================================================================
//! telemetry.rs - live telemetry generator
//! ==============================================================================
//!
//! purpose:
//!     produces a fresh synthetic SensorReading on a fixed period and swaps it
//!     into shared state. there is no history and no merge: each tick replaces
//!     the previous reading wholesale.
//!
//! relationships:
//!     - used by: main.rs (spawns the generator, hands state to the web server)
//!     - uses: sampler.rs (all random draws)
//!
//! lifecycle:
//!     the background task lives exactly as long as its `TelemetryGenerator`
//!     handle. dropping the handle (or calling `stop`) aborts the task, so no
//!     timer outlives the host.
//!
//! ==============================================================================

use crate::domain::{SensorReading, TelemetryState};
use crate::sampler::Sampler;

use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

pub type SharedTelemetry = Arc<RwLock<TelemetryState>>;

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(5000);

// inclusive ranges
pub const NITROGEN: (i64, i64) = (20, 119);
pub const PHOSPHORUS: (i64, i64) = (15, 94);
pub const POTASSIUM: (i64, i64) = (30, 149);
pub const TEMPERATURE: (i64, i64) = (20, 34);
pub const HUMIDITY: (i64, i64) = (40, 79);
/// half-open, in tenths: [5.5, 8.5)
pub const PH_TENTHS: (i64, i64) = (55, 85);

/// Sample one reading. Every field is drawn independently.
pub fn generate_reading<S, Tz>(sampler: &mut S, now: DateTime<Tz>) -> SensorReading
where
    S: Sampler + ?Sized,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    SensorReading {
        nitrogen: sampler.int_in(NITROGEN.0, NITROGEN.1) as u32,
        phosphorus: sampler.int_in(PHOSPHORUS.0, PHOSPHORUS.1) as u32,
        potassium: sampler.int_in(POTASSIUM.0, POTASSIUM.1) as u32,
        temperature: sampler.int_in(TEMPERATURE.0, TEMPERATURE.1) as i32,
        humidity: sampler.int_in(HUMIDITY.0, HUMIDITY.1) as u32,
        ph: sampler.tenths(PH_TENTHS.0, PH_TENTHS.1),
        timestamp: now.format("%-I:%M:%S %p").to_string(),
    }
}

/// State as it looks right after startup: one reading, generation 1.
pub fn initial_state<S: Sampler + ?Sized>(sampler: &mut S) -> TelemetryState {
    TelemetryState {
        reading: generate_reading(sampler, Local::now()),
        generation: 1,
        last_update: now_ms(),
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Handle to the running generator task.
pub struct TelemetryGenerator {
    handle: JoinHandle<()>,
}

impl TelemetryGenerator {
    /// Start ticking. The first replacement happens one `period` after spawn;
    /// the reading present at spawn time is kept until then.
    ///
    /// Panics if `period` is zero.
    pub fn spawn<S>(state: SharedTelemetry, mut sampler: S, period: Duration, show_data: bool) -> Self
    where
        S: Sampler + 'static,
    {
        assert!(!period.is_zero(), "telemetry period must be non-zero");
        info!(period_ms = period.as_millis() as u64, "starting telemetry generator");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let reading = generate_reading(&mut sampler, Local::now());

                if show_data {
                    info!(
                        n = reading.nitrogen,
                        p = reading.phosphorus,
                        k = reading.potassium,
                        temp_c = reading.temperature,
                        humidity = reading.humidity,
                        ph = %reading.ph,
                        "[TELEMETRY] new reading"
                    );
                }

                let mut guard = state.write().await;
                guard.reading = reading;
                guard.generation += 1;
                guard.last_update = now_ms();
                debug!(generation = guard.generation, "telemetry state replaced");
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for TelemetryGenerator {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("telemetry generator stopped");
    }
}
