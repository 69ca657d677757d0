//! ==============================================================================
//! analyzer.rs - soil image analyzer seam
//! ==============================================================================
//!
//! purpose:
//!     `Analyzer` is the boundary where a real inference backend would plug in.
//!     the only implementation today is `SimulatedAnalyzer`: it sleeps for a
//!     fixed delay and then samples a plausible-looking result. it never fails,
//!     but the trait returns `Result` so a real backend can.
//!
//! relationships:
//!     - used by: service.rs (runs `analyze` inside a cancellable task)
//!     - uses: sampler.rs
//!
//! ==============================================================================

use crate::domain::{AnalysisResult, Npk, SoilType, UploadedImage};
use crate::error::AnalysisError;
use crate::sampler::Sampler;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(3000);

pub const CONFIDENCE: (i64, i64) = (85, 99);
pub const NITROGEN: (i64, i64) = (30, 69);
pub const PHOSPHORUS: (i64, i64) = (20, 49);
pub const POTASSIUM: (i64, i64) = (40, 89);
pub const MOISTURE: (i64, i64) = (40, 69);
/// [6.0, 8.0) in tenths
pub const PH_TENTHS: (i64, i64) = (60, 80);
/// [2.0, 5.0) in tenths
pub const ORGANIC_MATTER_TENTHS: (i64, i64) = (20, 50);

pub const RECOMMENDATIONS: [&str; 3] = [
    "Add organic compost to improve soil structure",
    "Consider lime application to adjust pH levels",
    "Implement crop rotation for better nutrient cycling",
];

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: &UploadedImage) -> Result<AnalysisResult, AnalysisError>;
}

/// Draw one result. The image does not influence anything.
pub fn sample_result<S: Sampler + ?Sized>(sampler: &mut S, now: DateTime<Utc>) -> AnalysisResult {
    let soil_type = SoilType::ALL[sampler.index(SoilType::ALL.len())];
    let confidence = sampler.int_in(CONFIDENCE.0, CONFIDENCE.1) as u32;
    let npk = Npk {
        nitrogen: sampler.int_in(NITROGEN.0, NITROGEN.1) as u32,
        phosphorus: sampler.int_in(PHOSPHORUS.0, PHOSPHORUS.1) as u32,
        potassium: sampler.int_in(POTASSIUM.0, POTASSIUM.1) as u32,
    };
    let ph = sampler.tenths(PH_TENTHS.0, PH_TENTHS.1);
    let organic_matter = sampler.tenths(ORGANIC_MATTER_TENTHS.0, ORGANIC_MATTER_TENTHS.1);
    let moisture = sampler.int_in(MOISTURE.0, MOISTURE.1) as u32;

    AnalysisResult {
        soil_type,
        confidence,
        npk,
        ph,
        organic_matter,
        moisture,
        recommendations: RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

pub struct SimulatedAnalyzer {
    delay: Duration,
    sampler: Mutex<Box<dyn Sampler>>,
}

impl SimulatedAnalyzer {
    pub fn new(delay: Duration, sampler: impl Sampler + 'static) -> Self {
        Self { delay, sampler: Mutex::new(Box::new(sampler)) }
    }
}

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, image: &UploadedImage) -> Result<AnalysisResult, AnalysisError> {
        debug!(file = %image.file_name, delay_ms = self.delay.as_millis() as u64, "simulating analysis");
        tokio::time::sleep(self.delay).await;

        // the rng has no invariant a panicking holder could break
        let mut sampler = self.sampler.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sample_result(&mut **sampler, Utc::now()))
    }
}
