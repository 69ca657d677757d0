//! Property tests for the generators and the report metrics.

use greengrids::analyzer::{self, sample_result};
use greengrids::domain::{AnalysisResult, Npk, SoilType};
use greengrids::report::{detailed_recommendations, health_score, HealthStatus, Priority};
use greengrids::sampler::RandomSampler;
use greengrids::telemetry::{self, generate_reading};

use chrono::Utc;
use proptest::prelude::*;

fn within(v: i64, (lo, hi): (i64, i64)) -> bool {
    (lo..=hi).contains(&v)
}

fn with_npk(npk: Npk, ph: &str) -> AnalysisResult {
    AnalysisResult {
        soil_type: SoilType::Clay,
        confidence: 88,
        npk,
        ph: ph.to_string(),
        organic_matter: "2.5".into(),
        moisture: 45,
        recommendations: vec![],
        timestamp: "2026-10-17T00:00:00.000Z".into(),
    }
}

proptest! {
    #[test]
    fn every_reading_is_in_range(seed in any::<u64>()) {
        let mut s = RandomSampler::seeded(seed);
        for _ in 0..32 {
            let r = generate_reading(&mut s, Utc::now());
            prop_assert!(within(r.nitrogen as i64, telemetry::NITROGEN));
            prop_assert!(within(r.phosphorus as i64, telemetry::PHOSPHORUS));
            prop_assert!(within(r.potassium as i64, telemetry::POTASSIUM));
            prop_assert!(within(r.temperature as i64, telemetry::TEMPERATURE));
            prop_assert!(within(r.humidity as i64, telemetry::HUMIDITY));

            let digits = r.ph.split_once('.').map(|(_, f)| f.len());
            prop_assert_eq!(digits, Some(1));
            let ph: f64 = r.ph.parse().unwrap();
            prop_assert!((5.5..8.5).contains(&ph));
        }
    }

    #[test]
    fn every_analysis_is_in_range(seed in any::<u64>()) {
        let mut s = RandomSampler::seeded(seed);
        let r = sample_result(&mut s, Utc::now());
        prop_assert!(within(r.confidence as i64, analyzer::CONFIDENCE));
        prop_assert!(within(r.npk.nitrogen as i64, analyzer::NITROGEN));
        prop_assert!(within(r.npk.phosphorus as i64, analyzer::PHOSPHORUS));
        prop_assert!(within(r.npk.potassium as i64, analyzer::POTASSIUM));
        prop_assert!(within(r.moisture as i64, analyzer::MOISTURE));
        prop_assert_eq!(r.recommendations.len(), 3);
    }

    #[test]
    fn health_score_is_monotonic_and_clamped(
        n in 0u32..400, p in 0u32..400, k in 0u32..400, extra in 0u32..200,
    ) {
        let base = Npk { nitrogen: n, phosphorus: p, potassium: k };
        let more = Npk { nitrogen: n + extra, ..base };
        let a = health_score(&base);
        let b = health_score(&more);
        prop_assert!(a <= b);
        prop_assert!(b <= 100);
        if base.total() >= 150 {
            prop_assert_eq!(a, 100);
        }
        prop_assert_eq!(HealthStatus::from_score(a) == HealthStatus::Excellent, a > 80);
    }

    #[test]
    fn nitrogen_advisory_tracks_threshold(n in 0u32..120) {
        let recs = detailed_recommendations(&with_npk(Npk { nitrogen: n, phosphorus: 30, potassium: 60 }, "7.0"));
        let flagged = recs.iter().any(|r| r.category == "Nitrogen Management" && r.priority == Priority::High);
        prop_assert_eq!(flagged, n < 40);
    }
}

#[test]
fn npk_sum_300_scores_100() {
    assert_eq!(health_score(&Npk { nitrogen: 100, phosphorus: 100, potassium: 100 }), 100);
}
