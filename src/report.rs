//! ==============================================================================
//! report.rs - soil report derivation and export
//! ==============================================================================
//!
//! purpose:
//!     turns a finished AnalysisResult into a downloadable document (json or
//!     printable html) and hands it to a `ReportSink`.
//!
//!     the only business rules in the host live here:
//!     - health score = min(100, floor(npk_total / 150 * 100))
//!     - status thresholds: > 80 excellent, > 60 good, otherwise needs improvement
//!     - advisories: nitrogen < 40 (high priority), ph < 6.0 (medium priority)
//!
//! relationships:
//!     - used by: server.rs (report + export endpoints)
//!
//! ==============================================================================

use crate::domain::{AnalysisResult, Npk};
use crate::error::ExportError;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

pub const REPORT_TITLE: &str = "Green Grids Professional Soil Analysis Report";
pub const REPORT_LOCATION: &str = "Farm Location";

// ==============================================================================
// derived metrics
// ==============================================================================

pub fn health_score(npk: &Npk) -> u32 {
    (npk.total() * 100 / 150).min(100)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        if score > 80 {
            HealthStatus::Excellent
        } else if score > 60 {
            HealthStatus::Good
        } else {
            HealthStatus::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub health_score: u32,
    pub status: HealthStatus,
    pub primary_concerns: Vec<&'static str>,
    pub strengths: Vec<&'static str>,
}

pub fn summarize(result: &AnalysisResult) -> Summary {
    let health_score = health_score(&result.npk);
    let mut primary_concerns = Vec::new();
    if result.npk.nitrogen < 30 {
        primary_concerns.push("Low Nitrogen");
    }
    let mut strengths = Vec::new();
    if result.npk.potassium > 70 {
        strengths.push("High Potassium");
    }
    Summary {
        health_score,
        status: HealthStatus::from_score(health_score),
        primary_concerns,
        strengths,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub category: &'static str,
    pub priority: Priority,
    pub action: &'static str,
    pub timeline: &'static str,
}

pub fn detailed_recommendations(result: &AnalysisResult) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if result.npk.nitrogen < 40 {
        out.push(Recommendation {
            category: "Nitrogen Management",
            priority: Priority::High,
            action: "Apply nitrogen-rich organic fertilizer",
            timeline: "Within 2 weeks",
        });
    }

    // unparseable ph never triggers
    if result.ph_value().is_some_and(|ph| ph < 6.0) {
        out.push(Recommendation {
            category: "pH Adjustment",
            priority: Priority::Medium,
            action: "Apply lime to increase soil pH",
            timeline: "Before next planting season",
        });
    }

    out
}

// ==============================================================================
// documents
// ==============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Html,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDocument {
    pub file_name: String,
    pub format: ReportFormat,
    pub body: String,
}

fn local_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    at.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

fn analysis_date(result: &AnalysisResult) -> String {
    DateTime::parse_from_rfc3339(&result.timestamp)
        .map(|t| local_date(&t))
        .unwrap_or_else(|_| result.timestamp.clone())
}

/// Pretty-printed JSON report. Every result field is carried over; the
/// plain advisory list is replaced by the detailed recommendations.
pub fn render_json<Tz: TimeZone>(result: &AnalysisResult, generated: &DateTime<Tz>) -> Result<String, ExportError> {
    let mut doc = serde_json::Map::new();
    doc.insert("title".into(), REPORT_TITLE.into());
    doc.insert("generatedDate".into(), local_date(generated).into());
    doc.insert("analysisDate".into(), analysis_date(result).into());
    doc.insert("location".into(), REPORT_LOCATION.into());

    if let serde_json::Value::Object(fields) = serde_json::to_value(result)? {
        doc.extend(fields);
    }
    doc.insert("summary".into(), serde_json::to_value(summarize(result))?);
    doc.insert("recommendations".into(), serde_json::to_value(detailed_recommendations(result))?);

    Ok(serde_json::to_string_pretty(&serde_json::Value::Object(doc))?)
}

/// Printable HTML report.
pub fn render_html<Tz: TimeZone>(result: &AnalysisResult, generated: &DateTime<Tz>) -> String {
    let summary = summarize(result);

    let mut advisories = String::new();
    for rec in &result.recommendations {
        let _ = write!(advisories, "<li>{}</li>", html_escape(rec));
    }
    for rec in detailed_recommendations(result) {
        let _ = write!(
            advisories,
            "<li><strong>{} ({:?} priority):</strong> {} <em>{}</em></li>",
            rec.category, rec.priority, rec.action, rec.timeline
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Soil Analysis Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; color: #333; }}
        .header {{ background: #2f855a; color: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; margin: 20px 0; }}
        .card {{ border: 1px solid #ddd; border-radius: 8px; padding: 15px; background: #f9f9f9; }}
        .metric {{ text-align: center; padding: 10px; border-radius: 6px; color: white; }}
        .nitrogen {{ background: #3b82f6; }}
        .phosphorus {{ background: #8b5cf6; }}
        .potassium {{ background: #f59e0b; }}
        .recommendations {{ background: #fef3c7; padding: 15px; border-radius: 8px; margin: 20px 0; }}
        .footer {{ text-align: center; margin-top: 30px; color: #666; font-size: 12px; }}
        @media print {{ body {{ margin: 0; }} }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Green Grids Soil Analysis Platform</h1>
        <p>Generated on: {generated}</p>
        <p>Analysis Confidence: {confidence}%</p>
        <p>Soil Health Score: {score} ({status})</p>
    </div>
    <div class="card">
        <h2>Soil Classification</h2>
        <p><strong>Soil Type:</strong> {soil_type}</p>
        <p><strong>pH Level:</strong> {ph}</p>
        <p><strong>Organic Matter:</strong> {organic}%</p>
        <p><strong>Moisture Content:</strong> {moisture}%</p>
    </div>
    <div class="grid">
        <div class="metric nitrogen"><h3>Nitrogen (N)</h3><p>{n} ppm</p></div>
        <div class="metric phosphorus"><h3>Phosphorus (P)</h3><p>{p} ppm</p></div>
        <div class="metric potassium"><h3>Potassium (K)</h3><p>{k} ppm</p></div>
    </div>
    <div class="recommendations">
        <h2>AI Recommendations</h2>
        <ul>{advisories}</ul>
    </div>
    <div class="footer">
        <p>This report was generated by Green Grids AI-powered soil analysis system.</p>
    </div>
</body>
</html>
"#,
        generated = local_date(generated),
        confidence = result.confidence,
        score = summary.health_score,
        status = summary.status.as_str(),
        soil_type = result.soil_type,
        ph = html_escape(&result.ph),
        organic = html_escape(&result.organic_matter),
        moisture = result.moisture,
        n = result.npk.nitrogen,
        p = result.npk.phosphorus,
        k = result.npk.potassium,
        advisories = advisories,
    )
}

/// Build the document for `result`. `None` in means `None` out.
pub fn build<Tz: TimeZone>(
    result: Option<&AnalysisResult>,
    format: ReportFormat,
    now: &DateTime<Tz>,
) -> Result<Option<ReportDocument>, ExportError> {
    let Some(result) = result else {
        return Ok(None);
    };
    let body = match format {
        ReportFormat::Json => render_json(result, now)?,
        ReportFormat::Html => render_html(result, now),
    };
    Ok(Some(ReportDocument {
        file_name: format!("soil-analysis-report-{}.{}", now.timestamp_millis(), format.extension()),
        format,
        body,
    }))
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

// ==============================================================================
// sinks
// ==============================================================================

/// Where exported documents end up.
pub trait ReportSink: Send + Sync {
    /// Publish the whole document or nothing. Returns a location string.
    fn publish(&self, doc: &ReportDocument) -> Result<String, ExportError>;
}

/// Writes reports as files under one directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for DirectorySink {
    fn publish(&self, doc: &ReportDocument) -> Result<String, ExportError> {
        let unavailable = |target: PathBuf| move |source: std::io::Error| ExportError::SinkUnavailable { target, source };

        std::fs::create_dir_all(&self.dir).map_err(unavailable(self.dir.clone()))?;

        let target = self.dir.join(&doc.file_name);
        let tmp = self.dir.join(format!(".{}.part", doc.file_name));
        std::fs::write(&tmp, doc.body.as_bytes()).map_err(unavailable(tmp.clone()))?;
        if let Err(e) = std::fs::rename(&tmp, &target) {
            let _ = std::fs::remove_file(&tmp);
            return Err(unavailable(target)(e));
        }
        Ok(target.display().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReceipt {
    pub file_name: String,
    pub location: String,
}

/// Render and publish. With no result this does nothing and returns
/// `Ok(None)`; sink failures are returned, never swallowed.
pub fn export<Tz: TimeZone>(
    result: Option<&AnalysisResult>,
    format: ReportFormat,
    sink: &dyn ReportSink,
    now: &DateTime<Tz>,
) -> Result<Option<ExportReceipt>, ExportError> {
    let Some(doc) = build(result, format, now)? else {
        info!("[REPORT] nothing to export");
        return Ok(None);
    };
    match sink.publish(&doc) {
        Ok(location) => {
            info!(file = %doc.file_name, %location, "[REPORT] exported");
            Ok(Some(ExportReceipt { file_name: doc.file_name, location }))
        }
        Err(e) => {
            warn!(file = %doc.file_name, error = %e, "[REPORT] export failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SoilType;
    use chrono::Utc;

    fn result(n: u32, p: u32, k: u32, ph: &str) -> AnalysisResult {
        AnalysisResult {
            soil_type: SoilType::Loamy,
            confidence: 92,
            npk: Npk { nitrogen: n, phosphorus: p, potassium: k },
            ph: ph.into(),
            organic_matter: "3.4".into(),
            moisture: 52,
            recommendations: vec!["Add organic compost to improve soil structure".into()],
            timestamp: "2026-10-17T09:15:00.000Z".into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn health_score_is_clamped() {
        assert_eq!(health_score(&Npk { nitrogen: 100, phosphorus: 100, potassium: 100 }), 100);
        assert_eq!(health_score(&Npk { nitrogen: 50, phosphorus: 50, potassium: 50 }), 100);
        assert_eq!(health_score(&Npk { nitrogen: 30, phosphorus: 20, potassium: 40 }), 60);
        assert_eq!(health_score(&Npk { nitrogen: 0, phosphorus: 0, potassium: 1 }), 0);
    }

    #[test]
    fn status_thresholds_are_strict() {
        assert_eq!(HealthStatus::from_score(81), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(80), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(61), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(60), HealthStatus::NeedsImprovement);
    }

    #[test]
    fn low_nitrogen_triggers_high_priority() {
        let recs = detailed_recommendations(&result(35, 30, 60, "6.5"));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "Nitrogen Management");
        assert_eq!(recs[0].priority, Priority::High);

        assert!(detailed_recommendations(&result(45, 30, 60, "6.5")).is_empty());
    }

    #[test]
    fn acidic_soil_triggers_lime() {
        let recs = detailed_recommendations(&result(45, 30, 60, "5.9"));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "pH Adjustment");
        assert_eq!(recs[0].priority, Priority::Medium);
        assert!(detailed_recommendations(&result(45, 30, 60, "6.0")).is_empty());
        assert!(detailed_recommendations(&result(45, 30, 60, "n/a")).is_empty());
    }

    #[test]
    fn summary_flags_concerns_and_strengths() {
        let s = summarize(&result(25, 20, 75, "6.5"));
        assert_eq!(s.health_score, 80);
        assert_eq!(s.status, HealthStatus::Good);
        assert_eq!(s.primary_concerns, vec!["Low Nitrogen"]);
        assert_eq!(s.strengths, vec!["High Potassium"]);
    }

    #[test]
    fn json_report_overrides_recommendations() {
        let body = render_json(&result(35, 10, 20, "5.8"), &now()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["title"], REPORT_TITLE);
        assert_eq!(v["location"], REPORT_LOCATION);
        assert_eq!(v["soilType"], "Loamy");
        assert_eq!(v["summary"]["status"], "Needs Improvement");
        assert_eq!(v["recommendations"].as_array().unwrap().len(), 2);
        assert_eq!(v["recommendations"][0]["priority"], "High");
    }

    #[test]
    fn html_report_escapes_fields() {
        let html = render_html(&result(60, 40, 80, "<b>7</b>"), &now());
        assert!(html.contains("&lt;b&gt;7&lt;/b&gt;"));
        assert!(html.contains("Analysis Confidence: 92%"));
        assert!(html.contains("<li>Add organic compost to improve soil structure</li>"));
    }

    #[test]
    fn build_without_result_is_none() {
        assert_eq!(build(None, ReportFormat::Html, &now()).unwrap(), None);
        let doc = build(Some(&result(60, 40, 80, "7.0")), ReportFormat::Json, &now()).unwrap().unwrap();
        assert_eq!(doc.file_name, format!("soil-analysis-report-{}.json", now().timestamp_millis()));
    }

    #[test]
    fn export_without_result_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("reports"));
        assert_eq!(export(None, ReportFormat::Json, &sink, &now()).unwrap(), None);
        assert!(!dir.path().join("reports").exists());
    }

    #[test]
    fn export_writes_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        let receipt = export(Some(&result(60, 40, 80, "7.0")), ReportFormat::Html, &sink, &now())
            .unwrap()
            .unwrap();
        let written = std::fs::read_to_string(dir.path().join(&receipt.file_name)).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn unusable_target_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"file, not a dir").unwrap();

        let sink = DirectorySink::new(&blocker);
        let err = export(Some(&result(60, 40, 80, "7.0")), ReportFormat::Json, &sink, &now()).unwrap_err();
        assert!(matches!(err, ExportError::SinkUnavailable { .. }));
    }
}
