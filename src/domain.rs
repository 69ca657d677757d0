use serde::{Deserialize, Serialize};

/// live telemetry shared state
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryState {
    /// most recent reading; replaced wholesale on every tick
    pub reading: SensorReading,
    /// number of readings generated since startup (the initial one included)
    pub generation: u64,
    /// unix timestamp (ms) of last update
    pub last_update: u64,
}

/// one synthetic soil/air sample
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// nitrogen in ppm
    pub nitrogen: u32,
    /// phosphorus in ppm
    pub phosphorus: u32,
    /// potassium in ppm
    pub potassium: u32,
    /// air temperature in celsius
    pub temperature: i32,
    /// relative humidity (0-100%)
    pub humidity: u32,
    /// soil pH, one fractional digit (e.g. "6.8")
    pub ph: String,
    /// wall-clock time of the sample (e.g. "3:04:05 PM")
    pub timestamp: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Loamy,
    Clay,
    Sandy,
}

impl SoilType {
    pub const ALL: [SoilType; 3] = [SoilType::Loamy, SoilType::Clay, SoilType::Sandy];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Loamy => "Loamy",
            SoilType::Clay => "Clay",
            SoilType::Sandy => "Sandy",
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// nitrogen / phosphorus / potassium triple
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npk {
    pub nitrogen: u32,
    pub phosphorus: u32,
    pub potassium: u32,
}

impl Npk {
    pub fn total(&self) -> u32 {
        self.nitrogen + self.phosphorus + self.potassium
    }
}

/// structured output of one analysis run
///
/// never mutated after construction; a new run replaces the whole value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub soil_type: SoilType,
    /// percent, 85..=99 for the simulator
    pub confidence: u32,
    pub npk: Npk,
    /// one fractional digit
    pub ph: String,
    /// percent, one fractional digit
    pub organic_matter: String,
    /// percent
    pub moisture: u32,
    pub recommendations: Vec<String>,
    /// ISO-8601, UTC
    pub timestamp: String,
}

impl AnalysisResult {
    /// numeric pH; `None` if the string was produced by something other than
    /// the simulator and does not parse
    pub fn ph_value(&self) -> Option<f64> {
        self.ph.parse().ok()
    }
}

/// image handed to the analyzer
///
/// the bytes are an opaque reference: no decoding, no size limit and no MIME
/// check happen anywhere in the host.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub size_bytes: usize,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        let size_bytes = data.len();
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
            size_bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

// ==============================================================================
// fixed dashboard tables
// ==============================================================================

/// one row of the illustrative day chart
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HistoricalPoint {
    pub time: &'static str,
    pub nitrogen: u32,
    pub phosphorus: u32,
    pub potassium: u32,
    pub temperature: i32,
    pub humidity: u32,
}

const fn point(time: &'static str, n: u32, p: u32, k: u32, t: i32, h: u32) -> HistoricalPoint {
    HistoricalPoint { time, nitrogen: n, phosphorus: p, potassium: k, temperature: t, humidity: h }
}

pub const HISTORICAL: [HistoricalPoint; 6] = [
    point("6AM", 45, 32, 78, 22, 65),
    point("9AM", 52, 38, 82, 25, 62),
    point("12PM", 48, 35, 75, 28, 58),
    point("3PM", 55, 42, 88, 30, 55),
    point("6PM", 50, 40, 80, 26, 60),
    point("9PM", 47, 36, 76, 23, 68),
];

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Fertilizer {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub npk: &'static str,
    pub price: &'static str,
    pub eco: &'static str,
}

pub const FERTILIZERS: [Fertilizer; 4] = [
    Fertilizer { name: "Organic Compost", kind: "Organic", npk: "3-2-1", price: "$25/bag", eco: "High" },
    Fertilizer { name: "Bio-NPK Blend", kind: "Bio-organic", npk: "10-8-6", price: "$35/bag", eco: "High" },
    Fertilizer { name: "Vermicompost", kind: "Organic", npk: "2-1-1", price: "$20/bag", eco: "Very High" },
    Fertilizer { name: "Seaweed Extract", kind: "Natural", npk: "1-0-4", price: "$30/bottle", eco: "High" },
];

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub day: &'static str,
    pub temperature: i32,
    pub condition: &'static str,
}

pub const FORECAST: [ForecastDay; 4] = [
    ForecastDay { day: "Today", temperature: 28, condition: "Sunny" },
    ForecastDay { day: "Tomorrow", temperature: 26, condition: "Cloudy" },
    ForecastDay { day: "Day 3", temperature: 24, condition: "Rainy" },
    ForecastDay { day: "Day 4", temperature: 27, condition: "Sunny" },
];

/// headline card on the overview tab
#[derive(Clone, Copy, Debug, Serialize)]
pub struct QuickStat {
    pub label: &'static str,
    pub value: &'static str,
}

pub const QUICK_STATS: [QuickStat; 4] = [
    QuickStat { label: "Active Sensors", value: "12" },
    QuickStat { label: "Soil Health", value: "87%" },
    QuickStat { label: "Crop Yield", value: "+15%" },
    QuickStat { label: "Alerts", value: "3" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_uses_dashboard_field_names() {
        let result = AnalysisResult {
            soil_type: SoilType::Clay,
            confidence: 90,
            npk: Npk { nitrogen: 40, phosphorus: 30, potassium: 50 },
            ph: "6.5".into(),
            organic_matter: "3.1".into(),
            moisture: 55,
            recommendations: vec![],
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["soilType"], "Clay");
        assert_eq!(v["organicMatter"], "3.1");
        assert_eq!(v["npk"]["potassium"], 50);
        assert_eq!(result.ph_value(), Some(6.5));
    }

    #[test]
    fn uploaded_image_never_serializes_bytes() {
        let img = UploadedImage::new("field.png", "image/png", vec![1, 2, 3]);
        let v = serde_json::to_value(&img).unwrap();
        assert_eq!(v["sizeBytes"], 3);
        assert!(v.get("data").is_none());
        assert!(img.is_image());
        assert!(!UploadedImage::new("notes.txt", "text/plain", vec![]).is_image());
    }

    #[test]
    fn fertilizer_kind_serializes_as_type() {
        let v = serde_json::to_value(FERTILIZERS[1]).unwrap();
        assert_eq!(v["type"], "Bio-organic");
    }
}
