//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `host.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: Where the dashboard API listens.
//!     - TelemetryConfig: Tick period of the live sensor generator.
//!     - AnalysisConfig: Simulated latency and timeout of an analysis run.
//!     - ReportsConfig: Directory exported reports are written to.
//!     - LoggingConfig: Log level and per-tick reading output.
//!
//!     every section and field is optional; missing values take the defaults.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HostConfig {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub analysis: AnalysisConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    pub interval_ms: u64,
    /// fixed rng seed for reproducible demos
    pub seed: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { interval_ms: 5000, seed: None }
    }
}

impl TelemetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub delay_ms: u64,
    pub timeout_ms: u64,
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { delay_ms: 3000, timeout_ms: 30_000, seed: None }
    }
}

impl AnalysisConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportsConfig {
    pub output_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("reports") }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.telemetry.interval_ms == 0 {
            anyhow::bail!("telemetry.interval_ms must be greater than zero");
        }
        if self.analysis.timeout_ms <= self.analysis.delay_ms {
            anyhow::bail!(
                "analysis.timeout_ms ({}) must exceed analysis.delay_ms ({})",
                self.analysis.timeout_ms,
                self.analysis.delay_ms
            );
        }
        Ok(())
    }

    /// Load with default fallback
    ///
    /// runs before the log subscriber exists, so it reports on stdout.
    pub fn load_or_default() -> Self {
        let paths = [
            PathBuf::from("config").join("host.toml"),
            PathBuf::from("..").join("config").join("host.toml"),
        ];

        for path in &paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        println!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        println!("[CONFIG] Warning: Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        println!("[CONFIG] Warning: No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           HOST CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Bind: {}", self.server.bind_addr);
        println!("│ Telemetry Interval: {}ms", self.telemetry.interval_ms);
        println!("│ Analysis Delay: {}ms (timeout {}ms)", self.analysis.delay_ms, self.analysis.timeout_ms);
        println!("│ Reports: {}", self.reports.output_dir.display());
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let c = HostConfig::parse("").unwrap();
        assert_eq!(c.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(c.telemetry.interval(), Duration::from_millis(5000));
        assert_eq!(c.analysis.delay(), Duration::from_millis(3000));
        assert_eq!(c.reports.output_dir, PathBuf::from("reports"));
        assert!(c.logging.show_sensor_data);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let c = HostConfig::parse(
            r#"
            [telemetry]
            interval_ms = 1000
            seed = 42

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(c.telemetry.interval_ms, 1000);
        assert_eq!(c.telemetry.seed, Some(42));
        assert_eq!(c.logging.level, "debug");
        assert!(c.logging.show_sensor_data);
        assert_eq!(c.analysis.delay_ms, 3000);
    }

    #[test]
    fn rejects_timeout_shorter_than_delay() {
        let err = HostConfig::parse("[analysis]\ndelay_ms = 3000\ntimeout_ms = 1000\n").unwrap_err();
        assert!(err.to_string().contains("must exceed"));
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(HostConfig::parse("[telemetry]\ninterval_ms = 0\n").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[server]\nbind_addr = \"127.0.0.1:8080\"\n").unwrap();
        assert_eq!(HostConfig::load(&path).unwrap().server.bind_addr, "127.0.0.1:8080");
        assert!(HostConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
