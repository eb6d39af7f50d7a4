//! Command-line and environment configuration.

use clap::Parser;
use std::time::Duration;
use thiserror::Error;

use crate::board::Thresholds;
use crate::polling::PollSettings;

/// Smartboard - sensor chessboard controller with a websocket peer link
#[derive(Parser, Debug, Clone)]
#[command(name = "smartboard")]
#[command(about = "Sensor chessboard controller with a websocket peer link", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host to bind to
    #[arg(long, env = "SMARTBOARD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, env = "SMARTBOARD_PORT", default_value = "8080")]
    pub port: u16,

    /// Delay between two sensor grid scans
    #[arg(long, env = "SMARTBOARD_POLL_INTERVAL_MS", default_value = "50")]
    pub poll_interval_ms: u64,

    /// Readings below this mean a black piece
    #[arg(long, env = "SMARTBOARD_THRESHOLD_LOW", default_value = "341")]
    pub threshold_low: u16,

    /// Readings above this mean a white piece
    #[arg(long, env = "SMARTBOARD_THRESHOLD_HIGH", default_value = "683")]
    pub threshold_high: u16,

    /// Wait between two attempts to bind the listening socket
    #[arg(long, env = "SMARTBOARD_BIND_RETRY_MS", default_value = "2000")]
    pub bind_retry_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("threshold-low ({low}) must be below threshold-high ({high})")]
    ThresholdOrder { low: u16, high: u16 },
    #[error("poll interval must be at least 1 ms")]
    ZeroPollInterval,
}

impl Cli {
    pub fn poll_settings(&self) -> Result<PollSettings, ConfigError> {
        if self.threshold_low >= self.threshold_high {
            return Err(ConfigError::ThresholdOrder {
                low: self.threshold_low,
                high: self.threshold_high,
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            thresholds: Thresholds {
                low: self.threshold_low,
                high: self.threshold_high,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn bind_retry(&self) -> Duration {
        Duration::from_millis(self.bind_retry_ms)
    }
}
