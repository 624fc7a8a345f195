//! Polyfill Configuration

use serde::{Deserialize, Serialize};

/// When query thresholds written in relative units are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdResolution {
    /// Once, when the query is compiled (font sizes and viewport frozen)
    #[default]
    Activation,
    /// On every evaluation, against the container being tested
    EveryCycle,
}

/// Polyfill configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Custom property carrying the containment value
    pub contain_property: String,

    /// Media text prefixes marking a rewritten container query
    pub container_markers: Vec<String>,

    /// Relative-unit threshold resolution
    pub threshold_resolution: ThresholdResolution,

    /// Font size (px) used when the document has no root element
    pub default_font_size: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contain_property: "--css-contain".to_string(),
            container_markers: vec!["--css-container".to_string(), "@container".to_string()],
            threshold_resolution: ThresholdResolution::Activation,
            default_font_size: cqfill_dom::style::DEFAULT_FONT_SIZE,
        }
    }
}

impl Config {
    /// Whether media text starts with a container marker; the escaped
    /// identifier form (`\@container`) counts as the marker itself
    pub fn is_container_media(&self, media_text: &str) -> bool {
        let text = media_text.trim_start();
        let unescaped = text.strip_prefix('\\').unwrap_or(text);
        self.container_markers.iter().any(|marker| {
            !marker.is_empty() && (text.starts_with(marker.as_str()) || unescaped.starts_with(marker.as_str()))
        })
    }
}
