use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version stamped into every descriptor this client saves.
pub const SCHEMA_VERSION: &str = "1.0";

/// A saved chart as the backend stores it. `serial` is unique within a
/// user's gallery and is the only key used for targeted delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    pub serial: i64,
    pub chart_details: ChartDetails,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDetails {
    pub metadata: ChartMetadata,
    pub chart_config: ChartConfig,
    pub raw_data: RawData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: RawData,
    #[serde(default)]
    pub options: ChartOptions,
    /// Free-form styling blob owned by the editor; round-tripped untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_styles: Option<Value>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Scatter,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            title: None,
            show_legend: true,
            show_grid: true,
            x_label: None,
            y_label: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    /// CSS-style hex color chosen by the editor, e.g. "#36a2eb".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GalleryResponse {
    pub charts: Vec<ChartDescriptor>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveChartRequest {
    pub email: String,
    pub chart_details: ChartDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_descriptor() -> ChartDescriptor {
        ChartDescriptor {
            serial: 42,
            chart_details: ChartDetails {
                metadata: ChartMetadata {
                    name: "Quarterly revenue".to_string(),
                    saved_at: "2024-03-01T12:00:00Z".parse().unwrap(),
                    version: SCHEMA_VERSION.to_string(),
                },
                chart_config: ChartConfig {
                    chart_type: ChartType::Bar,
                    data: RawData {
                        labels: vec!["Q1".into(), "Q2".into()],
                        datasets: vec![Dataset {
                            label: "revenue".into(),
                            data: vec![10.0, 14.5],
                            color: Some("#36a2eb".into()),
                        }],
                    },
                    options: ChartOptions {
                        title: Some("Revenue".into()),
                        ..Default::default()
                    },
                    custom_styles: None,
                },
                raw_data: RawData {
                    labels: vec!["Q1".into(), "Q2".into()],
                    datasets: vec![Dataset {
                        label: "revenue".into(),
                        data: vec![10.0, 14.5],
                        color: None,
                    }],
                },
            },
        }
    }

    #[test]
    fn descriptor_round_trips() {
        let descriptor = sample_descriptor();
        let json = serde_json::to_string(&descriptor).unwrap();
        let back: ChartDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(descriptor, back);
    }

    #[test]
    fn descriptor_uses_wire_casing() {
        let json = serde_json::to_value(sample_descriptor()).unwrap();
        let details = &json["chartDetails"];
        assert_eq!(details["metadata"]["version"], "1.0");
        assert_eq!(details["chartConfig"]["type"], "bar");
        assert!(details["chartConfig"]["options"]["showLegend"].as_bool().unwrap());
        assert!(details["rawData"]["labels"].is_array());
    }

    #[test]
    fn options_default_when_missing() {
        let config: ChartConfig = serde_json::from_str(
            r#"{"type":"line","data":{"labels":[],"datasets":[]}}"#,
        )
        .unwrap();
        assert!(config.options.show_legend);
        assert!(config.options.show_grid);
        assert!(config.custom_styles.is_none());
    }
}
