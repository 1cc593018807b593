//! Chart export pipeline: PNG and PDF artifacts, the print document,
//! and save-to-backend. Rasterization failures are caught, logged, and
//! surfaced as a failure toast; nothing retries automatically.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chartdeck_api_types::{
    ChartConfig, ChartDetails, ChartMetadata, RawData, SaveChartRequest, SCHEMA_VERSION,
};
use chartdeck_charts::{encode_png, rasterize, RGBColor, RasterOptions};
use chrono::Utc;
use printpdf::{image_crate, ImageTransform, Mm, PdfDocument};
use tracing::{error, info};

use crate::api::DashboardApi;
use crate::error::{AppError, AppResult};
use crate::global_state::theme::ThemeMode;
use crate::global_state::toasts::Toasts;

const EXPORT_SCALE: u32 = 3;
const PRINT_SCALE: u32 = 2;
const PDF_DPI: f32 = 300.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub enum ExportOutcome {
    Artifact(ExportArtifact),
    /// Premium format requested without the entitlement; no bytes are
    /// produced, the host shows the upsell prompt.
    Upsell,
}

/// Border and page background applied to the print document.
#[derive(Clone, Debug)]
pub struct PrintStyle {
    pub background: String,
    pub border: String,
}

impl Default for PrintStyle {
    fn default() -> Self {
        PrintStyle {
            background: "#ffffff".to_string(),
            border: "1px solid #d1d5db".to_string(),
        }
    }
}

pub struct ExportPipeline<A> {
    api: Arc<A>,
    toasts: Toasts,
    pub entitled: bool,
    theme: ThemeMode,
    processing: bool,
}

impl<A: DashboardApi> ExportPipeline<A> {
    pub fn new(api: Arc<A>, toasts: Toasts, theme: ThemeMode, entitled: bool) -> Self {
        ExportPipeline {
            api,
            toasts,
            entitled,
            theme,
            processing: false,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
    }

    /// PNG exports are open to everyone; PDF is entitlement-gated.
    pub fn export_image(
        &mut self,
        config: &ChartConfig,
        name: &str,
        format: ExportFormat,
        background: Option<RGBColor>,
    ) -> AppResult<ExportOutcome> {
        if self.processing {
            return Err(AppError::Busy);
        }
        if format == ExportFormat::Pdf && !self.entitled {
            return Ok(ExportOutcome::Upsell);
        }
        self.processing = true;
        let result = self.render_export(config, name, format, background);
        self.processing = false;
        match result {
            Ok(artifact) => {
                info!(file = %artifact.file_name, "chart exported");
                Ok(ExportOutcome::Artifact(artifact))
            }
            Err(e) => {
                error!("export failed: {e}");
                self.toasts.error(format!("Export failed: {}", e.user_message()));
                Err(e)
            }
        }
    }

    fn render_export(
        &mut self,
        config: &ChartConfig,
        name: &str,
        format: ExportFormat,
        background: Option<RGBColor>,
    ) -> AppResult<ExportArtifact> {
        let mut options =
            RasterOptions::new(self.theme.chart_theme(), !self.entitled).scale(EXPORT_SCALE);
        if let Some(background) = background {
            options = options.background(background);
        }
        let image =
            rasterize(config, &options).map_err(|e| AppError::Render(e.to_string()))?;
        match format {
            ExportFormat::Png => {
                let bytes = encode_png(&image).map_err(|e| AppError::Export(e.to_string()))?;
                Ok(ExportArtifact {
                    file_name: artifact_file_name(name, None, "png"),
                    mime: "image/png",
                    bytes,
                })
            }
            ExportFormat::Pdf => {
                let (width_px, height_px) = (image.width(), image.height());
                // hand the pixels to printpdf's own image crate version
                let embedded = image_crate::RgbImage::from_raw(width_px, height_px, image.into_raw())
                    .map(image_crate::DynamicImage::ImageRgb8)
                    .ok_or_else(|| AppError::Export("raster buffer has wrong size".to_string()))?;
                let width = Mm(width_px as f32 * 25.4 / PDF_DPI);
                let height = Mm(height_px as f32 * 25.4 / PDF_DPI);
                let (doc, page, layer) = PdfDocument::new(name, width, height, "chart");
                let layer = doc.get_page(page).get_layer(layer);
                printpdf::Image::from_dynamic_image(&embedded).add_to_layer(
                    layer,
                    ImageTransform {
                        dpi: Some(PDF_DPI),
                        ..Default::default()
                    },
                );
                let bytes = doc
                    .save_to_bytes()
                    .map_err(|e| AppError::Export(e.to_string()))?;
                Ok(ExportArtifact {
                    file_name: artifact_file_name(name, None, "pdf"),
                    mime: "application/pdf",
                    bytes,
                })
            }
        }
    }

    /// Minimal HTML document with the 2x bitmap inlined; printing is
    /// triggered from the image's load callback plus a short settle
    /// delay, not a fixed outer timer.
    pub fn print_document(
        &mut self,
        config: &ChartConfig,
        name: &str,
        style: &PrintStyle,
    ) -> AppResult<String> {
        if self.processing {
            return Err(AppError::Busy);
        }
        self.processing = true;
        let options =
            RasterOptions::new(self.theme.chart_theme(), !self.entitled).scale(PRINT_SCALE);
        let result = rasterize(config, &options)
            .map_err(|e| AppError::Render(e.to_string()))
            .and_then(|image| encode_png(&image).map_err(|e| AppError::Export(e.to_string())));
        self.processing = false;
        let png = match result {
            Ok(png) => png,
            Err(e) => {
                error!("print render failed: {e}");
                self.toasts
                    .error(format!("Print failed: {}", e.user_message()));
                return Err(e);
            }
        };
        let encoded = BASE64.encode(&png);
        Ok(format!(
            "<!doctype html>\n<html>\n<head>\n<title>{name}</title>\n<style>\n\
             body {{ margin: 0; background: {background}; display: flex; \
             justify-content: center; align-items: center; }}\n\
             img {{ border: {border}; max-width: 100%; }}\n\
             </style>\n</head>\n<body>\n\
             <img src=\"data:image/png;base64,{encoded}\" \
             onload=\"setTimeout(function() {{ window.print(); }}, 150)\">\n\
             </body>\n</html>\n",
            name = name,
            background = style.background,
            border = style.border,
        ))
    }

    /// Bundles the live chart into a descriptor payload and persists it.
    /// The gallery is not told about the new entry; it shows up on the
    /// next fetch.
    pub async fn save(
        &mut self,
        email: &str,
        config: &ChartConfig,
        raw_data: &RawData,
        name: Option<String>,
    ) -> AppResult<()> {
        if self.processing {
            return Err(AppError::Busy);
        }
        self.processing = true;
        let now = Utc::now();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("chart-{}", now.format("%Y%m%d-%H%M%S")));
        let request = SaveChartRequest {
            email: email.to_string(),
            chart_details: ChartDetails {
                metadata: ChartMetadata {
                    name,
                    saved_at: now,
                    version: SCHEMA_VERSION.to_string(),
                },
                chart_config: config.clone(),
                raw_data: raw_data.clone(),
            },
        };
        let result = self.api.save_chart(&request).await;
        self.processing = false;
        match result {
            Ok(message) if message.success => {
                self.toasts.success("Chart saved");
                Ok(())
            }
            Ok(message) => {
                let reason = message
                    .message
                    .unwrap_or_else(|| "Failed to save chart".to_string());
                self.toasts.error(reason.clone());
                Err(AppError::Message(reason))
            }
            Err(error) => {
                self.toasts.error(error.user_message());
                Err(error.into())
            }
        }
    }
}

/// `Revenue Q3` + serial 12 on 2024-03-01 becomes
/// `revenue-q3-12-2024-03-01.png`.
pub fn artifact_file_name(name: &str, serial: Option<i64>, extension: &str) -> String {
    let mut stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while stem.contains("--") {
        stem = stem.replace("--", "-");
    }
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "chart" } else { stem };
    let date = Utc::now().format("%Y-%m-%d");
    match serial {
        Some(serial) => format!("{stem}-{serial}-{date}.{extension}"),
        None => format!("{stem}-{date}.{extension}"),
    }
}
