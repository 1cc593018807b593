//! Rasterization helpers: render a chart into an RGB pixel buffer and
//! encode it as PNG. Only compiled with the `image` feature.

use anyhow::anyhow;
use chartdeck_api_types::ChartConfig;
use image::RgbImage;
use log::warn;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::{draw_chart, draw_error_message, RenderOptions, Theme};

pub const BASE_WIDTH: u32 = 640;
pub const BASE_HEIGHT: u32 = 400;

#[derive(Clone, Debug)]
pub struct RasterOptions {
    pub render: RenderOptions,
    /// Integer upscaling of the base surface (3x export, 2x print).
    pub scale: u32,
    /// Low-opacity caption drawn along the bottom edge.
    pub footer: Option<String>,
}

impl RasterOptions {
    pub fn new(theme: Theme, watermarked: bool) -> Self {
        RasterOptions {
            render: RenderOptions::new(theme, watermarked),
            scale: 1,
            footer: None,
        }
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn background(mut self, background: RGBColor) -> Self {
        self.render.background = Some(background);
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Renders `config` into a fresh bitmap. A failed chart render is
/// replaced by the in-surface error message, matching what the live
/// surface would show; only backend failures bubble up.
pub fn rasterize(config: &ChartConfig, options: &RasterOptions) -> anyhow::Result<RgbImage> {
    let width = BASE_WIDTH * options.scale;
    let height = BASE_HEIGHT * options.scale;
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    let draw_failure = {
        let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
        draw_chart(backend, config, &options.render)
            .err()
            .map(|e| e.to_string())
    };
    if let Some(message) = draw_failure {
        warn!("chart render failed, drawing error surface: {message}");
        let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
        draw_error_message(backend, options.render.theme, &message)
            .map_err(|e| anyhow!("error surface failed: {e}"))?;
    } else if let Some(footer) = &options.footer {
        let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
        draw_footer(backend, footer, options.render.theme)
            .map_err(|e| anyhow!("footer failed: {e}"))?;
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("raster buffer has wrong size"))
}

fn draw_footer<'a, DB>(
    backend: DB,
    footer: &str,
    theme: Theme,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let color = match theme {
        Theme::Dark => RGBColor(229, 231, 235).mix(0.35),
        Theme::Light => RGBColor(31, 41, 55).mix(0.35),
    };
    let root = backend.into_drawing_area();
    let (width, height) = root.dim_in_pixel();
    let style = ("sans-serif", 14.0)
        .into_font()
        .color(&color)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw(&Text::new(
        footer.to_string(),
        ((width / 2) as i32, (height - 6) as i32),
        style,
    ))?;
    root.present()?;
    Ok(())
}

pub fn encode_png(image: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartdeck_api_types::{ChartOptions, ChartType, Dataset, RawData};

    fn line_config() -> ChartConfig {
        ChartConfig {
            chart_type: ChartType::Line,
            data: RawData {
                labels: vec!["a".into(), "b".into(), "c".into()],
                datasets: vec![Dataset {
                    label: "series".into(),
                    data: vec![1.0, 3.0, 2.0],
                    color: Some("#36a2eb".into()),
                }],
            },
            options: ChartOptions::default(),
            custom_styles: None,
        }
    }

    #[test]
    fn rasterize_produces_scaled_surface() {
        let image = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false).scale(3))
            .unwrap();
        assert_eq!(image.width(), BASE_WIDTH * 3);
        assert_eq!(image.height(), BASE_HEIGHT * 3);
    }

    #[test]
    fn watermarked_render_differs_from_clean_render() {
        let clean = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false)).unwrap();
        let marked = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, true)).unwrap();
        assert_ne!(clean.as_raw(), marked.as_raw());
    }

    #[test]
    fn entitled_render_carries_no_watermark() {
        let first = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false)).unwrap();
        let second = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false)).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn malformed_config_renders_error_surface() {
        let mut config = line_config();
        config.data.datasets.clear();
        let image = rasterize(&config, &RasterOptions::new(Theme::Light, false)).unwrap();
        // the error surface is a flat background with a message, not empty
        assert_eq!(image.width(), BASE_WIDTH);
        let background = rasterize(&config, &RasterOptions::new(Theme::Light, false)).unwrap();
        assert_eq!(image.as_raw(), background.as_raw());
    }

    #[test]
    fn footer_changes_output() {
        let plain = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false)).unwrap();
        let footed = rasterize(
            &line_config(),
            &RasterOptions::new(Theme::Dark, false).footer("generated with chartdeck"),
        )
        .unwrap();
        assert_ne!(plain.as_raw(), footed.as_raw());
    }

    #[test]
    fn pie_and_bar_render() {
        for chart_type in [ChartType::Pie, ChartType::Bar, ChartType::Scatter] {
            let mut config = line_config();
            config.chart_type = chart_type;
            rasterize(&config, &RasterOptions::new(Theme::Light, true)).unwrap();
        }
    }

    #[test]
    fn png_encoding_round_trips_dimensions() {
        let image = rasterize(&line_config(), &RasterOptions::new(Theme::Dark, false)).unwrap();
        let png = encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), BASE_WIDTH);
        assert_eq!(decoded.height(), BASE_HEIGHT);
    }
}
