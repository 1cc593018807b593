//! Renders a [`ChartConfig`] onto any plotters [`DrawingBackend`].
//!
//! A backend is consumed per render, so callers get a fresh surface on
//! every invocation; rebinding never leaks a previous chart instance.
//! When the caller is not entitled to watermark-free output, a
//! semi-transparent watermark is drawn after the base chart so library
//! redraws cannot erase it.

#[cfg(feature = "image")]
mod raster;

#[cfg(feature = "image")]
pub use raster::{encode_png, rasterize, RasterOptions, BASE_HEIGHT, BASE_WIDTH};

use anyhow::anyhow;
use chartdeck_api_types::{ChartConfig, ChartType, Dataset};
use itertools::Itertools;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::full_palette::{ORANGE, PURPLE, TEAL};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

pub use plotters::style::RGBColor;

pub const WATERMARK_TEXT: &str = "CHARTDECK FREE";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Color tokens derived from the theme, applied to legend text, grid
/// lines, axis ticks, and captions.
struct ThemeTokens {
    background: RGBColor,
    text: RGBColor,
    grid_bold: RGBAColor,
    grid_light: RGBAColor,
    outline: RGBColor,
    watermark: RGBAColor,
}

impl Theme {
    fn tokens(&self) -> ThemeTokens {
        match self {
            Theme::Dark => ThemeTokens {
                background: RGBColor(16, 10, 18),
                text: RGBColor(229, 231, 235),
                grid_bold: RGBColor(200, 200, 200).mix(0.2),
                grid_light: RGBColor(200, 200, 200).mix(0.02),
                outline: RGBColor(107, 114, 128),
                watermark: RGBColor(229, 231, 235).mix(0.22),
            },
            Theme::Light => ThemeTokens {
                background: RGBColor(250, 250, 252),
                text: RGBColor(31, 41, 55),
                grid_bold: RGBColor(55, 55, 55).mix(0.2),
                grid_light: RGBColor(55, 55, 55).mix(0.04),
                outline: RGBColor(156, 163, 175),
                watermark: RGBColor(31, 41, 55).mix(0.18),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub theme: Theme,
    /// Draw the restricted-usage watermark over the plot area.
    pub watermarked: bool,
    /// Overrides the theme background when set (pastel download fills).
    pub background: Option<RGBColor>,
}

impl RenderOptions {
    pub fn new(theme: Theme, watermarked: bool) -> Self {
        RenderOptions {
            theme,
            watermarked,
            background: None,
        }
    }
}

const SERIES_PALETTE: [RGBColor; 8] = [
    RGBColor(54, 162, 235),
    RGBColor(255, 99, 132),
    RGBColor(75, 192, 120),
    ORANGE,
    PURPLE,
    TEAL,
    RGBColor(255, 205, 86),
    MAGENTA,
];

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(RGBColor(
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
    ))
}

fn series_color(dataset: &Dataset, index: usize) -> RGBColor {
    dataset
        .color
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or(SERIES_PALETTE[index % SERIES_PALETTE.len()])
}

/// Draws the whole chart for one render cycle. Malformed configs (no
/// datasets, no data points) fail here; callers replace the surface with
/// [`draw_error_message`] in that case.
pub fn draw_chart<'a, DB>(
    backend: DB,
    config: &ChartConfig,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let tokens = options.theme.tokens();
    let root = backend.into_drawing_area();
    root.fill(&options.background.unwrap_or(tokens.background))?;

    let data = &config.data;
    if data.datasets.is_empty() {
        Err(anyhow!("chart has no datasets"))?;
    }
    if data.datasets.iter().all(|d| d.data.is_empty()) {
        Err(anyhow!("chart has no data points"))?;
    }

    match config.chart_type {
        ChartType::Pie => draw_pie(&root, config, &tokens)?,
        ChartType::Line | ChartType::Bar | ChartType::Scatter => {
            draw_cartesian(&root, config, &tokens)?
        }
    }

    if options.watermarked {
        draw_watermark(&root, &tokens)?;
    }

    // To avoid the IO failure being ignored silently, we manually call the present function
    root.present()?;
    Ok(())
}

fn draw_cartesian<'a, DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    config: &ChartConfig,
    tokens: &ThemeTokens,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let data = &config.data;
    let point_count = data
        .datasets
        .iter()
        .map(|d| d.data.len())
        .max()
        .unwrap_or(0);
    let (y_min, y_max) = data
        .datasets
        .iter()
        .flat_map(|d| d.data.iter().copied())
        .minmax()
        .into_option()
        .ok_or_else(|| anyhow!("chart has no data points"))?;
    let y_floor = if config.chart_type == ChartType::Bar {
        y_min.min(0.0)
    } else {
        y_min
    };
    let y_span = (y_max - y_floor).abs().max(f64::EPSILON);
    let y_range = y_floor..(y_max + y_span * 0.05);
    let x_range = 0f64..(point_count as f64);

    let axis_labels = data.labels.clone();
    let label_formatter = move |x: &f64| {
        axis_labels
            .get(x.floor() as usize)
            .cloned()
            .unwrap_or_default()
    };

    let mut builder = ChartBuilder::on(root);
    builder
        .x_label_area_size(48)
        .y_label_area_size(64)
        .margin(12);
    if let Some(title) = &config.options.title {
        builder.caption(title, ("sans-serif", 22.0).into_font().color(&tokens.text));
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    let mut mesh = chart.configure_mesh();
    mesh.label_style(&tokens.text)
        .bold_line_style(tokens.grid_bold)
        .light_line_style(tokens.grid_light)
        .axis_style(tokens.outline)
        .x_labels(data.labels.len().clamp(2, 12))
        .x_label_formatter(&label_formatter);
    if let Some(x_desc) = &config.options.x_label {
        mesh.x_desc(x_desc.clone());
    }
    if let Some(y_desc) = &config.options.y_label {
        mesh.y_desc(y_desc.clone());
    }
    if !config.options.show_grid {
        mesh.disable_x_mesh().disable_y_mesh();
    }
    mesh.draw()?;

    for (index, dataset) in data.datasets.iter().enumerate() {
        let color = series_color(dataset, index);
        let points = dataset
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v));
        match config.chart_type {
            ChartType::Line => {
                chart
                    .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                    .label(dataset.label.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                    });
            }
            ChartType::Scatter => {
                chart
                    .draw_series(points.map(|p| Circle::new(p, 4, color.filled())))?
                    .label(dataset.label.clone())
                    .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
            }
            ChartType::Bar => {
                // Each dataset gets a sub-slot within the label's unit cell.
                let slots = data.datasets.len() as f64;
                let slot_width = 0.8 / slots;
                chart
                    .draw_series(points.map(|(x, y)| {
                        let x0 = x + 0.1 + index as f64 * slot_width;
                        Rectangle::new([(x0, 0.0), (x0 + slot_width, y)], color.filled())
                    }))?
                    .label(dataset.label.clone())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled())
                    });
            }
            ChartType::Pie => unreachable!("pie charts use the radial path"),
        }
    }

    if config.options.show_legend {
        chart
            .configure_series_labels()
            .border_style(tokens.outline)
            .label_font(&tokens.text)
            .draw()?;
    }
    Ok(())
}

fn draw_pie<'a, DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    config: &ChartConfig,
    tokens: &ThemeTokens,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let data = &config.data;
    let dataset = data
        .datasets
        .first()
        .ok_or_else(|| anyhow!("pie chart has no dataset"))?;
    if dataset.data.iter().any(|v| *v < 0.0) {
        Err(anyhow!("pie chart has negative slice"))?;
    }
    let sizes: Vec<f64> = dataset.data.clone();
    if sizes.iter().sum::<f64>() <= 0.0 {
        Err(anyhow!("pie chart slices sum to zero"))?;
    }
    let colors: Vec<RGBColor> = (0..sizes.len())
        .map(|i| SERIES_PALETTE[i % SERIES_PALETTE.len()])
        .collect();
    let labels: Vec<String> = (0..sizes.len())
        .map(|i| data.labels.get(i).cloned().unwrap_or_else(|| format!("#{i}")))
        .collect();

    if let Some(title) = &config.options.title {
        let style = ("sans-serif", 22.0)
            .into_font()
            .color(&tokens.text)
            .pos(Pos::new(HPos::Center, VPos::Top));
        let (width, _) = root.dim_in_pixel();
        root.draw(&Text::new(title.clone(), ((width / 2) as i32, 8), style))?;
    }

    let (width, height) = root.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = (width.min(height) as f64) * 0.35;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(-90.0);
    pie.label_style(("sans-serif", 16.0).into_font().color(&tokens.text));
    root.draw(&pie)?;
    Ok(())
}

/// Watermark drawn over the finished plot; drawn last on purpose so a
/// redraw of the base chart cannot erase it.
fn draw_watermark<'a, DB>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    tokens: &ThemeTokens,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let (width, height) = root.dim_in_pixel();
    let style = ("sans-serif", (width / 9).max(24) as f64)
        .into_font()
        .color(&tokens.watermark)
        .transform(FontTransform::Rotate270)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        WATERMARK_TEXT,
        ((width / 2) as i32, (height / 2) as i32),
        style,
    ))?;
    Ok(())
}

/// Terminal in-surface error rendering for a failed render cycle. The
/// surface stays in this state until the inputs change.
pub fn draw_error_message<'a, DB>(
    backend: DB,
    theme: Theme,
    message: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'a>>
where
    DB: DrawingBackend + 'a,
{
    let tokens = theme.tokens();
    let root = backend.into_drawing_area();
    root.fill(&tokens.background)?;
    let (width, height) = root.dim_in_pixel();
    let style = ("sans-serif", 18.0)
        .into_font()
        .color(&tokens.text)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        format!("Unable to render chart: {message}"),
        ((width / 2) as i32, (height / 2) as i32),
        style,
    ))?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#36a2eb"), Some(RGBColor(0x36, 0xa2, 0xeb)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("36a2eb"), None);
    }

    #[test]
    fn series_color_falls_back_to_palette() {
        let dataset = Dataset {
            label: "a".into(),
            data: vec![1.0],
            color: Some("not-a-color".into()),
        };
        assert_eq!(series_color(&dataset, 1), SERIES_PALETTE[1]);
    }
}
