use std::path::PathBuf;

use anyhow::{anyhow, Context};
use chartdeck_charts::{encode_png, rasterize, RasterOptions, Theme};
use chartdeck_client::DashboardClient;
use clap::Parser;

/// Renders saved charts from a chartdeck account to PNG files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Account email whose gallery should be exported
    #[arg(short, long)]
    email: String,

    /// Export a single chart by serial instead of the whole gallery
    #[arg(short, long)]
    serial: Option<i64>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Integer upscaling factor
    #[arg(long, default_value_t = 3)]
    scale: u32,

    /// Render with the light theme
    #[arg(long)]
    light: bool,

    /// Backend base URL; falls back to CHARTDECK_API_URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let api_url = match args.api_url {
        Some(url) => url,
        None => std::env::var("CHARTDECK_API_URL")
            .context("pass --api-url or set CHARTDECK_API_URL")?,
    };
    let mut client = DashboardClient::new(&api_url, "chart-export")?;
    if let Ok(token) = std::env::var("CHARTDECK_TOKEN") {
        client = client.with_token(token);
    }

    let subscribed = match client.subscription().await {
        Ok(response) => response
            .subscription
            .map(|sub| sub.active && sub.plan.is_paid())
            .unwrap_or(false),
        Err(_) => false,
    };
    let theme = if args.light { Theme::Light } else { Theme::Dark };

    let charts = client.charts(&args.email).await?;
    let charts: Vec<_> = match args.serial {
        Some(serial) => {
            let chart = charts
                .into_iter()
                .find(|c| c.serial == serial)
                .ok_or_else(|| anyhow!("no chart with serial {serial}"))?;
            vec![chart]
        }
        None => charts,
    };
    if charts.is_empty() {
        println!("No saved charts for {}.", args.email);
        return Ok(());
    }

    std::fs::create_dir_all(&args.out)?;
    let options = RasterOptions::new(theme, !subscribed).scale(args.scale);
    for chart in &charts {
        let image = rasterize(&chart.chart_details.chart_config, &options)?;
        let bytes = encode_png(&image)?;
        let name = file_stem(&chart.chart_details.metadata.name, chart.serial);
        let path = args.out.join(format!("{name}.png"));
        std::fs::write(&path, bytes)?;
        println!("Wrote {}", path.display());
    }
    println!("Exported {} chart(s).", charts.len());

    Ok(())
}

fn file_stem(name: &str, serial: i64) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        format!("chart-{serial}")
    } else {
        format!("{cleaned}-{serial}")
    }
}
