//! Saved-chart gallery: list fetch, delete, download with the
//! entitlement gate, and the list/modal view state machine. The zoom
//! transitions are modeled as explicit timed states so the swap of
//! `view_mode` stays decoupled from the visual animation.

use std::sync::Arc;
use std::time::Duration;

use chartdeck_api_types::{ChartDescriptor, ChartOptions, ChartType, RawData};
use chartdeck_charts::{encode_png, rasterize, RGBColor, RasterOptions};
use colorsys::{Hsl, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::DashboardApi;
use crate::error::{AppError, AppResult};
use crate::export::{artifact_file_name, ExportArtifact};
use crate::global_state::theme::ThemeMode;
use crate::global_state::toasts::Toasts;

/// Gate before `view_mode` swaps; mirrors the zoom animation length.
pub const VIEW_TRANSITION: Duration = Duration::from_millis(300);

const DOWNLOAD_FOOTER: &str = "made with chartdeck";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Modal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewTransition {
    Idle,
    ZoomingIn,
    ZoomingOut,
}

/// Handoff payload for the external editor; edits are committed by the
/// editor, never by the gallery.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub serial: i64,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: RawData,
    pub options: ChartOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_styles: Option<Value>,
    pub is_edit: bool,
}

pub enum DownloadOutcome {
    Artifact(ExportArtifact),
    /// Non-entitled user: the intended serial is recorded so the upsell
    /// prompt can resume the download.
    Upsell,
}

pub struct GalleryManager<A> {
    api: Arc<A>,
    toasts: Toasts,
    pub charts: Vec<ChartDescriptor>,
    pub loading: bool,
    pub error: Option<String>,
    pub view_mode: ViewMode,
    pub transition: ViewTransition,
    pub selected: Option<i64>,
    pub entitled: bool,
    theme: ThemeMode,
    pending_download: Option<i64>,
    rng: StdRng,
}

impl<A: DashboardApi> GalleryManager<A> {
    pub fn new(api: Arc<A>, toasts: Toasts, theme: ThemeMode, entitled: bool) -> Self {
        Self::with_rng(api, toasts, theme, entitled, StdRng::from_entropy())
    }

    pub fn with_rng(
        api: Arc<A>,
        toasts: Toasts,
        theme: ThemeMode,
        entitled: bool,
        rng: StdRng,
    ) -> Self {
        GalleryManager {
            api,
            toasts,
            charts: Vec::new(),
            loading: false,
            error: None,
            view_mode: ViewMode::List,
            transition: ViewTransition::Idle,
            selected: None,
            entitled,
            theme,
            pending_download: None,
            rng,
        }
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
    }

    pub fn set_entitled(&mut self, entitled: bool) {
        self.entitled = entitled;
    }

    /// Replaces the local list wholesale; there is no incremental merge.
    /// On failure the error panel state is set and the stale list kept
    /// for the retry action.
    pub async fn fetch_gallery(&mut self, email: &str) {
        self.loading = true;
        self.error = None;
        match self.api.charts(email).await {
            Ok(charts) => {
                info!(count = charts.len(), "gallery loaded");
                self.charts = charts;
            }
            Err(error) => {
                self.error = Some(error.user_message());
            }
        }
        self.loading = false;
    }

    pub async fn delete_chart(&mut self, email: &str, serial: i64) {
        match self.api.delete_chart(email, serial).await {
            Ok(message) if message.success => {
                // fresh filtered list on purpose, list identity is not kept
                self.charts = self
                    .charts
                    .iter()
                    .filter(|c| c.serial != serial)
                    .cloned()
                    .collect();
                if self.selected == Some(serial) {
                    self.view_mode = ViewMode::List;
                    self.selected = None;
                    self.transition = ViewTransition::Idle;
                }
                self.toasts.success("Chart deleted");
            }
            Ok(message) => {
                self.toasts.error(
                    message
                        .message
                        .unwrap_or_else(|| "Failed to delete chart".to_string()),
                );
            }
            Err(error) => {
                self.toasts.error(error.user_message());
            }
        }
    }

    /// Entitlement gate: the first attempt by a non-entitled user is
    /// intercepted into an upsell and the target recorded. The produced
    /// asset is watermarked exactly like the on-screen render.
    pub fn download_chart(&mut self, serial: i64) -> AppResult<DownloadOutcome> {
        if !self.entitled && self.pending_download != Some(serial) {
            self.pending_download = Some(serial);
            return Ok(DownloadOutcome::Upsell);
        }
        self.pending_download = None;
        self.render_download(serial).map(DownloadOutcome::Artifact)
    }

    /// Proceeds with the download recorded by the upsell interception.
    pub fn resume_pending_download(&mut self) -> AppResult<Option<ExportArtifact>> {
        let Some(serial) = self.pending_download.take() else {
            return Ok(None);
        };
        self.render_download(serial).map(Some)
    }

    fn render_download(&mut self, serial: i64) -> AppResult<ExportArtifact> {
        let descriptor = self
            .charts
            .iter()
            .find(|c| c.serial == serial)
            .ok_or_else(|| AppError::Message(format!("chart {serial} is not in the gallery")))?;
        let details = &descriptor.chart_details;

        let hue = self.rng.gen_range(0.0..360.0);
        let pastel = Rgb::from(Hsl::new(hue, 70.0, 85.0, None));
        let background = RGBColor(
            pastel.red().round() as u8,
            pastel.green().round() as u8,
            pastel.blue().round() as u8,
        );

        let options = RasterOptions::new(self.theme.chart_theme(), !self.entitled)
            .background(background)
            .footer(DOWNLOAD_FOOTER);
        let image = rasterize(&details.chart_config, &options)
            .map_err(|e| AppError::Render(e.to_string()))?;
        let bytes = encode_png(&image).map_err(|e| AppError::Export(e.to_string()))?;
        Ok(ExportArtifact {
            file_name: artifact_file_name(&details.metadata.name, Some(serial), "png"),
            mime: "image/png",
            bytes,
        })
    }

    /// `Idle -> ZoomingIn -> Idle`; the mode swaps only after the gate.
    pub async fn view_chart(&mut self, serial: i64) {
        if !self.charts.iter().any(|c| c.serial == serial) {
            return;
        }
        self.selected = Some(serial);
        self.transition = ViewTransition::ZoomingIn;
        tokio::time::sleep(VIEW_TRANSITION).await;
        self.view_mode = ViewMode::Modal;
        self.transition = ViewTransition::Idle;
    }

    /// `Idle -> ZoomingOut -> Idle`; always lands on the list with no
    /// selection.
    pub async fn close_view(&mut self) {
        self.transition = ViewTransition::ZoomingOut;
        tokio::time::sleep(VIEW_TRANSITION).await;
        self.view_mode = ViewMode::List;
        self.selected = None;
        self.transition = ViewTransition::Idle;
    }

    pub fn edit_chart(&self, serial: i64) -> Option<EditRequest> {
        let descriptor = self.charts.iter().find(|c| c.serial == serial)?;
        let config = &descriptor.chart_details.chart_config;
        Some(EditRequest {
            serial,
            chart_type: config.chart_type,
            data: config.data.clone(),
            options: config.options.clone(),
            custom_styles: config.custom_styles.clone(),
            is_edit: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{descriptor, MockApi};
    use chartdeck_api_types::ApiMessage;

    fn manager(api: Arc<MockApi>) -> GalleryManager<MockApi> {
        GalleryManager::with_rng(
            api,
            Toasts::new(),
            ThemeMode::Dark,
            false,
            StdRng::seed_from_u64(7),
        )
    }

    #[tokio::test]
    async fn fetch_replaces_list_wholesale() {
        let api = Arc::new(MockApi::new());
        *api.charts_response.lock().unwrap() = Ok(vec![descriptor(1), descriptor(2)]);
        let mut gallery = manager(Arc::clone(&api));
        gallery.charts = vec![descriptor(9)];
        gallery.fetch_gallery("a@b.c").await;
        let serials: Vec<i64> = gallery.charts.iter().map(|c| c.serial).collect();
        assert_eq!(serials, vec![1, 2]);
        assert!(gallery.error.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_sets_error_panel() {
        let api = Arc::new(MockApi::new());
        *api.charts_response.lock().unwrap() = Err("backend down".into());
        let mut gallery = manager(api);
        gallery.fetch_gallery("a@b.c").await;
        assert_eq!(gallery.error.as_deref(), Some("backend down"));
        assert!(!gallery.loading);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_target_serial() {
        let api = Arc::new(MockApi::new());
        let mut gallery = manager(api);
        gallery.charts = vec![descriptor(1), descriptor(2)];
        gallery.delete_chart("a@b.c", 1).await;
        let serials: Vec<i64> = gallery.charts.iter().map(|c| c.serial).collect();
        assert_eq!(serials, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_open_chart_closes_the_modal() {
        let api = Arc::new(MockApi::new());
        let mut gallery = manager(api);
        gallery.charts = vec![descriptor(1), descriptor(2)];
        gallery.view_chart(1).await;
        assert_eq!(gallery.view_mode, ViewMode::Modal);

        gallery.delete_chart("a@b.c", 1).await;
        assert_eq!(gallery.view_mode, ViewMode::List);
        assert_eq!(gallery.selected, None);
        assert_eq!(
            gallery.charts.iter().map(|c| c.serial).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[tokio::test]
    async fn failed_delete_leaves_list_unchanged() {
        let api = Arc::new(MockApi::new());
        *api.delete_response.lock().unwrap() = Ok(ApiMessage {
            success: false,
            message: Some("no such chart".into()),
        });
        let toasts = Toasts::new();
        let mut gallery = GalleryManager::with_rng(
            api,
            toasts.clone(),
            ThemeMode::Dark,
            false,
            StdRng::seed_from_u64(7),
        );
        gallery.charts = vec![descriptor(1)];
        gallery.delete_chart("a@b.c", 99).await;
        assert_eq!(gallery.charts.len(), 1);
        let active = toasts.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "no such chart");
    }

    #[tokio::test(start_paused = true)]
    async fn view_then_close_returns_to_list() {
        let api = Arc::new(MockApi::new());
        let mut gallery = manager(api);
        gallery.charts = vec![descriptor(5)];

        gallery.view_chart(5).await;
        assert_eq!(gallery.view_mode, ViewMode::Modal);
        assert_eq!(gallery.selected, Some(5));
        assert_eq!(gallery.transition, ViewTransition::Idle);

        gallery.close_view().await;
        assert_eq!(gallery.view_mode, ViewMode::List);
        assert_eq!(gallery.selected, None);
        assert_eq!(gallery.transition, ViewTransition::Idle);
    }

    #[tokio::test]
    async fn download_gate_upsells_then_resumes_watermarked() {
        let api = Arc::new(MockApi::new());
        let mut gallery = manager(api);
        gallery.charts = vec![descriptor(3)];

        match gallery.download_chart(3).unwrap() {
            DownloadOutcome::Upsell => {}
            DownloadOutcome::Artifact(_) => panic!("expected upsell for non-entitled user"),
        }
        let artifact = gallery.resume_pending_download().unwrap().unwrap();
        assert!(artifact.file_name.ends_with(".png"));
        assert!(!artifact.bytes.is_empty());
    }

    #[tokio::test]
    async fn entitled_download_skips_the_gate() {
        let api = Arc::new(MockApi::new());
        let mut gallery = manager(api);
        gallery.set_entitled(true);
        gallery.charts = vec![descriptor(3)];
        match gallery.download_chart(3).unwrap() {
            DownloadOutcome::Artifact(artifact) => {
                assert_eq!(artifact.mime, "image/png");
            }
            DownloadOutcome::Upsell => panic!("entitled download must not upsell"),
        }
    }

    #[test]
    fn edit_request_carries_full_config() {
        let api = Arc::new(MockApi::new());
        let mut gallery = GalleryManager::with_rng(
            api,
            Toasts::new(),
            ThemeMode::Dark,
            true,
            StdRng::seed_from_u64(1),
        );
        gallery.charts = vec![descriptor(4)];
        let edit = gallery.edit_chart(4).unwrap();
        assert!(edit.is_edit);
        assert_eq!(edit.serial, 4);
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["isEdit"], true);
        assert!(json["type"].is_string());
    }
}
