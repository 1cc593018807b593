//! Account settings: profile, password, notification preferences,
//! theme, and account deletion.

use std::sync::Arc;

use chartdeck_api_types::{NotificationPrefs, PasswordChange, ProfileUpdate};
use tracing::info;

use crate::api::DashboardApi;
use crate::global_state::session::SessionStore;
use crate::global_state::theme::ThemeMode;
use crate::global_state::toasts::Toasts;

pub struct SettingsController<A> {
    api: Arc<A>,
    toasts: Toasts,
    pub theme: ThemeMode,
    saving: bool,
}

impl<A: DashboardApi> SettingsController<A> {
    pub fn new(api: Arc<A>, toasts: Toasts, theme: ThemeMode) -> Self {
        SettingsController {
            api,
            toasts,
            theme,
            saving: false,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Saves the profile and mirrors the accepted values into the
    /// session so the header updates without waiting for the next
    /// auth poll.
    pub async fn update_profile(&mut self, update: ProfileUpdate, session: &SessionStore<A>) {
        if self.saving {
            return;
        }
        self.saving = true;
        match self.api.update_profile(&update).await {
            Ok(response) if response.success => {
                session.apply_profile(&update);
                self.toasts.success("Profile updated");
            }
            Ok(response) => self.toasts.error(
                response
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            ),
            Err(error) => self.toasts.error(error.user_message()),
        }
        self.saving = false;
    }

    /// `confirm` is the re-typed password from the form; it never goes
    /// over the wire.
    pub async fn change_password(&mut self, change: PasswordChange, confirm: &str) {
        if self.saving {
            return;
        }
        if change.new_password != confirm {
            self.toasts.error("New passwords do not match");
            return;
        }
        self.saving = true;
        match self.api.change_password(&change).await {
            Ok(response) if response.success => self.toasts.success("Password changed"),
            Ok(response) => self.toasts.error(
                response
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            ),
            Err(error) => self.toasts.error(error.user_message()),
        }
        self.saving = false;
    }

    pub async fn set_notifications(&mut self, prefs: NotificationPrefs) {
        match self.api.set_notifications(&prefs).await {
            Ok(response) if response.success => self.toasts.success("Preferences saved"),
            Ok(response) => self.toasts.error(
                response
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            ),
            Err(error) => self.toasts.error(error.user_message()),
        }
    }

    /// Local only; theme never round-trips through the backend.
    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        info!("theme set to {}", self.theme.as_str());
        self.theme
    }

    /// Deletes the account and drops the local session on success.
    pub async fn delete_account(&mut self, session: &SessionStore<A>) {
        if self.saving {
            return;
        }
        self.saving = true;
        match self.api.delete_account().await {
            Ok(response) if response.success => {
                session.clear();
                self.toasts.info("Account deleted");
            }
            Ok(response) => self.toasts.error(
                response
                    .message
                    .unwrap_or_else(|| "Request failed".to_string()),
            ),
            Err(error) => self.toasts.error(error.user_message()),
        }
        self.saving = false;
    }
}
