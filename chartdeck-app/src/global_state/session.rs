//! Process-wide session state. One fetch on init, then a periodic
//! auth-status poll with an explicit start/stop lifecycle; the poll
//! timer is cleared on drop. Read-many/write-few: only login/logout and
//! profile updates mutate it.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chartdeck_api_types::{ProfileUpdate, UserData};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::DashboardApi;
use crate::error::AppResult;

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<UserData>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct SessionStore<A> {
    api: Arc<A>,
    state: Arc<RwLock<SessionState>>,
    poll: Option<JoinHandle<()>>,
}

impl<A: DashboardApi> SessionStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        SessionStore {
            api,
            state: Arc::new(RwLock::new(SessionState::default())),
            poll: None,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().expect("session lock").clone()
    }

    pub async fn refresh(&self) {
        {
            let mut state = self.state.write().expect("session lock");
            state.loading = true;
        }
        refresh_once(self.api.as_ref(), &self.state).await;
    }

    pub fn stop_polling(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.api.logout().await?;
        self.clear();
        Ok(())
    }

    pub(crate) fn clear(&self) {
        let mut state = self.state.write().expect("session lock");
        *state = SessionState::default();
    }

    pub(crate) fn apply_profile(&self, update: &ProfileUpdate) {
        let mut state = self.state.write().expect("session lock");
        if let Some(user) = state.user.as_mut() {
            user.name = update.name.clone();
            user.phone = update.phone.clone();
        }
    }
}

impl<A: DashboardApi + 'static> SessionStore<A> {
    /// Spawns the auth-status poll. A previous poll is stopped first so
    /// there is never more than one timer.
    pub fn start_polling(&mut self, interval: Duration) {
        self.stop_polling();
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        self.poll = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                refresh_once(api.as_ref(), &state).await;
            }
        }));
    }
}

impl<A> Drop for SessionStore<A> {
    fn drop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
    }
}

async fn refresh_once<A: DashboardApi>(api: &A, state: &RwLock<SessionState>) {
    match api.auth_status().await {
        Ok(status) => {
            let mut state = state.write().expect("session lock");
            state.is_authenticated = status.is_authenticated;
            state.user = status.user;
            state.loading = false;
            state.error = None;
        }
        Err(error) => {
            warn!("auth status poll failed: {error}");
            let mut state = state.write().expect("session lock");
            state.loading = false;
            state.error = Some(error.user_message());
        }
    }
}
