//! HTTP client for the chartdeck dashboard backend.
//!
//! Every call maps to one endpoint; non-2xx responses are surfaced as
//! [`Error::Api`] carrying the backend's `message` field when one is
//! present in the body.

use chartdeck_api_types::{
    ApiMessage, AuthStatus, ChartDescriptor, CreateOrderRequest, CreateOrderResponse,
    GalleryResponse, NotificationPrefs, PasswordChange, PaymentConfirmation, ProfileUpdate,
    SaveChartRequest, SubscriptionPlan, SubscriptionResponse, SwitchPlanRequest,
    SwitchPlanResponse, VerifyResponse, VerifySwitchRequest,
};
use log::info;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl Error {
    /// The message the user should see for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DashboardClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl DashboardClient {
    pub fn new(base_url: &str, user_agent: impl ToString) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .cookie_store(true)
            .build()?;
        Ok(DashboardClient {
            client,
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// Bearer credential attached to mutating chart calls.
    pub fn with_token(mut self, token: impl ToString) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn auth_status(&self) -> Result<AuthStatus, Error> {
        let url = self.url("auth/status")?;
        expect_json(self.client.get(url).send().await?).await
    }

    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.url("logout")?;
        check_status(self.client.post(url).send().await?).await?;
        Ok(())
    }

    pub async fn charts(&self, email: &str) -> Result<Vec<ChartDescriptor>, Error> {
        let url = self.url(&format!("chartRoutes/charts/{email}"))?;
        info!("fetching gallery: {url}");
        let gallery: GalleryResponse = expect_json(self.client.get(url).send().await?).await?;
        Ok(gallery.charts)
    }

    pub async fn delete_chart(&self, email: &str, serial: i64) -> Result<ApiMessage, Error> {
        let url = self.url(&format!("chartRoutes/delete/{email}/{serial}"))?;
        info!("deleting chart {serial}");
        expect_json(self.bearer(self.client.delete(url)).send().await?).await
    }

    pub async fn save_chart(&self, request: &SaveChartRequest) -> Result<ApiMessage, Error> {
        let url = self.url("chartRoutes/save")?;
        info!("saving chart '{}'", request.chart_details.metadata.name);
        expect_json(self.bearer(self.client.post(url)).json(request).send().await?).await
    }

    pub async fn subscription(&self) -> Result<SubscriptionResponse, Error> {
        let url = self.url("api/subscription")?;
        expect_json(self.client.get(url).send().await?).await
    }

    pub async fn create_order(
        &self,
        plan: SubscriptionPlan,
    ) -> Result<CreateOrderResponse, Error> {
        let url = self.url("api/payment/create-order")?;
        info!("creating order for plan {}", plan.as_str());
        let body = CreateOrderRequest { plan };
        expect_json(self.bearer(self.client.post(url)).json(&body).send().await?).await
    }

    pub async fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyResponse, Error> {
        let url = self.url("api/payment/verify")?;
        expect_json(
            self.bearer(self.client.post(url))
                .json(confirmation)
                .send()
                .await?,
        )
        .await
    }

    pub async fn switch_plan(
        &self,
        new_plan: SubscriptionPlan,
        current_plan: SubscriptionPlan,
    ) -> Result<SwitchPlanResponse, Error> {
        let url = self.url("api/payment/switch-plan")?;
        info!(
            "switching plan {} -> {}",
            current_plan.as_str(),
            new_plan.as_str()
        );
        let body = SwitchPlanRequest {
            new_plan,
            current_plan,
        };
        expect_json(self.bearer(self.client.post(url)).json(&body).send().await?).await
    }

    pub async fn verify_switch(
        &self,
        request: &VerifySwitchRequest,
    ) -> Result<VerifyResponse, Error> {
        let url = self.url("api/payment/verify-switch")?;
        expect_json(self.bearer(self.client.post(url)).json(request).send().await?).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ApiMessage, Error> {
        let url = self.url("user/profile")?;
        expect_json(self.bearer(self.client.put(url)).json(update).send().await?).await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<ApiMessage, Error> {
        let url = self.url("user/password")?;
        expect_json(self.bearer(self.client.put(url)).json(change).send().await?).await
    }

    pub async fn set_notifications(
        &self,
        prefs: &NotificationPrefs,
    ) -> Result<ApiMessage, Error> {
        let url = self.url("user/notifications")?;
        expect_json(self.bearer(self.client.put(url)).json(prefs).send().await?).await
    }

    pub async fn delete_account(&self) -> Result<ApiMessage, Error> {
        let url = self.url("user")?;
        expect_json(self.bearer(self.client.delete(url)).send().await?).await
    }
}

async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // The backend reports failures as {success:false, message}. Fall back
    // to the status line when the body isn't that shape.
    let message = match response.text().await {
        Ok(body) => serde_json::from_str::<ApiMessage>(&body)
            .ok()
            .and_then(|m| m.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        Err(_) => "request failed".to_string(),
    };
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}
