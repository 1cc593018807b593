//! Capability boundary between the managers and the HTTP client, so
//! flows can run against a scripted backend in tests.

use async_trait::async_trait;
use chartdeck_api_types::{
    ApiMessage, AuthStatus, ChartDescriptor, CreateOrderResponse, NotificationPrefs,
    PasswordChange, PaymentConfirmation, ProfileUpdate, SaveChartRequest, SubscriptionPlan,
    SubscriptionResponse, SwitchPlanResponse, VerifyResponse, VerifySwitchRequest,
};
use chartdeck_client::{DashboardClient, Error};

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn auth_status(&self) -> Result<AuthStatus, Error>;
    async fn logout(&self) -> Result<(), Error>;
    async fn charts(&self, email: &str) -> Result<Vec<ChartDescriptor>, Error>;
    async fn delete_chart(&self, email: &str, serial: i64) -> Result<ApiMessage, Error>;
    async fn save_chart(&self, request: &SaveChartRequest) -> Result<ApiMessage, Error>;
    async fn subscription(&self) -> Result<SubscriptionResponse, Error>;
    async fn create_order(&self, plan: SubscriptionPlan) -> Result<CreateOrderResponse, Error>;
    async fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyResponse, Error>;
    async fn switch_plan(
        &self,
        new_plan: SubscriptionPlan,
        current_plan: SubscriptionPlan,
    ) -> Result<SwitchPlanResponse, Error>;
    async fn verify_switch(&self, request: &VerifySwitchRequest) -> Result<VerifyResponse, Error>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<ApiMessage, Error>;
    async fn change_password(&self, change: &PasswordChange) -> Result<ApiMessage, Error>;
    async fn set_notifications(&self, prefs: &NotificationPrefs) -> Result<ApiMessage, Error>;
    async fn delete_account(&self) -> Result<ApiMessage, Error>;
}

#[async_trait]
impl DashboardApi for DashboardClient {
    async fn auth_status(&self) -> Result<AuthStatus, Error> {
        DashboardClient::auth_status(self).await
    }

    async fn logout(&self) -> Result<(), Error> {
        DashboardClient::logout(self).await
    }

    async fn charts(&self, email: &str) -> Result<Vec<ChartDescriptor>, Error> {
        DashboardClient::charts(self, email).await
    }

    async fn delete_chart(&self, email: &str, serial: i64) -> Result<ApiMessage, Error> {
        DashboardClient::delete_chart(self, email, serial).await
    }

    async fn save_chart(&self, request: &SaveChartRequest) -> Result<ApiMessage, Error> {
        DashboardClient::save_chart(self, request).await
    }

    async fn subscription(&self) -> Result<SubscriptionResponse, Error> {
        DashboardClient::subscription(self).await
    }

    async fn create_order(&self, plan: SubscriptionPlan) -> Result<CreateOrderResponse, Error> {
        DashboardClient::create_order(self, plan).await
    }

    async fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyResponse, Error> {
        DashboardClient::verify_payment(self, confirmation).await
    }

    async fn switch_plan(
        &self,
        new_plan: SubscriptionPlan,
        current_plan: SubscriptionPlan,
    ) -> Result<SwitchPlanResponse, Error> {
        DashboardClient::switch_plan(self, new_plan, current_plan).await
    }

    async fn verify_switch(&self, request: &VerifySwitchRequest) -> Result<VerifyResponse, Error> {
        DashboardClient::verify_switch(self, request).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<ApiMessage, Error> {
        DashboardClient::update_profile(self, update).await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<ApiMessage, Error> {
        DashboardClient::change_password(self, change).await
    }

    async fn set_notifications(&self, prefs: &NotificationPrefs) -> Result<ApiMessage, Error> {
        DashboardClient::set_notifications(self, prefs).await
    }

    async fn delete_account(&self) -> Result<ApiMessage, Error> {
        DashboardClient::delete_account(self).await
    }
}
