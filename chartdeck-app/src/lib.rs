//! Client-side application core for the chartdeck dashboard: session
//! and theme state, the saved-chart gallery, export/print pipelines,
//! and the subscription/checkout flows. Everything network-facing goes
//! through the [`api::DashboardApi`] trait so the controllers can be
//! driven by a mock in tests.

pub mod api;
pub mod error;
pub mod export;
pub mod gallery;
pub mod global_state;
pub mod settings;
pub mod subscription;

pub use error::{AppError, AppResult};

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chartdeck_api_types::{
        ApiMessage, AuthStatus, ChartConfig, ChartDescriptor, ChartDetails, ChartMetadata,
        ChartOptions, ChartType, CreateOrderResponse, Dataset, NotificationPrefs,
        PasswordChange, PaymentConfirmation, ProfileUpdate, RawData, SaveChartRequest,
        SubscriptionPlan, SubscriptionResponse, SwitchPlanResponse, VerifyResponse,
        VerifySwitchRequest, SCHEMA_VERSION,
    };
    use chartdeck_client::Error;
    use chrono::Utc;

    use crate::api::DashboardApi;
    use crate::subscription::{
        CheckoutOrder, CheckoutOutcome, CheckoutPrefill, PaymentGateway,
    };

    fn ok_message() -> Result<ApiMessage, String> {
        Ok(ApiMessage {
            success: true,
            message: None,
        })
    }

    /// Scriptable [`DashboardApi`]. Every response slot defaults to
    /// success; tests overwrite the slots they care about and inspect
    /// `calls` for the methods that were hit.
    pub struct MockApi {
        pub auth_status_response: Mutex<Result<AuthStatus, String>>,
        pub charts_response: Mutex<Result<Vec<ChartDescriptor>, String>>,
        pub delete_response: Mutex<Result<ApiMessage, String>>,
        pub save_response: Mutex<Result<ApiMessage, String>>,
        pub saved_charts: Mutex<Vec<SaveChartRequest>>,
        pub subscription_response: Mutex<Result<SubscriptionResponse, String>>,
        pub create_order_response: Mutex<Result<CreateOrderResponse, String>>,
        pub verify_response: Mutex<Result<VerifyResponse, String>>,
        pub switch_response: Mutex<Result<SwitchPlanResponse, String>>,
        pub verify_switch_response: Mutex<Result<VerifyResponse, String>>,
        pub profile_response: Mutex<Result<ApiMessage, String>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl MockApi {
        pub fn new() -> Self {
            MockApi {
                auth_status_response: Mutex::new(Ok(AuthStatus {
                    is_authenticated: false,
                    user: None,
                })),
                charts_response: Mutex::new(Ok(Vec::new())),
                delete_response: Mutex::new(ok_message()),
                save_response: Mutex::new(ok_message()),
                saved_charts: Mutex::new(Vec::new()),
                subscription_response: Mutex::new(Ok(SubscriptionResponse {
                    success: true,
                    subscription: None,
                })),
                create_order_response: Mutex::new(Ok(CreateOrderResponse {
                    success: true,
                    amount: 49900,
                    currency: "INR".into(),
                    order_id: "order_test".into(),
                })),
                verify_response: Mutex::new(Ok(VerifyResponse {
                    success: true,
                    subscription: None,
                    message: None,
                })),
                switch_response: Mutex::new(Ok(SwitchPlanResponse {
                    success: true,
                    requires_payment: false,
                    amount: None,
                    currency: None,
                    order_id: None,
                    subscription: None,
                    message: None,
                })),
                verify_switch_response: Mutex::new(Ok(VerifyResponse {
                    success: true,
                    subscription: None,
                    message: None,
                })),
                profile_response: Mutex::new(ok_message()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, method: &str) {
            self.calls.lock().unwrap().push(method.to_string());
        }

        fn take<T: Clone>(&self, slot: &Mutex<Result<T, String>>) -> Result<T, Error> {
            slot.lock().unwrap().clone().map_err(|message| Error::Api {
                status: 500,
                message,
            })
        }
    }

    #[async_trait]
    impl DashboardApi for MockApi {
        async fn auth_status(&self) -> Result<AuthStatus, Error> {
            self.record("auth_status");
            self.take(&self.auth_status_response)
        }

        async fn logout(&self) -> Result<(), Error> {
            self.record("logout");
            Ok(())
        }

        async fn charts(&self, _email: &str) -> Result<Vec<ChartDescriptor>, Error> {
            self.record("charts");
            self.take(&self.charts_response)
        }

        async fn delete_chart(&self, _email: &str, _serial: i64) -> Result<ApiMessage, Error> {
            self.record("delete_chart");
            self.take(&self.delete_response)
        }

        async fn save_chart(&self, request: &SaveChartRequest) -> Result<ApiMessage, Error> {
            self.record("save_chart");
            let response = self.take(&self.save_response)?;
            self.saved_charts.lock().unwrap().push(request.clone());
            Ok(response)
        }

        async fn subscription(&self) -> Result<SubscriptionResponse, Error> {
            self.record("subscription");
            self.take(&self.subscription_response)
        }

        async fn create_order(
            &self,
            _plan: SubscriptionPlan,
        ) -> Result<CreateOrderResponse, Error> {
            self.record("create_order");
            self.take(&self.create_order_response)
        }

        async fn verify_payment(
            &self,
            _confirmation: &PaymentConfirmation,
        ) -> Result<VerifyResponse, Error> {
            self.record("verify_payment");
            self.take(&self.verify_response)
        }

        async fn switch_plan(
            &self,
            _new_plan: SubscriptionPlan,
            _current_plan: SubscriptionPlan,
        ) -> Result<SwitchPlanResponse, Error> {
            self.record("switch_plan");
            self.take(&self.switch_response)
        }

        async fn verify_switch(
            &self,
            _request: &VerifySwitchRequest,
        ) -> Result<VerifyResponse, Error> {
            self.record("verify_switch");
            self.take(&self.verify_switch_response)
        }

        async fn update_profile(&self, _update: &ProfileUpdate) -> Result<ApiMessage, Error> {
            self.record("update_profile");
            self.take(&self.profile_response)
        }

        async fn change_password(&self, _change: &PasswordChange) -> Result<ApiMessage, Error> {
            self.record("change_password");
            Ok(ApiMessage {
                success: true,
                message: None,
            })
        }

        async fn set_notifications(&self, _prefs: &NotificationPrefs) -> Result<ApiMessage, Error> {
            self.record("set_notifications");
            Ok(ApiMessage {
                success: true,
                message: None,
            })
        }

        async fn delete_account(&self) -> Result<ApiMessage, Error> {
            self.record("delete_account");
            Ok(ApiMessage {
                success: true,
                message: None,
            })
        }
    }

    /// Gateway whose outcome is fixed up front.
    pub struct ScriptedGateway {
        pub ready: bool,
        outcome: CheckoutOutcome,
    }

    impl ScriptedGateway {
        pub fn completing() -> Self {
            ScriptedGateway {
                ready: true,
                outcome: CheckoutOutcome::Completed(PaymentConfirmation {
                    razorpay_payment_id: "pay_test".into(),
                    razorpay_order_id: "order_test".into(),
                    razorpay_signature: "sig_test".into(),
                }),
            }
        }

        pub fn failing(reason: &str) -> Self {
            ScriptedGateway {
                ready: true,
                outcome: CheckoutOutcome::Failed {
                    reason: reason.to_string(),
                },
            }
        }

        pub fn dismissing() -> Self {
            ScriptedGateway {
                ready: true,
                outcome: CheckoutOutcome::Dismissed,
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for ScriptedGateway {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn open_checkout(
            &self,
            _order: &CheckoutOrder,
            _prefill: &CheckoutPrefill,
        ) -> CheckoutOutcome {
            self.outcome.clone()
        }
    }

    pub fn line_config() -> ChartConfig {
        ChartConfig {
            chart_type: ChartType::Line,
            data: RawData {
                labels: vec!["Jan".into(), "Feb".into(), "Mar".into()],
                datasets: vec![Dataset {
                    label: "Revenue".into(),
                    data: vec![10.0, 25.0, 18.0],
                    color: Some("#36a2eb".into()),
                }],
            },
            options: ChartOptions::default(),
            custom_styles: None,
        }
    }

    pub fn descriptor(serial: i64) -> ChartDescriptor {
        ChartDescriptor {
            serial,
            chart_details: ChartDetails {
                metadata: ChartMetadata {
                    name: format!("chart {serial}"),
                    saved_at: Utc::now(),
                    version: SCHEMA_VERSION.to_string(),
                },
                chart_config: line_config(),
                raw_data: line_config().data,
            },
        }
    }
}
