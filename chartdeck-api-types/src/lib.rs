mod chart;
mod payment;
mod subscription;
mod user;

pub use chart::{
    ChartConfig, ChartDescriptor, ChartDetails, ChartMetadata, ChartOptions, ChartType, Dataset,
    GalleryResponse, RawData, SaveChartRequest, SCHEMA_VERSION,
};
pub use payment::{
    CreateOrderRequest, CreateOrderResponse, PaymentConfirmation, SwitchPlanRequest,
    SwitchPlanResponse, VerifyResponse, VerifySwitchRequest,
};
pub use subscription::{Subscription, SubscriptionPlan, SubscriptionResponse};
pub use user::{AuthStatus, NotificationPrefs, PasswordChange, ProfileUpdate, UserData};

use serde::{Deserialize, Serialize};

/// Generic success/message envelope returned by most mutating endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
