use serde::{Deserialize, Serialize};

use crate::subscription::{Subscription, SubscriptionPlan};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub plan: SubscriptionPlan,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    /// Amount in the currency's minor unit (paise for INR).
    pub amount: u64,
    pub currency: String,
    pub order_id: String,
}

/// Signed confirmation handed back by the checkout widget. Field names
/// follow the widget's convention and are not camel-cased.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPlanRequest {
    pub new_plan: SubscriptionPlan,
    pub current_plan: SubscriptionPlan,
}

/// A plan switch either requires an incremental payment (order fields set)
/// or applies immediately (subscription set).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPlanResponse {
    pub success: bool,
    #[serde(default)]
    pub requires_payment: bool,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifySwitchRequest {
    #[serde(flatten)]
    pub confirmation: PaymentConfirmation,
    #[serde(rename = "newPlan")]
    pub new_plan: SubscriptionPlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_response_parses() {
        let order: CreateOrderResponse = serde_json::from_str(
            r#"{"success":true,"amount":49900,"currency":"INR","orderId":"order_123"}"#,
        )
        .unwrap();
        assert_eq!(order.order_id, "order_123");
        assert_eq!(order.amount, 49900);
    }

    #[test]
    fn verify_switch_flattens_signature_fields() {
        let request = VerifySwitchRequest {
            confirmation: PaymentConfirmation {
                razorpay_payment_id: "pay_1".into(),
                razorpay_order_id: "order_1".into(),
                razorpay_signature: "sig".into(),
            },
            new_plan: SubscriptionPlan::Enterprise,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["razorpay_payment_id"], "pay_1");
        assert_eq!(json["newPlan"], "enterprise");
    }

    #[test]
    fn switch_response_without_payment() {
        let response: SwitchPlanResponse = serde_json::from_str(
            r#"{"success":true,"requiresPayment":false,"subscription":{"plan":"professional","active":true,"expiresAt":null}}"#,
        )
        .unwrap();
        assert!(!response.requires_payment);
        assert!(response.subscription.unwrap().active);
    }
}
