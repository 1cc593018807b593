use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(default)]
    pub user: Option<UserData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPrefs {
    pub email_reports: bool,
    pub product_updates: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_status_without_user() {
        let status: AuthStatus =
            serde_json::from_str(r#"{"isAuthenticated":false}"#).unwrap();
        assert!(!status.is_authenticated);
        assert!(status.user.is_none());
    }
}
