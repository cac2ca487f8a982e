use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated admin console session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminSession {
    pub id: String,
    pub username: String,
    pub role: String,
    pub login_time: DateTime<Utc>,
}

impl AdminSession {
    pub fn administrator(username: &str) -> Self {
        Self {
            id: username.to_string(),
            username: username.to_string(),
            role: "administrator".to_string(),
            login_time: Utc::now(),
        }
    }
}
