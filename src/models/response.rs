//! 统一 API 响应

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 所有接口共用的响应外壳，失败时 data 为 null
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    /// UTC 时间，精确到秒（RFC 3339）
    pub timestamp: String,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: now_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            timestamp: now_rfc3339(),
        }
    }
}
