use serde::Serialize;

/// The envelope every endpoint answers with, on success and on failure.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub success: bool,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            success: false,
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            data: None,
            success: true,
            message: message.into(),
        }
    }
}
