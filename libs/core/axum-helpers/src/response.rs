use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{ "message": "..." }` envelope for mutations that return no entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
