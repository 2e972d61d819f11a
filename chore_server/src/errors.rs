use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use chore_engine::{OrderFlowError, PaymentProviderError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Invalid status. Valid values are: Pending, PickedUp, Delivered")]
    InvalidStatus(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidStatusTransition(String),
    #[error("Webhook signature verification failed. {0}")]
    SignatureVerificationFailed(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    ProviderUnavailable(String),
    #[error("The payment provider returned an error. {0}")]
    UpstreamError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ServerError {
    /// Replaces upstream error details with `summary`, unless `show_details` is true.
    pub fn redact(self, show_details: bool, summary: &str) -> Self {
        match self {
            Self::UpstreamError(msg) if !show_details => {
                error!("💻️ Upstream error details withheld from client: {msg}");
                Self::UpstreamError(summary.to_string())
            },
            e => e,
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            Self::SignatureVerificationFailed(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidStatusTransition(_) => StatusCode::CONFLICT,
            Self::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PaymentProviderError> for ServerError {
    fn from(e: PaymentProviderError) -> Self {
        match e {
            PaymentProviderError::ProviderUnavailable(_) => Self::ProviderUnavailable(e.to_string()),
            PaymentProviderError::NotConfigured(_) => Self::ConfigurationError(e.to_string()),
            PaymentProviderError::SignatureVerificationFailed(msg) => Self::SignatureVerificationFailed(msg),
            PaymentProviderError::InvalidEvent(_) => Self::InvalidRequestBody(e.to_string()),
            PaymentProviderError::UpstreamError(msg) => Self::UpstreamError(msg),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(msg) => Self::ValidationError(msg),
            OrderFlowError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            OrderFlowError::InvalidStatusTransition { .. } => Self::InvalidStatusTransition(e.to_string()),
            OrderFlowError::StoreError(e) => Self::BackendError(e.to_string()),
            OrderFlowError::ProviderError(e) => e.into(),
        }
    }
}
