use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The Stripe secret key has not been configured")]
    MissingSecretKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The webhook signing secret has not been configured")]
    MissingSecret,
    #[error("The webhook signing secret cannot be used as a key. {0}")]
    InvalidSecret(String),
    #[error("The signature header is malformed. {0}")]
    MalformedHeader(String),
    #[error("The signature timestamp is {age}s old, which is outside the tolerance window")]
    TimestampOutsideTolerance { age: i64 },
    #[error("No signature in the header matches the payload")]
    NoMatchingSignature,
    #[error("The payload is not a valid event. {0}")]
    InvalidPayload(String),
}
