use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
///
/// Every failure of a provider, whether it happens while sending the
/// request or while streaming the response, is reported through this
/// trait. Callers never retry on their own, so implementors should make
/// the [`ErrorKind`] as precise as they can.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A remote generation service.
///
/// Once the provider is created, it should behave like a stateless object:
/// everything the model needs to know about the conversation is carried by
/// the [`ModelRequest`]. Providers may be cloned and dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a request to the model.
    ///
    /// The returned future must not borrow from `self` or `req`.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
