#![doc = include_str!("README.md")]
mod api;
mod constants;
mod context;
pub mod error;
mod logger;
pub mod serializer;
mod transport;

pub use api::{
    CallableFunction, Functions, FunctionsOptions, HttpsCallableOptions, HttpsCallableResult,
};
pub use constants::{DEFAULT_REGION, DEFAULT_TIMEOUT_MS};
pub use context::{
    AppCheckTokenProvider, AppCheckTokenResult, AuthTokenProvider, CallContext, ContextProvider,
    FirebaseAuthTokenData, MessagingTokenProvider, NotificationPermission, RuntimeCapabilities,
};
pub use error::{FunctionsError, FunctionsErrorCode, FunctionsResult};
pub use transport::{CallableRequest, CallableTransport, HttpCallableTransport, HttpResponse};
