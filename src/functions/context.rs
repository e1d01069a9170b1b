use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use async_trait::async_trait;

use crate::functions::error::FunctionsResult;

/// Token payload handed back by an [`AuthTokenProvider`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirebaseAuthTokenData {
    pub access_token: String,
}

/// Outcome of an App Check token fetch.
///
/// Matches the App Check interop contract of the JS SDK: the fetch itself
/// never fails, a failed token exchange is reported through `error` while
/// `token` may still hold a placeholder value that must not be sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppCheckTokenResult {
    pub token: String,
    pub error: Option<String>,
}

/// Source of end-user auth tokens, typically backed by a Firebase Auth
/// client. Injected so the Functions client has no dependency on any
/// particular auth implementation.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthTokenProvider: Send + Sync {
    async fn get_token(
        &self,
        force_refresh: bool,
    ) -> FunctionsResult<Option<FirebaseAuthTokenData>>;
}

/// Source of FCM registration tokens for the `Firebase-Instance-ID-Token`
/// header.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MessagingTokenProvider: Send + Sync {
    async fn get_token(&self) -> FunctionsResult<Option<String>>;
}

/// Source of App Check tokens for the `X-Firebase-AppCheck` header.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AppCheckTokenProvider: Send + Sync {
    async fn get_token(&self) -> AppCheckTokenResult;

    /// Single-use variant consumed by functions enforcing replay protection.
    async fn get_limited_use_token(&self) -> AppCheckTokenResult;
}

/// Notification permission states as exposed by the Web Notification API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Default,
}

/// What the hosting runtime supports. Messaging tokens are only requested
/// when notifications are available and the user granted permission, the
/// same gate `packages/functions/src/context.ts` applies before touching
/// the messaging SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeCapabilities {
    pub supports_notifications: bool,
    pub notification_permission: NotificationPermission,
}

impl Default for RuntimeCapabilities {
    fn default() -> Self {
        Self {
            supports_notifications: false,
            notification_permission: NotificationPermission::Default,
        }
    }
}

/// Metadata that may be attached to callable Function requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    pub auth_token: Option<String>,
    pub messaging_token: Option<String>,
    pub app_check_token: Option<String>,
}

pub struct ContextProvider {
    auth: Option<Arc<dyn AuthTokenProvider>>,
    messaging: Option<Arc<dyn MessagingTokenProvider>>,
    app_check: Option<Arc<dyn AppCheckTokenProvider>>,
    capabilities: RuntimeCapabilities,
}

impl Debug for ContextProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextProvider")
            .field("auth", &self.auth.is_some())
            .field("messaging", &self.messaging.is_some())
            .field("app_check", &self.app_check.is_some())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl Default for ContextProvider {
    /// Provider with no token sources wired up; every call goes out
    /// unauthenticated.
    fn default() -> Self {
        Self::new(None, None, None, RuntimeCapabilities::default())
    }
}

impl ContextProvider {
    pub fn new(
        auth: Option<Arc<dyn AuthTokenProvider>>,
        messaging: Option<Arc<dyn MessagingTokenProvider>>,
        app_check: Option<Arc<dyn AppCheckTokenProvider>>,
        capabilities: RuntimeCapabilities,
    ) -> Self {
        Self {
            auth,
            messaging,
            app_check,
            capabilities,
        }
    }

    /// Collects the tokens for one call.
    ///
    /// Provider failures never fail the call; a token that cannot be fetched
    /// is simply left off the request, matching the JS `ContextProvider`.
    pub async fn get_context_async(&self, limited_use_app_check_tokens: bool) -> CallContext {
        CallContext {
            auth_token: self.fetch_auth_token().await,
            messaging_token: self.fetch_messaging_token().await,
            app_check_token: self
                .fetch_app_check_token(limited_use_app_check_tokens)
                .await,
        }
    }

    async fn fetch_auth_token(&self) -> Option<String> {
        let auth = self.auth.as_ref()?;
        match auth.get_token(false).await {
            Ok(Some(data)) if !data.access_token.is_empty() => Some(data.access_token),
            _ => None,
        }
    }

    async fn fetch_messaging_token(&self) -> Option<String> {
        let messaging = self.messaging.as_ref()?;
        if !self.capabilities.supports_notifications
            || self.capabilities.notification_permission != NotificationPermission::Granted
        {
            return None;
        }
        match messaging.get_token().await {
            Ok(Some(token)) if !token.is_empty() => Some(token),
            _ => None,
        }
    }

    async fn fetch_app_check_token(&self, limited_use: bool) -> Option<String> {
        let app_check = self.app_check.as_ref()?;
        let result = if limited_use {
            app_check.get_limited_use_token().await
        } else {
            app_check.get_token().await
        };

        // A failed exchange means the header must not be sent at all; the
        // App Check implementation already logged the failure on its side.
        if result.error.is_some() || result.token.is_empty() {
            return None;
        }
        Some(result.token)
    }
}
