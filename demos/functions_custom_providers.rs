//! Wire token providers into the callable client.
//! Implement the provider traits over whatever auth/App Check stack the app uses; tokens then travel as headers on every call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use firebase_functions_client::functions::{
    AppCheckTokenProvider, AppCheckTokenResult, AuthTokenProvider, ContextProvider,
    FirebaseAuthTokenData, Functions, FunctionsOptions, FunctionsResult, HttpsCallableOptions,
    RuntimeCapabilities,
};
use serde_json::json;

struct EnvAuth;

#[async_trait]
impl AuthTokenProvider for EnvAuth {
    async fn get_token(
        &self,
        _force_refresh: bool,
    ) -> FunctionsResult<Option<FirebaseAuthTokenData>> {
        // A real provider would ask its auth client for a fresh ID token.
        Ok(std::env::var("FIREBASE_ID_TOKEN")
            .ok()
            .map(|access_token| FirebaseAuthTokenData { access_token }))
    }
}

struct EnvAppCheck;

#[async_trait]
impl AppCheckTokenProvider for EnvAppCheck {
    async fn get_token(&self) -> AppCheckTokenResult {
        match std::env::var("FIREBASE_APP_CHECK_TOKEN") {
            Ok(token) => AppCheckTokenResult { token, error: None },
            Err(_) => AppCheckTokenResult {
                token: String::new(),
                error: Some("FIREBASE_APP_CHECK_TOKEN is not set".to_string()),
            },
        }
    }

    async fn get_limited_use_token(&self) -> AppCheckTokenResult {
        self.get_token().await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let context = ContextProvider::new(
        Some(Arc::new(EnvAuth)),
        None,
        Some(Arc::new(EnvAppCheck)),
        RuntimeCapabilities::default(),
    );

    // Point somewhere else with e.g. FUNCTIONS_ORIGIN=https://functions.example.com
    let mut options = FunctionsOptions::new("your-project-id");
    if let Ok(origin) = std::env::var("FUNCTIONS_ORIGIN") {
        options = options.with_region_or_custom_domain(origin);
    }

    let functions = Functions::new(options, context);
    let callable = functions.https_callable_with_options::<serde_json::Value, serde_json::Value>(
        "secureCall",
        HttpsCallableOptions {
            timeout: Duration::from_secs(30),
            limited_use_app_check_tokens: true,
        },
    )?;

    let response = callable.call_async(&json!({ "from": "custom-providers" })).await?;
    println!("Callable response: {}", response.data);

    Ok(())
}
