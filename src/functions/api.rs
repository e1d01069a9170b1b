use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{select, Either};
use futures::pin_mut;
use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::functions::constants::{
    APP_CHECK_TOKEN_HEADER, AUTHORIZATION_HEADER, DEFAULT_REGION, DEFAULT_TIMEOUT_MS,
    INSTANCE_ID_TOKEN_HEADER,
};
use crate::functions::context::ContextProvider;
use crate::functions::error::{
    deadline_exceeded, error_for_http_response, internal_error, invalid_argument, FunctionsResult,
};
use crate::functions::serializer;
use crate::functions::transport::{
    CallableRequest, CallableTransport, HttpCallableTransport, HttpResponse,
};
use crate::platform::runtime;

/// Configuration for a [`Functions`] client.
///
/// `region_or_custom_domain` accepts either a region identifier such as
/// `europe-west1` or a full origin such as `https://mydomain.com`, the same
/// overload the JS `getFunctions()` helper takes.
#[derive(Clone, Debug, Default)]
pub struct FunctionsOptions {
    pub project_id: String,
    pub region_or_custom_domain: Option<String>,
}

impl FunctionsOptions {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region_or_custom_domain: None,
        }
    }

    pub fn with_region_or_custom_domain(mut self, value: impl Into<String>) -> Self {
        self.region_or_custom_domain = Some(value.into());
        self
    }
}

/// Per-callable options.
#[derive(Clone, Debug)]
pub struct HttpsCallableOptions {
    /// Client-side deadline for the whole call. When it elapses first the
    /// call fails with `functions/deadline-exceeded`.
    pub timeout: Duration,
    /// Requests single-use App Check tokens, for functions that enforce
    /// replay protection.
    pub limited_use_app_check_tokens: bool,
}

impl Default for HttpsCallableOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            limited_use_app_check_tokens: false,
        }
    }
}

/// Successful callable response, wrapping the decoded `data` payload.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpsCallableResult<Response> {
    pub data: Response,
}

/// Client entry point for invoking HTTPS callable Cloud Functions.
///
/// This mirrors the JavaScript `FunctionsService` implementation in
/// `packages/functions/src/service.ts`, with the auth, messaging and App
/// Check integrations injected as trait objects instead of resolved from a
/// component container.
#[derive(Clone, Debug)]
pub struct Functions {
    inner: Arc<FunctionsInner>,
}

struct FunctionsInner {
    options: FunctionsOptions,
    endpoint: Endpoint,
    context: ContextProvider,
    transport: Arc<dyn CallableTransport>,
}

impl Debug for FunctionsInner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionsInner")
            .field("options", &self.options)
            .field("endpoint", &self.endpoint)
            .field("context", &self.context)
            .finish()
    }
}

impl Functions {
    /// Creates a client that posts over HTTPS with the default transport.
    pub fn new(options: FunctionsOptions, context: ContextProvider) -> Self {
        Self::with_transport(options, context, Arc::new(HttpCallableTransport::new()))
    }

    /// Creates a client with a caller-supplied transport. Tests and
    /// embedders use this to intercept traffic.
    pub fn with_transport(
        options: FunctionsOptions,
        context: ContextProvider,
        transport: Arc<dyn CallableTransport>,
    ) -> Self {
        let endpoint = Endpoint::new(options.region_or_custom_domain.clone());
        Self {
            inner: Arc::new(FunctionsInner {
                options,
                endpoint,
                context,
                transport,
            }),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.inner.options.project_id
    }

    pub fn region(&self) -> &str {
        self.inner.endpoint.region()
    }

    pub fn custom_domain(&self) -> Option<&str> {
        self.inner.endpoint.custom_domain()
    }

    /// Returns a typed callable reference for the given Cloud Function name.
    ///
    /// This is the Rust equivalent of
    /// [`httpsCallable`](https://firebase.google.com/docs/functions/callable-reference) from the
    /// JavaScript SDK (`packages/functions/src/service.ts`).
    ///
    /// # Examples
    /// ```no_run
    /// # use firebase_functions_client::functions::{ContextProvider, Functions, FunctionsOptions};
    /// # async fn demo() -> firebase_functions_client::functions::error::FunctionsResult<()> {
    /// use serde_json::json;
    ///
    /// let functions = Functions::new(
    ///     FunctionsOptions::new("demo-project"),
    ///     ContextProvider::default(),
    /// );
    /// let callable = functions
    ///     .https_callable::<serde_json::Value, serde_json::Value>("addNumbers")?;
    /// let result = callable.call_async(&json!({ "first": 13, "second": 4 })).await?;
    /// println!("{:?}", result.data);
    /// # Ok(())
    /// # }
    /// # let _ = demo;
    /// ```
    pub fn https_callable<Request, Response>(
        &self,
        name: &str,
    ) -> FunctionsResult<CallableFunction<Request, Response>>
    where
        Request: serde::Serialize + 'static,
        Response: serde::de::DeserializeOwned + 'static,
    {
        self.https_callable_with_options(name, HttpsCallableOptions::default())
    }

    pub fn https_callable_with_options<Request, Response>(
        &self,
        name: &str,
        options: HttpsCallableOptions,
    ) -> FunctionsResult<CallableFunction<Request, Response>>
    where
        Request: serde::Serialize + 'static,
        Response: serde::de::DeserializeOwned + 'static,
    {
        if name.trim().is_empty() {
            return Err(invalid_argument("Function name must not be empty"));
        }
        Ok(CallableFunction {
            functions: self.clone(),
            target: CallTarget::Name(name.trim().trim_matches('/').to_string()),
            options,
            _request: std::marker::PhantomData,
            _response: std::marker::PhantomData,
        })
    }

    /// Returns a callable that posts straight to `url`, bypassing the
    /// region and project endpoint. Mirrors `httpsCallableFromURL`.
    pub fn https_callable_from_url<Request, Response>(
        &self,
        url: &str,
    ) -> FunctionsResult<CallableFunction<Request, Response>>
    where
        Request: serde::Serialize + 'static,
        Response: serde::de::DeserializeOwned + 'static,
    {
        self.https_callable_from_url_with_options(url, HttpsCallableOptions::default())
    }

    pub fn https_callable_from_url_with_options<Request, Response>(
        &self,
        url: &str,
        options: HttpsCallableOptions,
    ) -> FunctionsResult<CallableFunction<Request, Response>>
    where
        Request: serde::Serialize + 'static,
        Response: serde::de::DeserializeOwned + 'static,
    {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(invalid_argument("Function URL must not be empty"));
        }
        let parsed = Url::parse(trimmed)
            .map_err(|err| invalid_argument(format!("Invalid callable URL `{trimmed}`: {err}")))?;
        Ok(CallableFunction {
            functions: self.clone(),
            target: CallTarget::Url(String::from(parsed)),
            options,
            _request: std::marker::PhantomData,
            _response: std::marker::PhantomData,
        })
    }

    fn callable_url(&self, name: &str) -> FunctionsResult<String> {
        let project_id = &self.inner.options.project_id;
        if project_id.is_empty() {
            return Err(invalid_argument(
                "FunctionsOptions.project_id is required to call Functions",
            ));
        }
        Ok(self.inner.endpoint.callable_url(project_id, name))
    }

    fn context(&self) -> &ContextProvider {
        &self.inner.context
    }

    fn transport(&self) -> &Arc<dyn CallableTransport> {
        &self.inner.transport
    }
}

#[derive(Clone, Debug)]
enum CallTarget {
    Name(String),
    Url(String),
}

/// Callable Cloud Function handle that can be invoked with typed payloads.
///
/// The shape follows the JavaScript `HttpsCallable` returned from
/// `httpsCallable()` in `packages/functions/src/service.ts`.
#[derive(Clone, Debug)]
pub struct CallableFunction<Request, Response> {
    functions: Functions,
    target: CallTarget,
    options: HttpsCallableOptions,
    _request: std::marker::PhantomData<Request>,
    _response: std::marker::PhantomData<Response>,
}

impl<Request, Response> CallableFunction<Request, Response>
where
    Request: serde::Serialize,
    Response: serde::de::DeserializeOwned,
{
    /// Asynchronously invokes the backend function and returns the decoded
    /// response payload.
    ///
    /// The payload travels as `{ "data": ... }` with out-of-range integers
    /// wrapped in proto `Int64Value`/`UInt64Value` objects, and any backend
    /// failure is mapped to a [`FunctionsError`](crate::functions::error::FunctionsError)
    /// code, matching the JS SDK wire behaviour.
    pub async fn call_async(&self, data: &Request) -> FunctionsResult<HttpsCallableResult<Response>> {
        let payload = serde_json::to_value(data).map_err(|err| {
            internal_error(format!("Failed to serialize callable payload: {err}"))
        })?;
        self.dispatch(payload).await
    }

    /// Invokes the function with no arguments; the wire payload is an
    /// explicit `{ "data": null }`.
    pub async fn call_with_no_args_async(&self) -> FunctionsResult<HttpsCallableResult<Response>> {
        self.dispatch(JsonValue::Null).await
    }

    async fn dispatch(&self, payload: JsonValue) -> FunctionsResult<HttpsCallableResult<Response>> {
        let url = match &self.target {
            CallTarget::Name(name) => self.functions.callable_url(name)?,
            CallTarget::Url(url) => url.clone(),
        };

        let body = json!({ "data": serializer::encode(payload) });
        let mut request = CallableRequest::new(url, body);
        request
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());

        let context = self
            .functions
            .context()
            .get_context_async(self.options.limited_use_app_check_tokens)
            .await;
        if let Some(token) = context.auth_token {
            if !token.is_empty() {
                request
                    .headers
                    .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
            }
        }
        if let Some(token) = context.messaging_token {
            if !token.is_empty() {
                request
                    .headers
                    .insert(INSTANCE_ID_TOKEN_HEADER.to_string(), token);
            }
        }
        if let Some(token) = context.app_check_token {
            if !token.is_empty() {
                request
                    .headers
                    .insert(APP_CHECK_TOKEN_HEADER.to_string(), token);
            }
        }

        let response = self.post_with_timeout(request).await?;

        if let Some(error) = error_for_http_response(response.status, response.body.as_ref()) {
            return Err(error);
        }

        let data = extract_data(response.body)?;
        let decoded = serializer::decode(data)?;
        let data = serde_json::from_value(decoded).map_err(|err| {
            internal_error(format!(
                "Failed to deserialize callable response payload: {err}"
            ))
        })?;
        Ok(HttpsCallableResult { data })
    }

    /// Races the HTTP post against the configured deadline. Losing the race
    /// drops the post future, which also aborts any in-flight request.
    async fn post_with_timeout(&self, request: CallableRequest) -> FunctionsResult<HttpResponse> {
        let post = self.functions.transport().post_json(request);
        let timer = runtime::sleep(self.options.timeout);
        pin_mut!(post);
        pin_mut!(timer);
        match select(post, timer).await {
            Either::Left((response, _)) => response,
            Either::Right(((), _)) => Err(deadline_exceeded()),
        }
    }

    /// Function name this callable targets, or `None` when it was built
    /// from a URL.
    pub fn name(&self) -> Option<&str> {
        match &self.target {
            CallTarget::Name(name) => Some(name),
            CallTarget::Url(_) => None,
        }
    }

    /// Explicit URL this callable targets, or `None` when it was built
    /// from a function name.
    pub fn url(&self) -> Option<&str> {
        match &self.target {
            CallTarget::Name(_) => None,
            CallTarget::Url(url) => Some(url),
        }
    }

    pub fn region(&self) -> &str {
        self.functions.region()
    }
}

/// Pulls the payload out of a decoded response body.
///
/// The modern wire format nests it under `data`; some older callable
/// runtimes reply with `result` instead and both are accepted, like the JS
/// SDK does.
fn extract_data(body: Option<JsonValue>) -> FunctionsResult<JsonValue> {
    let json = match body {
        None | Some(JsonValue::Null) => {
            return Err(internal_error("Response is not valid JSON object."))
        }
        Some(json) => json,
    };
    let JsonValue::Object(mut map) = json else {
        return Err(internal_error("Response is missing data field."));
    };
    map.remove("data")
        .or_else(|| map.remove("result"))
        .ok_or_else(|| internal_error("Response is missing data field."))
}

#[derive(Clone, Debug)]
struct Endpoint {
    region: String,
    custom_domain: Option<String>,
}

impl Endpoint {
    fn new(identifier: Option<String>) -> Self {
        match identifier.and_then(|value| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }) {
            Some(raw) => match Url::parse(&raw) {
                Ok(url) => {
                    let origin = url.origin().ascii_serialization();
                    let mut normalized = origin;
                    let path = url.path();
                    if path != "/" {
                        normalized.push_str(path.trim_end_matches('/'));
                    }
                    Self {
                        region: DEFAULT_REGION.to_string(),
                        custom_domain: Some(normalized),
                    }
                }
                Err(_) => Self {
                    region: raw,
                    custom_domain: None,
                },
            },
            None => Self::default(),
        }
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn custom_domain(&self) -> Option<&str> {
        self.custom_domain.as_deref()
    }

    fn callable_url(&self, project_id: &str, name: &str) -> String {
        if let Some(domain) = &self.custom_domain {
            return format!("{}/{}", domain.trim_end_matches('/'), name);
        }

        format!(
            "https://{}-{}.cloudfunctions.net/{}",
            self.region, project_id, name
        )
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            custom_domain: None,
        }
    }
}
