use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::functions::error::FunctionsResult;

/// A single callable request, already encoded and carrying every context
/// header the caller wants attached.
#[derive(Clone, Debug)]
pub struct CallableRequest {
    pub url: String,
    pub body: JsonValue,
    pub headers: HashMap<String, String>,
}

impl CallableRequest {
    pub fn new(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            url: url.into(),
            body,
            headers: HashMap::new(),
        }
    }
}

/// Raw outcome of posting a callable request.
///
/// `status` is `0` when no HTTP response arrived at all, and `body` is `None`
/// when the response body was empty or not parseable as JSON. Interpreting
/// either condition is the caller's job; the transport itself does not decide
/// what counts as an error. This is the shape `postJSON` returns in
/// `packages/functions/src/service.ts`.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<JsonValue>,
}

/// HTTP layer behind [`CallableFunction`](crate::functions::CallableFunction).
///
/// Swappable so tests and embedders can intercept traffic; the default
/// implementation is [`HttpCallableTransport`].
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CallableTransport: Send + Sync {
    async fn post_json(&self, request: CallableRequest) -> FunctionsResult<HttpResponse>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::HttpCallableTransport;

#[cfg(target_arch = "wasm32")]
pub use wasm::HttpCallableTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::HashMap;
    use std::sync::LazyLock;

    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use reqwest::Client;
    use serde_json::Value as JsonValue;

    use super::{CallableRequest, CallableTransport, HttpResponse};
    use crate::functions::error::{invalid_argument, FunctionsResult};
    use crate::functions::logger::LOGGER;

    fn client() -> &'static Client {
        static CLIENT: LazyLock<Client> = LazyLock::new(Client::new);
        &CLIENT
    }

    /// Default transport posting over a process-wide reqwest client.
    #[derive(Clone, Debug, Default)]
    pub struct HttpCallableTransport;

    impl HttpCallableTransport {
        pub fn new() -> Self {
            Self
        }
    }

    fn build_headers(headers: &HashMap<String, String>) -> FunctionsResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|err| invalid_argument(format!("invalid header name `{key}`: {err}")))?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                invalid_argument(format!("invalid header value for `{key}`: {err}"))
            })?;
            map.insert(name, header_value);
        }
        Ok(map)
    }

    #[async_trait]
    impl CallableTransport for HttpCallableTransport {
        async fn post_json(&self, request: CallableRequest) -> FunctionsResult<HttpResponse> {
            let CallableRequest { url, body, headers } = request;
            let header_map = build_headers(&headers)?;

            let response = match client()
                .post(&url)
                .headers(header_map)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    // An unreachable endpoint and an unhandled crash on the
                    // backend are indistinguishable from here; both report
                    // status 0 and let the caller map it.
                    LOGGER.warn(format!("callable request to {url} failed: {err}"));
                    return Ok(HttpResponse {
                        status: 0,
                        body: None,
                    });
                }
            };

            let status = response.status().as_u16();
            log::debug!("callable POST {url} -> {status}");
            let body = match response.bytes().await {
                Ok(bytes) if !bytes.is_empty() => serde_json::from_slice::<JsonValue>(&bytes).ok(),
                _ => None,
            };
            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm {
    use async_trait::async_trait;

    use super::{CallableRequest, CallableTransport, HttpResponse};
    use crate::functions::error::{FunctionsError, FunctionsErrorCode, FunctionsResult};

    #[derive(Clone, Debug, Default)]
    pub struct HttpCallableTransport;

    impl HttpCallableTransport {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait(?Send)]
    impl CallableTransport for HttpCallableTransport {
        async fn post_json(&self, _request: CallableRequest) -> FunctionsResult<HttpResponse> {
            Err(FunctionsError::new(
                FunctionsErrorCode::Unimplemented,
                "Callable HTTP transport is not yet available for wasm targets",
            ))
        }
    }
}
