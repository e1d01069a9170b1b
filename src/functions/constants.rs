//! Shared constants for the callable Functions client.

/// Region used when no `region_or_custom_domain` is configured, matching the
/// default of the Firebase JS SDK (`packages/functions/src/config.ts`).
pub const DEFAULT_REGION: &str = "us-central1";

/// Timeout applied to a call when `HttpsCallableOptions.timeout` is unset.
pub const DEFAULT_TIMEOUT_MS: u64 = 70_000;

pub(crate) const AUTHORIZATION_HEADER: &str = "Authorization";
pub(crate) const INSTANCE_ID_TOKEN_HEADER: &str = "Firebase-Instance-ID-Token";
pub(crate) const APP_CHECK_TOKEN_HEADER: &str = "X-Firebase-AppCheck";
