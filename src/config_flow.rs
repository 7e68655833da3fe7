// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive account setup.
//!
//! The hub renders the form described by [`data_schema`], posts the user's
//! answers back to [`ConfigFlow::step_user`], and either shows the form
//! again with error codes or stores the returned [`ConfigEntry`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::client::{BlockingExecutor, ClientFactory};
use crate::config::{
    AccountConfig, CONF_CONNECTION_TIMEOUT, CONF_ENABLE_ENERGY_MONITORING, CONF_HEALTH_CHECK,
    CONF_PASSWORD, CONF_USERNAME, ConfigEntry, DEFAULT_CONNECTION_TIMEOUT,
    DEFAULT_ENABLE_ENERGY_MONITORING, DEFAULT_HEALTH_CHECK, DEFAULT_TITLE,
};
use crate::error::{ClientError, ConfigError};

/// Step identifier of the only form.
pub const STEP_USER: &str = "user";

/// Error key for failures that are not tied to a single field.
pub const ERROR_BASE: &str = "base";

/// Error code for a field whose value was rejected.
pub const ERROR_INVALID_VALUE: &str = "invalid_value";

/// Value type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// Checkbox.
    Boolean,
}

/// One field of the setup form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    /// Entry key the answer is stored under.
    pub key: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Whether the user must fill in the field.
    pub required: bool,
    /// Value pre-filled for optional fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Describes the setup form.
#[must_use]
pub fn data_schema() -> Vec<SchemaField> {
    let required = |key, kind| SchemaField {
        key,
        kind,
        required: true,
        default: None,
    };
    let optional = |key, kind, default: Value| SchemaField {
        key,
        kind,
        required: false,
        default: Some(default),
    };

    vec![
        required(CONF_USERNAME, FieldKind::String),
        required(CONF_PASSWORD, FieldKind::String),
        optional(
            CONF_CONNECTION_TIMEOUT,
            FieldKind::Integer,
            DEFAULT_CONNECTION_TIMEOUT.into(),
        ),
        optional(
            CONF_HEALTH_CHECK,
            FieldKind::Integer,
            DEFAULT_HEALTH_CHECK.into(),
        ),
        optional(
            CONF_ENABLE_ENERGY_MONITORING,
            FieldKind::Boolean,
            DEFAULT_ENABLE_ENERGY_MONITORING.into(),
        ),
    ]
}

/// Reasons the credential check can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    /// The vendor service could not be reached.
    CannotConnect,
    /// The vendor refused the credentials.
    InvalidAuth,
    /// Anything else.
    Unknown,
}

impl FlowError {
    /// Returns the error code shown by the hub.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CannotConnect => "cannot_connect",
            Self::InvalidAuth => "invalid_auth",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ClientError> for FlowError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::AuthenticationFailed => Self::InvalidAuth,
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => Self::CannotConnect,
            ClientError::Request(_) => Self::Unknown,
        }
    }
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Show the form, with error codes keyed by field or [`ERROR_BASE`].
    ShowForm {
        /// Step the form belongs to.
        step_id: &'static str,
        /// Fields to render.
        schema: Vec<SchemaField>,
        /// Error codes from the previous submission.
        errors: BTreeMap<String, String>,
    },
    /// Store this entry and finish the flow.
    CreateEntry(ConfigEntry),
}

impl FlowResult {
    fn form(errors: BTreeMap<String, String>) -> Self {
        Self::ShowForm {
            step_id: STEP_USER,
            schema: data_schema(),
            errors,
        }
    }
}

/// Setup wizard for one vendor account.
pub struct ConfigFlow<F> {
    factory: Arc<F>,
    executor: BlockingExecutor,
}

impl<F: ClientFactory + 'static> ConfigFlow<F> {
    /// Flow version stored with created entries.
    pub const VERSION: u32 = 1;

    /// Creates a flow that builds clients with `factory`.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self::with_executor(factory, BlockingExecutor::new())
    }

    /// Creates a flow that runs credential checks on `executor`.
    #[must_use]
    pub fn with_executor(factory: F, executor: BlockingExecutor) -> Self {
        Self {
            factory: Arc::new(factory),
            executor,
        }
    }

    /// Handles the user step.
    ///
    /// Without input the empty form is returned. Otherwise the input is
    /// parsed, the credentials are checked against the vendor, and on
    /// success an entry titled [`DEFAULT_TITLE`] is created.
    pub async fn step_user(&self, input: Option<Value>) -> FlowResult {
        let Some(input) = input else {
            return FlowResult::form(BTreeMap::new());
        };

        let config = match AccountConfig::from_value(input) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected setup input");
                return FlowResult::form(field_error(&e));
            }
        };

        match self.validate_input(&config).await {
            Ok(()) => {
                tracing::info!(username = %config.username, "Credentials accepted");
                FlowResult::CreateEntry(ConfigEntry::new(DEFAULT_TITLE, config))
            }
            Err(e) => {
                let mut errors = BTreeMap::new();
                errors.insert(ERROR_BASE.to_string(), e.as_str().to_string());
                FlowResult::form(errors)
            }
        }
    }

    /// Checks that the vendor issues a login token for the account.
    async fn validate_input(&self, config: &AccountConfig) -> Result<(), FlowError> {
        let factory = Arc::clone(&self.factory);
        let account = config.clone();
        let result = self
            .executor
            .run(move || -> Result<Option<String>, ClientError> {
                factory.create(&account)?.get_login_token()
            })
            .await;

        match result {
            Ok(Ok(Some(token))) if !token.is_empty() => Ok(()),
            Ok(Ok(_)) => Err(FlowError::InvalidAuth),
            Ok(Err(e)) => {
                let flow_error = FlowError::from(&e);
                if flow_error == FlowError::Unknown {
                    tracing::error!(error = %e, "Unexpected error validating credentials");
                } else {
                    tracing::debug!(
                        error = %e,
                        code = flow_error.as_str(),
                        "Credential check failed"
                    );
                }
                Err(flow_error)
            }
            Err(e) => {
                tracing::error!(error = %e, "Unexpected error validating credentials");
                Err(FlowError::Unknown)
            }
        }
    }
}

impl<F> fmt::Debug for ConfigFlow<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFlow")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

fn field_error(err: &ConfigError) -> BTreeMap<String, String> {
    let field = err.field();
    let key = if data_schema().iter().any(|f| f.key == field) {
        field
    } else {
        ERROR_BASE
    };
    let mut errors = BTreeMap::new();
    errors.insert(key.to_string(), ERROR_INVALID_VALUE.to_string());
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{BoxedFactory, FakeClient, boxed_factory, factory_for};
    use crate::test_support::capture_logs;
    use serde_json::json;

    fn flow_with(client: Arc<FakeClient>) -> ConfigFlow<BoxedFactory> {
        ConfigFlow::new(factory_for(&client))
    }

    fn credentials() -> Value {
        json!({ "username": "me@example.com", "password": "hunter2" })
    }

    fn base_error(result: &FlowResult) -> Option<&str> {
        match result {
            FlowResult::ShowForm { errors, .. } => errors.get(ERROR_BASE).map(String::as_str),
            FlowResult::CreateEntry(_) => None,
        }
    }

    #[test]
    fn schema_lists_fields_with_defaults() {
        let schema = data_schema();
        let keys: Vec<_> = schema.iter().map(|f| f.key).collect();
        assert_eq!(
            keys,
            [
                "username",
                "password",
                "connection_timeout",
                "health_check",
                "enable_energy_monitoring"
            ]
        );
        assert!(schema[0].required && schema[1].required);
        assert_eq!(schema[2].default, Some(json!(720)));
        assert_eq!(schema[3].default, Some(json!(60)));
        assert_eq!(schema[4].default, Some(json!(true)));
    }

    #[tokio::test]
    async fn no_input_shows_empty_form() {
        let flow = flow_with(Arc::new(FakeClient::new()));
        let result = flow.step_user(None).await;
        assert_eq!(result, FlowResult::form(BTreeMap::new()));
    }

    #[tokio::test]
    async fn valid_credentials_create_entry() {
        let flow = flow_with(Arc::new(FakeClient::new()));

        let FlowResult::CreateEntry(entry) = flow.step_user(Some(credentials())).await else {
            panic!("expected an entry");
        };
        assert_eq!(entry.title, "Emerald HWS");
        assert_eq!(entry.data, AccountConfig::new("me@example.com", "hunter2"));
    }

    #[tokio::test]
    async fn missing_or_empty_token_is_invalid_auth() {
        let client = Arc::new(FakeClient::new());
        let flow = flow_with(Arc::clone(&client));

        client.set_login_token(None);
        let result = flow.step_user(Some(credentials())).await;
        assert_eq!(base_error(&result), Some("invalid_auth"));

        client.set_login_token(Some(""));
        let result = flow.step_user(Some(credentials())).await;
        assert_eq!(base_error(&result), Some("invalid_auth"));
    }

    #[tokio::test]
    async fn client_errors_map_to_codes() {
        let cases = [
            (ClientError::AuthenticationFailed, "invalid_auth"),
            (ClientError::ConnectionFailed("dns".into()), "cannot_connect"),
            (ClientError::Timeout(30_000), "cannot_connect"),
            (ClientError::Request("500".into()), "unknown"),
        ];
        for (err, code) in cases {
            let client = Arc::new(FakeClient::new());
            client.fail("get_login_token", err.clone());
            let result = flow_with(client).step_user(Some(credentials())).await;
            assert_eq!(base_error(&result), Some(code), "{err}");
        }
    }

    #[tokio::test]
    async fn factory_failure_is_mapped() {
        let factory = boxed_factory(|_| Err(ClientError::ConnectionFailed("refused".into())));
        let result = ConfigFlow::new(factory).step_user(Some(credentials())).await;
        assert_eq!(base_error(&result), Some("cannot_connect"));
    }

    #[test]
    fn worker_panic_is_unknown_and_logged() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let factory = boxed_factory(|_| panic!("vendor library crashed"));
        let flow = ConfigFlow::new(factory);

        let mut result = None;
        let logs = capture_logs(|| result = Some(rt.block_on(flow.step_user(Some(credentials())))));

        assert_eq!(base_error(result.as_ref().unwrap()), Some("unknown"));
        assert!(logs.contains("Unexpected error validating credentials"));
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_per_field() {
        let flow = flow_with(Arc::new(FakeClient::new()));

        let result = flow
            .step_user(Some(json!({
                "username": "u",
                "password": "p",
                "health_check": 0
            })))
            .await;
        let FlowResult::ShowForm { errors, .. } = result else {
            panic!("expected the form");
        };
        assert_eq!(errors.get("health_check").map(String::as_str), Some("invalid_value"));

        let result = flow.step_user(Some(json!({ "username": "u" }))).await;
        let FlowResult::ShowForm { errors, .. } = result else {
            panic!("expected the form");
        };
        assert_eq!(errors.get("password").map(String::as_str), Some("invalid_value"));
    }

    #[tokio::test]
    async fn malformed_input_is_a_base_error() {
        let flow = flow_with(Arc::new(FakeClient::new()));
        let result = flow
            .step_user(Some(json!({
                "username": "u",
                "password": "p",
                "enable_energy_monitoring": "yes"
            })))
            .await;
        assert_eq!(base_error(&result), Some("invalid_value"));
    }
}
