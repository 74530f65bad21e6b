//! Provider configuration
//!
//! Values come from the `provider "glesys"` block; each one falls back to an
//! environment variable when the block leaves it unset.

use glesys_client::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

use crate::error::{ProviderError, Result};
use crate::state::DynamicValue;

pub const ENV_USERID: &str = "GLESYS_USERID";
pub const ENV_TOKEN: &str = "GLESYS_TOKEN";
pub const ENV_API_URL: &str = "GLESYS_API_URL";
pub const ENV_TIMEOUT: &str = "GLESYS_TIMEOUT";

/// Provider block as configured in Terraform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub userid: Option<String>,
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<i64>,
}

impl ProviderConfig {
    pub fn from_value(value: &DynamicValue) -> Self {
        let string = |key: &str| {
            value
                .get(key)
                .as_string()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            userid: string("userid"),
            token: string("token"),
            api_url: string("api_url"),
            timeout_secs: value.get("timeout").as_i64(),
        }
    }

    /// Fill unset values from `env` and produce the client configuration.
    pub fn resolve<F>(self, env: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |key: &str| env(key).filter(|v| !v.is_empty());

        let userid = self.userid.or_else(|| env_value(ENV_USERID)).ok_or_else(|| {
            ProviderError::InvalidConfig(format!("userid must be set or provided via {ENV_USERID}"))
        })?;
        let token = self.token.or_else(|| env_value(ENV_TOKEN)).ok_or_else(|| {
            ProviderError::InvalidConfig(format!("token must be set or provided via {ENV_TOKEN}"))
        })?;
        let api_url = self
            .api_url
            .or_else(|| env_value(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match self.timeout_secs {
            Some(t) => positive_timeout(t, "timeout")?,
            None => match env_value(ENV_TIMEOUT) {
                Some(raw) => {
                    let t = raw.parse().map_err(|_| {
                        ProviderError::InvalidConfig(format!(
                            "{ENV_TIMEOUT} must be a number of seconds, got {raw:?}"
                        ))
                    })?;
                    positive_timeout(t, ENV_TIMEOUT)?
                }
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        Ok(ClientConfig {
            userid,
            token,
            api_url,
            timeout_secs,
            user_agent: format!("terraform-provider-glesys/{}", crate::VERSION),
        })
    }
}

fn positive_timeout(secs: i64, source: &str) -> Result<u64> {
    u64::try_from(secs)
        .ok()
        .filter(|&t| t > 0)
        .ok_or_else(|| {
            ProviderError::InvalidConfig(format!(
                "{source} must be a positive number of seconds, got {secs}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{int_value, make_state, string_value};
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_block_values_win_over_environment() {
        let value = make_state(vec![
            ("userid", string_value("CL1")),
            ("token", string_value("from-block")),
            ("api_url", DynamicValue::Null),
            ("timeout", int_value(5)),
        ]);
        let config = ProviderConfig::from_value(&value)
            .resolve(env(&[(ENV_TOKEN, "from-env"), (ENV_API_URL, "http://localhost:1")]))
            .unwrap();

        assert_eq!(config.userid, "CL1");
        assert_eq!(config.token, "from-block");
        assert_eq!(config.api_url, "http://localhost:1");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_environment_fallback_and_defaults() {
        let config = ProviderConfig::default()
            .resolve(env(&[(ENV_USERID, "CL2"), (ENV_TOKEN, "secret")]))
            .unwrap();

        assert_eq!(config.userid, "CL2");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.user_agent.starts_with("terraform-provider-glesys/"));
    }

    #[test]
    fn test_missing_credentials() {
        let err = ProviderConfig::default().resolve(env(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_USERID));

        let err = ProviderConfig::default()
            .resolve(env(&[(ENV_USERID, "CL2"), (ENV_TOKEN, "")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TOKEN));
    }

    #[test]
    fn test_bad_timeout_from_environment() {
        let err = ProviderConfig::default()
            .resolve(env(&[
                (ENV_USERID, "CL2"),
                (ENV_TOKEN, "secret"),
                (ENV_TIMEOUT, "soon"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidConfig(_)));
    }

    #[test]
    fn test_timeout_must_be_positive() {
        let creds = [(ENV_USERID, "CL2"), (ENV_TOKEN, "secret")];
        for timeout in [0, -5] {
            let value = make_state(vec![("timeout", int_value(timeout))]);
            let err = ProviderConfig::from_value(&value)
                .resolve(env(&creds))
                .unwrap_err();
            assert!(matches!(err, ProviderError::InvalidConfig(_)), "{timeout}");
            assert!(err.to_string().contains("timeout"));
        }

        let err = ProviderConfig::default()
            .resolve(env(&[creds[0], creds[1], (ENV_TIMEOUT, "0")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT));
    }
}
