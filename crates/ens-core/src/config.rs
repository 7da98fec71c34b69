//! Configuration types for the ENS bootstrapper

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::constants::{
    DEFAULT_CALL_GAS_PRICE, DEFAULT_DEPLOY_GAS_PRICE, DEFAULT_GAS_LIMIT,
};
use crate::{EnsError, Environment, GasOptions};

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Target environment (informational, reported in the deployment summary)
    pub environment: Environment,

    /// Gas settings for contract deployments
    #[serde(default = "default_deploy_gas")]
    pub deploy_gas: GasOptions,

    /// Gas settings for ordinary contract calls
    #[serde(default = "default_call_gas")]
    pub call_gas: GasOptions,

    /// Optional upper bound for a single attempt, submission plus confirmation.
    ///
    /// Unset by default. An attempt cut off by the bound is sent again even
    /// though the first submission may still be mined, so a deployment can
    /// land twice and a resent call can revert.
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,
}

fn default_deploy_gas() -> GasOptions {
    GasOptions::new(DEFAULT_GAS_LIMIT, DEFAULT_DEPLOY_GAS_PRICE)
}

fn default_call_gas() -> GasOptions {
    GasOptions::new(DEFAULT_GAS_LIMIT, DEFAULT_CALL_GAS_PRICE)
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Devnet,
            deploy_gas: default_deploy_gas(),
            call_gas: default_call_gas(),
            attempt_timeout_secs: None,
        }
    }
}

impl BuilderConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self, EnsError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EnsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EnsError> {
        if self.attempt_timeout_secs == Some(0) {
            return Err(EnsError::Config(
                "attemptTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        for (what, gas) in [("deployGas", &self.deploy_gas), ("callGas", &self.call_gas)] {
            if gas.gas_limit == 0 {
                return Err(EnsError::Config(format!("{}.gasLimit must be non-zero", what)));
            }
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::default();
        assert_eq!(config.environment, Environment::Devnet);
        assert_eq!(config.deploy_gas, GasOptions::new(4_000_000, 9_000_000_000));
        assert_eq!(config.call_gas, GasOptions::new(4_000_000, 1_000_000_000));
        assert_eq!(config.attempt_timeout(), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BuilderConfig::from_json_str(
            r#"{"environment":"staging","callGas":{"gasLimit":500000,"gasPrice":2000000000}}"#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.call_gas, GasOptions::new(500_000, 2_000_000_000));
        assert_eq!(config.deploy_gas, default_deploy_gas());
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let err = BuilderConfig::from_json_str(r#"{"environment":"moon"}"#).unwrap_err();
        assert_eq!(err.error_code(), "config");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = BuilderConfig::from_json_str(
            r#"{"environment":"testnet","attemptTimeoutSecs":0}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EnsError::Config(_)));
    }

    #[test]
    fn test_attempt_timeout_opt_in() {
        let config = BuilderConfig::from_json_str(
            r#"{"environment":"testnet","attemptTimeoutSecs":300}"#,
        )
        .unwrap();
        assert_eq!(config.attempt_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_config_serialization() {
        let config = BuilderConfig::for_environment(Environment::Mainnet);
        let json = serde_json::to_string(&config).unwrap();
        let parsed = BuilderConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.environment, Environment::Mainnet);
        assert_eq!(parsed.deploy_gas, config.deploy_gas);
    }
}
