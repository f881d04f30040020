//! Conversion parameters shared by every engine operation.
//!
//! A [`ConversionConfig`] is built once, validated, and handed to the engine's
//! constructor. Nothing mutates it afterwards.

use crate::coin::{validate_denom, CoinsError};
use alloy_primitives::U256;
use serde::Deserialize;
use serde_json::Value;
use std::{env, str::FromStr};
use thiserror::Error;

/// Default 18-decimal denom used by the EVM.
pub const DEFAULT_EVM_DENOM: &str = "atoken";

/// Default 6-decimal denom of the native ledger.
pub const DEFAULT_NATIVE_DENOM: &str = "utoken";

/// Default name of the module account that backs fractional balances.
pub const DEFAULT_RESERVE_MODULE: &str = "precisebank";

/// Prefix of the environment variables read by [`ConversionConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "EV_PRECISEBANK";

/// Key of the conversion section inside chainspec extras.
pub const EXTRAS_KEY: &str = "precisebank";

const DEFAULT_EVM_DECIMALS: u8 = 18;
const DEFAULT_NATIVE_DECIMALS: u8 = 6;

/// Immutable denom and multiplier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    evm_denom: String,
    native_denom: String,
    conversion_multiplier: U256,
    reserve_module: String,
}

impl ConversionConfig {
    /// Builds and validates a configuration.
    pub fn new(
        evm_denom: impl Into<String>,
        native_denom: impl Into<String>,
        conversion_multiplier: U256,
        reserve_module: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            evm_denom: evm_denom.into(),
            native_denom: native_denom.into(),
            conversion_multiplier,
            reserve_module: reserve_module.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration whose multiplier is
    /// `10^(evm_decimals - native_decimals)`.
    pub fn from_decimals(
        evm_denom: impl Into<String>,
        native_denom: impl Into<String>,
        evm_decimals: u8,
        native_decimals: u8,
        reserve_module: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let multiplier = multiplier_for_decimals(evm_decimals, native_decimals)?;
        Self::new(evm_denom, native_denom, multiplier, reserve_module)
    }

    /// Loads the configuration from `EV_PRECISEBANK_*` environment variables.
    ///
    /// See [`ConversionConfig::from_env_prefixed`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_prefixed(DEFAULT_ENV_PREFIX)
    }

    /// Loads the configuration from `<prefix>_EVM_DENOM`, `<prefix>_NATIVE_DENOM`,
    /// `<prefix>_CONVERSION_MULTIPLIER` and `<prefix>_RESERVE_MODULE`.
    ///
    /// Unset variables fall back to the defaults. A variable that is set but
    /// empty is an error. The multiplier accepts decimal or `0x`-prefixed hex.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let evm_denom = env_override(prefix, "EVM_DENOM")?.unwrap_or(defaults.evm_denom);
        let native_denom = env_override(prefix, "NATIVE_DENOM")?.unwrap_or(defaults.native_denom);
        let conversion_multiplier = match env_override(prefix, "CONVERSION_MULTIPLIER")? {
            Some(raw) => U256::from_str(&raw)
                .map_err(|err| ConfigError::InvalidMultiplier(err.to_string()))?,
            None => defaults.conversion_multiplier,
        };
        let reserve_module =
            env_override(prefix, "RESERVE_MODULE")?.unwrap_or(defaults.reserve_module);

        Self::new(evm_denom, native_denom, conversion_multiplier, reserve_module)
    }

    /// Reads the `precisebank` section of a chainspec extras blob.
    ///
    /// Expected shape (every field optional):
    /// {
    ///   "precisebank": {
    ///     "evmDenom": "atoken",
    ///     "nativeDenom": "utoken",
    ///     "evmDecimals": 18,
    ///     "nativeDecimals": 6,
    ///     "reserveModule": "precisebank"
    ///   }
    /// }
    pub fn from_extras(extras: &Value) -> Result<Self, ConfigError> {
        let section = extras.get(EXTRAS_KEY).ok_or(ConfigError::Missing)?;
        let parsed = ChainspecConversionConfig::deserialize(section)
            .map_err(|err| ConfigError::InvalidExtras(err.to_string()))?;
        Self::from_decimals(
            parsed.evm_denom,
            parsed.native_denom,
            parsed.evm_decimals,
            parsed.native_decimals,
            parsed.reserve_module,
        )
    }

    /// Checks denom syntax, denom distinctness, multiplier and module name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_denom(&self.evm_denom)?;
        validate_denom(&self.native_denom)?;
        if self.evm_denom == self.native_denom {
            return Err(ConfigError::IdenticalDenoms(self.evm_denom.clone()));
        }
        if self.conversion_multiplier.is_zero() {
            return Err(ConfigError::ZeroMultiplier);
        }
        if self.reserve_module.trim().is_empty() {
            return Err(ConfigError::EmptyReserveModule);
        }
        Ok(())
    }

    /// Denom of the high-precision unit exposed to the EVM.
    pub fn evm_denom(&self) -> &str {
        &self.evm_denom
    }

    /// Denom of the coarse unit held by the native ledger.
    pub fn native_denom(&self) -> &str {
        &self.native_denom
    }

    /// Extended units per native unit.
    pub const fn conversion_multiplier(&self) -> U256 {
        self.conversion_multiplier
    }

    /// Module account that absorbs top-ups and funds sweeps.
    pub fn reserve_module(&self) -> &str {
        &self.reserve_module
    }
}

impl Default for ConversionConfig {
    /// `atoken` over `utoken` with a multiplier of `10^12`, reserve module
    /// `precisebank`.
    fn default() -> Self {
        Self {
            evm_denom: DEFAULT_EVM_DENOM.to_string(),
            native_denom: DEFAULT_NATIVE_DENOM.to_string(),
            conversion_multiplier: U256::from(1_000_000_000_000u64),
            reserve_module: DEFAULT_RESERVE_MODULE.to_string(),
        }
    }
}

/// Errors that can occur while building a [`ConversionConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Chainspec extras carry no conversion section.
    #[error("missing precisebank section in chainspec extras")]
    Missing,
    /// The conversion section could not be deserialized.
    #[error("invalid precisebank extras: {0}")]
    InvalidExtras(String),
    /// An environment variable was set to an empty string.
    #[error("environment variable {var} is empty")]
    EmptyEnv {
        /// Name of the offending variable.
        var: String,
    },
    /// An environment variable held non-UTF-8 data.
    #[error("environment variable {var} is not valid unicode")]
    NotUnicodeEnv {
        /// Name of the offending variable.
        var: String,
    },
    /// One of the denoms is malformed.
    #[error(transparent)]
    InvalidDenom(#[from] CoinsError),
    /// Both units were given the same denom.
    #[error("evm and native denoms must differ, both are {0}")]
    IdenticalDenoms(String),
    /// A multiplier of zero cannot convert anything.
    #[error("conversion multiplier must be positive")]
    ZeroMultiplier,
    /// The multiplier string could not be parsed.
    #[error("invalid conversion multiplier: {0}")]
    InvalidMultiplier(String),
    /// The decimal pair does not describe a finer EVM unit.
    #[error("evm decimals ({evm}) must exceed native decimals ({native}) by at most 77")]
    InvalidDecimals {
        /// Decimals of the EVM denom.
        evm: u8,
        /// Decimals of the native denom.
        native: u8,
    },
    /// The reserve module name is blank.
    #[error("reserve module name cannot be empty")]
    EmptyReserveModule,
}

/// On-disk shape of the chainspec extras section.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainspecConversionConfig {
    #[serde(default = "default_evm_denom")]
    evm_denom: String,
    #[serde(default = "default_native_denom")]
    native_denom: String,
    #[serde(default = "default_evm_decimals")]
    evm_decimals: u8,
    #[serde(default = "default_native_decimals")]
    native_decimals: u8,
    #[serde(default = "default_reserve_module")]
    reserve_module: String,
}

fn default_evm_denom() -> String {
    DEFAULT_EVM_DENOM.to_string()
}

fn default_native_denom() -> String {
    DEFAULT_NATIVE_DENOM.to_string()
}

const fn default_evm_decimals() -> u8 {
    DEFAULT_EVM_DECIMALS
}

const fn default_native_decimals() -> u8 {
    DEFAULT_NATIVE_DECIMALS
}

fn default_reserve_module() -> String {
    DEFAULT_RESERVE_MODULE.to_string()
}

fn multiplier_for_decimals(evm: u8, native: u8) -> Result<U256, ConfigError> {
    if evm <= native {
        return Err(ConfigError::InvalidDecimals { evm, native });
    }
    U256::from(10u64)
        .checked_pow(U256::from(evm - native))
        .ok_or(ConfigError::InvalidDecimals { evm, native })
}

fn env_override(prefix: &str, key: &str) -> Result<Option<String>, ConfigError> {
    let var = format!("{prefix}_{key}");
    match env::var(&var) {
        Ok(raw) if raw.trim().is_empty() => Err(ConfigError::EmptyEnv { var }),
        Ok(raw) => Ok(Some(raw.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicodeEnv { var }),
    }
}
