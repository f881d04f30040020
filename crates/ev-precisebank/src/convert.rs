//! Amount validation and the integer split between native and extended units.

use crate::{
    coin::{Coin, Coins, CoinsError},
    config::ConversionConfig,
};
use alloy_primitives::U256;

impl ConversionConfig {
    /// Validates an amount to convert and returns it as a single EVM-denom coin.
    ///
    /// Empty input is valid and yields a zero coin. Otherwise the coins must be
    /// structurally valid and consist of exactly one entry in the EVM denom.
    pub fn validate_amount(&self, coins: &Coins) -> Result<Coin, CoinsError> {
        if coins.is_empty() {
            return Ok(Coin::zero(self.evm_denom()));
        }

        coins.validate()?;

        if let Some(other) = coins.iter().find(|coin| coin.denom != self.evm_denom()) {
            return Err(CoinsError::UnsupportedDenom {
                denom: other.denom.clone(),
                expected: self.evm_denom().to_string(),
            });
        }
        // validated coins never repeat a denom, so only one entry is left
        debug_assert_eq!(coins.len(), 1);

        Ok(coins.as_slice()[0].clone())
    }

    /// Splits an EVM-denom amount into whole native units and the extended
    /// remainder.
    ///
    /// `native.amount * multiplier + remainder == amount` and
    /// `remainder < multiplier` always hold.
    pub fn split(&self, amount: U256) -> (Coin, U256) {
        let multiplier = self.conversion_multiplier();
        let native = Coin::new(self.native_denom(), amount / multiplier);
        (native, amount % multiplier)
    }

    /// Conceptual EVM balance of `native` whole units plus `extended` remainder.
    ///
    /// Saturates instead of wrapping for values beyond 256 bits.
    pub fn combine(&self, native: U256, extended: U256) -> U256 {
        native
            .saturating_mul(self.conversion_multiplier())
            .saturating_add(extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(denom: &str, amount: u64) -> Coin {
        Coin::new(denom, U256::from(amount))
    }

    #[test]
    fn validate_amount_cases() {
        let config = ConversionConfig::default();
        let cases: Vec<(&str, Coins, Result<Coin, CoinsError>)> = vec![
            (
                "valid coins",
                Coins::new(vec![coin("atoken", 500)]),
                Ok(coin("atoken", 500)),
            ),
            ("empty coins", Coins::empty(), Ok(coin("atoken", 0))),
            (
                "zero amount",
                Coins::new(vec![coin("atoken", 0)]),
                Ok(coin("atoken", 0)),
            ),
            (
                "dup coins",
                Coins::new(vec![coin("atoken", 500), coin("atoken", 500)]),
                Err(CoinsError::DuplicateDenom("atoken".to_string())),
            ),
            (
                "not evm coins",
                Coins::new(vec![coin("utoken", 500)]),
                Err(CoinsError::UnsupportedDenom {
                    denom: "utoken".to_string(),
                    expected: "atoken".to_string(),
                }),
            ),
            (
                "evm coin alongside another denom",
                Coins::new(vec![coin("atoken", 500), coin("busd", 1000)]),
                Err(CoinsError::UnsupportedDenom {
                    denom: "busd".to_string(),
                    expected: "atoken".to_string(),
                }),
            ),
            (
                "unsorted coins",
                Coins::new(vec![coin("busd", 1000), coin("atoken", 500)]),
                Err(CoinsError::Unsorted {
                    previous: "busd".to_string(),
                    next: "atoken".to_string(),
                }),
            ),
        ];

        for (name, coins, expected) in cases {
            assert_eq!(config.validate_amount(&coins), expected, "case: {name}");
        }
    }

    #[test]
    fn negative_amounts_never_validate() {
        let config = ConversionConfig::default();
        let parsed = "-500atoken".parse::<Coins>();
        assert!(matches!(parsed, Err(CoinsError::NegativeAmount(_))));
        // a caller can only reach `validate_amount` with unsigned amounts
        let coins: Coins = "500atoken".parse().unwrap();
        assert_eq!(config.validate_amount(&coins), Ok(coin("atoken", 500)));
    }

    #[test]
    fn split_cases() {
        let config = ConversionConfig::default();
        let cases = [
            ("zero", 0u64, 0u64, 0u64),
            ("native and extended", 8_000_000_000_123, 8, 123),
            ("only extended", 10_123, 0, 10_123),
            ("only native", 5_000_000_000_000, 5, 0),
            ("just below one unit", 999_999_999_999, 0, 999_999_999_999),
        ];

        for (name, amount, native, remainder) in cases {
            let (native_coin, rem) = config.split(U256::from(amount));
            assert_eq!(native_coin, coin("utoken", native), "case: {name}");
            assert_eq!(rem, U256::from(remainder), "case: {name}");
        }
    }

    #[test]
    fn split_handles_full_width_amounts() {
        let config = ConversionConfig::default();
        let (native, remainder) = config.split(U256::MAX);
        let multiplier = config.conversion_multiplier();
        assert!(remainder < multiplier);
        assert_eq!(native.amount * multiplier + remainder, U256::MAX);
    }

    #[test]
    fn combine_inverts_split() {
        let config = ConversionConfig::default();
        let amount = U256::from(31_000_000_000_220u64);
        let (native, remainder) = config.split(amount);
        assert_eq!(config.combine(native.amount, remainder), amount);
    }
}
