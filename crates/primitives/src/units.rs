use alloy_primitives::{
    U256,
    utils::{UnitsError, parse_ether},
};

/// Wei per ETH. Every raw value is scaled by this factor, in thresholds and in
/// displayed amounts alike.
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// SQL literal for [`WEI_PER_ETH`].
pub const WEI_PER_ETH_SQL: &str = "1e18";

/// SQL literal for wei per gwei.
pub const WEI_PER_GWEI_SQL: &str = "1e9";

/// Convert a whole-ETH amount into raw wei without going through float
/// multiplication.
///
/// The amount is rendered with `f64`'s shortest round-trip representation and
/// parsed as a decimal, so `50.5` becomes exactly `50_500_000_000_000_000_000`.
/// Callers are expected to reject negative and non-finite values first.
pub fn eth_to_wei(eth: f64) -> Result<U256, UnitsError> {
    parse_ether(&eth.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_eth_converts_with_fixed_scale() {
        assert_eq!(eth_to_wei(100.0).unwrap(), U256::from(100 * WEI_PER_ETH));
        assert_eq!(eth_to_wei(1.0).unwrap(), U256::from(WEI_PER_ETH));
    }

    #[test]
    fn fractional_eth_is_exact() {
        assert_eq!(eth_to_wei(0.5).unwrap(), U256::from(WEI_PER_ETH / 2));
        assert_eq!(eth_to_wei(50.5).unwrap(), U256::from(50_500_000_000_000_000_000u128));
    }

    #[test]
    fn large_thresholds_do_not_overflow() {
        let wei = eth_to_wei(1_000_000.0).unwrap();
        assert_eq!(wei, U256::from(1_000_000u128) * U256::from(WEI_PER_ETH));
    }

    #[test]
    fn sql_scale_matches_constant() {
        assert_eq!(WEI_PER_ETH_SQL.parse::<f64>().unwrap(), WEI_PER_ETH as f64);
    }
}
