//! Flow split arithmetic of the cash flow contract.
//!
//! An incoming flow of `flow_rate` per second is paid out as two outgoing flows whose sum is
//! twice the incoming rate, weighted by the ratio of the two token reserves. All values are
//! integers in 18-decimal fixed point, the same way the contract computes them.

use alloy_core::primitives::U256;
use anyhow::{Context, Result};

/// `10^18`, one in 18-decimal fixed point.
pub const ONE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Largest value accepted by [`safe_cast_to_int96`], `2^96 - 1`.
pub const MAX_INT96: U256 = U256::from_limbs([u64::MAX, (1 << 32) - 1, 0, 0]);

/// `numerator / denominator` in 18-decimal fixed point, rounded up by the contract's rule:
/// `((numerator * 10^19 / denominator) + 19) / 10`.
pub fn ratio(numerator: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        anyhow::bail!("Cannot compute a ratio with a zero denominator");
    }

    let scaled = numerator
        .checked_mul(ONE * U256::from(10))
        .context("Ratio numerator overflow")?;

    Ok((scaled / denominator + U256::from(19)) / U256::from(10))
}

/// Values that do not fit are mapped to zero.
pub fn safe_cast_to_int96(value: U256) -> U256 {
    if value > MAX_INT96 { U256::ZERO } else { value }
}

/// The two outgoing flow rates for one incoming flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSplit {
    /// `reserve_b / reserve_a` in 18-decimal fixed point.
    pub ratio: U256,
    pub out_rate_a: U256,
    pub out_rate_b: U256,
}

/// Split an incoming flow according to the reserves of the two tokens.
pub fn split(flow_rate: U256, reserve_a: U256, reserve_b: U256) -> Result<FlowSplit> {
    let ratio = ratio(reserve_b, reserve_a)?;

    let out_rate_a = ratio
        .checked_mul(flow_rate)
        .context("Outgoing flow rate overflow")?
        / ONE;
    let total = flow_rate
        .checked_mul(U256::from(2))
        .context("Total flow rate overflow")?;
    let out_rate_b = total.checked_sub(out_rate_a).with_context(|| {
        format!(
            "Reserve ratio {} exceeds 2, the first outgoing flow would take more than the total",
            ratio
        )
    })?;

    Ok(FlowSplit {
        ratio,
        out_rate_a: safe_cast_to_int96(out_rate_a),
        out_rate_b: safe_cast_to_int96(out_rate_b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ether(n: u64) -> U256 {
        U256::from(n) * ONE
    }

    #[test]
    fn test_constants() {
        assert_eq!(ONE, U256::from(10u64).pow(U256::from(18)));
        assert_eq!(MAX_INT96, (U256::from(1) << 96) - U256::from(1));
    }

    #[test]
    fn test_ratio_rounding() {
        assert_eq!(
            ratio(ether(99), ether(100)).unwrap(),
            U256::from(990_000_000_000_000_001u64)
        );
        assert_eq!(
            ratio(ether(1), ether(1)).unwrap(),
            U256::from(1_000_000_000_000_000_001u64)
        );
        assert!(ratio(ether(1), U256::ZERO).is_err());
    }

    #[test]
    fn test_split_reference_values() {
        let flow_rate = U256::from(38_580_000_000_000u64);

        let split = split(flow_rate, ether(100), ether(99)).unwrap();

        assert_eq!(split.ratio, U256::from(990_000_000_000_000_001u64));
        assert_eq!(split.out_rate_a, U256::from(38_194_200_000_000u64));
        assert_eq!(split.out_rate_b, U256::from(38_965_800_000_000u64));
        assert_eq!(split.out_rate_a + split.out_rate_b, flow_rate * U256::from(2));
    }

    #[test]
    fn test_split_rejects_lopsided_reserves() {
        let err = split(U256::from(1_000u64), ether(1), ether(3)).unwrap_err();
        assert!(err.to_string().contains("exceeds 2"));
    }

    #[test]
    fn test_safe_cast_to_int96() {
        assert_eq!(safe_cast_to_int96(MAX_INT96), MAX_INT96);
        assert_eq!(safe_cast_to_int96(MAX_INT96 + U256::from(1)), U256::ZERO);
    }
}
