//! Weighted keys for the lottery reservoir.
//!
//! The reservoir follows Efraimidis–Spirakis weighted sampling without
//! replacement: each candidate of weight `w` draws `r` uniform in `(0, 1)` and
//! gets priority `r^(1/w)`; the `C` largest priorities form the sample.
//! `r^(1/w)` underflows for large weights, and so does its logarithm
//! `ln(r) / w` once the weight reaches realistic ANV sizes. The key is
//! therefore held as the rank `ln(w) - ln(-ln r)`, which equals
//! `-ln(-(ln(r) / w))`. It orders candidates identically, and its magnitude
//! stays below 100 for every `i64` weight, so a 96-bit decimal keeps about
//! 26 significant digits across the whole range.

use std::fmt;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, TypeError};

const LN_2: Decimal = dec!(0.6931471805599453094172321215);

/// Log-domain weighted key, stored as its rank `ln(w) - ln(-ln r)`.
///
/// Larger ranks are better candidates. The underlying Efraimidis–Spirakis key
/// `ln(r) / w` is `-exp(-rank)`, always negative.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeightedKey(Decimal);

impl WeightedKey {
    /// Size of the persisted form.
    pub const ENCODED_LEN: usize = 16;

    pub fn from_rank(rank: Decimal) -> Self {
        Self(rank)
    }

    pub fn rank(&self) -> Decimal {
        self.0
    }

    /// The key `ln(r) / w` as a float. Only for display and diagnostics; it
    /// rounds to `-0.0` for very heavy candidates, where the rank does not.
    pub fn to_f64(&self) -> f64 {
        let rank = self.0.to_f64().unwrap_or(f64::MAX);
        -(-rank).exp()
    }

    /// Compute the key of a candidate with the given ANV weight from a uniform
    /// 64-bit draw.
    ///
    /// Returns `None` for a non-positive weight: such a candidate has no
    /// chance of selection and never enters the reservoir.
    pub fn from_draw(draw: u64, weight: Amount) -> Option<Self> {
        let weight = u64::try_from(weight).ok().filter(|w| *w > 0)?;
        let log_r = log_uniform(draw);
        assert!(log_r < 0.0, "log of a clamped uniform draw must be negative");
        let draw_term = Decimal::from_f64((-log_r).ln())?;
        ln_weight(weight).checked_sub(draw_term).map(Self)
    }

    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.serialize()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            kind: "weighted key",
            expected: Self::ENCODED_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(Decimal::deserialize(arr)))
    }
}

impl fmt::Debug for WeightedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeightedKey(rank {})", self.0)
    }
}

impl fmt::Display for WeightedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:e}", self.to_f64())
    }
}

/// `ln(weight)` to within `1e-25`.
///
/// Consecutive weights up to `i64::MAX` differ by more than `1e-19` in their
/// logarithm, so the rank stays strictly increasing in the weight. Splits
/// `weight = m * 2^k` with `m` in `[1, 2)` and sums `ln(m) = 2 atanh(s)`,
/// `s = (m - 1) / (m + 1) < 1/3`, until the terms vanish at 28 places.
fn ln_weight(weight: u64) -> Decimal {
    let k = 63 - weight.leading_zeros();
    let m = Decimal::from(weight) / Decimal::from(1u64 << k);
    let s = (m - Decimal::ONE) / (m + Decimal::ONE);
    let s2 = s * s;

    let mut sum = Decimal::ZERO;
    let mut power = s;
    let mut n = 1u32;
    loop {
        let term = power / Decimal::from(n);
        if term.is_zero() {
            break;
        }
        sum += term;
        power *= s2;
        n += 2;
    }
    Decimal::TWO * sum + Decimal::from(k) * LN_2
}

/// `ln(draw / u64::MAX)`, i.e. the log of the draw scaled into `(0, 1)`.
///
/// Draws are clamped to `[1, u64::MAX - 1]` so the result is finite and
/// strictly negative. The upper half of the range goes through `ln_1p` so
/// draws close to `u64::MAX` keep their precision instead of cancelling
/// against `ln(u64::MAX)`.
pub fn log_uniform(draw: u64) -> f64 {
    let draw = draw.clamp(1, u64::MAX - 1);
    if draw <= u64::MAX / 2 {
        (draw as f64).ln() - (u64::MAX as f64).ln()
    } else {
        let gap = (u64::MAX - draw) as f64 / u64::MAX as f64;
        (-gap).ln_1p()
    }
}

/// One reservoir slot: a weighted key and the address that drew it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LotteryEntry {
    pub key: WeightedKey,
    pub address: Address,
}

impl LotteryEntry {
    pub fn new(key: WeightedKey, address: Address) -> Self {
        Self { key, address }
    }
}
