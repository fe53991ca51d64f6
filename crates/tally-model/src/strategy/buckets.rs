use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Histogram bucket layout.
///
/// Resolved into a list of upper bounds once, when the histogram is registered.
/// Every layout yields finite, strictly increasing bounds; the `+Inf` bucket is
/// implicit and never part of the list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Buckets {
    /// `count` bounds: `start`, `start + width`, `start + 2*width`, ...
    Linear { start: f64, width: f64, count: usize },
    /// `count` bounds: `start`, `start * factor`, `start * factor^2`, ...
    Exponential { start: f64, factor: f64, count: usize },
    /// For each power `p` in `low_power..=high_power`, `per_magnitude` evenly
    /// spaced bounds ending at `base^(p+1)`.
    ///
    /// `base: 10, low_power: 0, high_power: 1, per_magnitude: 5` gives
    /// `2, 4, 6, 8, 10, 20, 40, 60, 80, 100`.
    LogLinear {
        base: u32,
        low_power: i32,
        high_power: i32,
        per_magnitude: usize,
    },
    /// Caller supplied bounds.
    Explicit { bounds: Vec<f64> },
}

impl Default for Buckets {
    fn default() -> Self {
        Buckets::LogLinear {
            base: 10,
            low_power: -1,
            high_power: 3,
            per_magnitude: 5,
        }
    }
}

impl Buckets {
    /// Shorthand for [`Buckets::Linear`].
    pub fn linear(start: f64, width: f64, count: usize) -> Self {
        Buckets::Linear {
            start,
            width,
            count,
        }
    }

    /// Shorthand for [`Buckets::Exponential`].
    pub fn exponential(start: f64, factor: f64, count: usize) -> Self {
        Buckets::Exponential {
            start,
            factor,
            count,
        }
    }

    /// Shorthand for [`Buckets::LogLinear`].
    pub fn log_linear(base: u32, low_power: i32, high_power: i32, per_magnitude: usize) -> Self {
        Buckets::LogLinear {
            base,
            low_power,
            high_power,
            per_magnitude,
        }
    }

    /// Shorthand for [`Buckets::Explicit`].
    pub fn explicit(bounds: impl Into<Vec<f64>>) -> Self {
        Buckets::Explicit {
            bounds: bounds.into(),
        }
    }

    /// Generate the upper bounds, validating the parameters.
    ///
    /// At most [`MAX_BUCKETS`] bounds are accepted.
    pub fn bounds(&self) -> ModelResult<Vec<f64>> {
        let out = match *self {
            Buckets::Linear {
                start,
                width,
                count,
            } => {
                if !(width > 0.0) || !start.is_finite() || count == 0 {
                    return Err(invalid(format!(
                        "linear needs width > 0 and count > 0 (start={start}, width={width}, count={count})"
                    )));
                }
                check_count(count)?;
                smooth((0..count).map(|i| start + width * i as f64).collect())
            }
            Buckets::Exponential {
                start,
                factor,
                count,
            } => {
                if !(start > 0.0) || !(factor > 1.0) || count == 0 {
                    return Err(invalid(format!(
                        "exponential needs start > 0, factor > 1, count > 0 (start={start}, factor={factor}, count={count})"
                    )));
                }
                check_count(count)?;
                smooth(
                    (0..count)
                        .map(|i| start * factor.powi(i as i32))
                        .collect(),
                )
            }
            Buckets::LogLinear {
                base,
                low_power,
                high_power,
                per_magnitude,
            } => {
                if base < 2 || low_power > high_power || per_magnitude == 0 {
                    return Err(invalid(format!(
                        "log-linear needs base >= 2, low_power <= high_power, per_magnitude > 0 (base={base}, low={low_power}, high={high_power}, per={per_magnitude})"
                    )));
                }
                let magnitudes = u64::from(high_power.abs_diff(low_power)) + 1;
                let total = u64::try_from(per_magnitude)
                    .ok()
                    .and_then(|per| per.checked_mul(magnitudes))
                    .and_then(|total| usize::try_from(total).ok())
                    .unwrap_or(usize::MAX);
                check_count(total)?;
                // Bounds of power `p` end at `base^(p+1)`.
                let Some(top_power) = high_power.checked_add(1) else {
                    return Err(invalid(format!("high_power {high_power} is out of range")));
                };

                let mut out: Vec<f64> = Vec::with_capacity(total);
                for power in low_power..top_power {
                    let top = f64::from(base).powi(power + 1);
                    let step = top / per_magnitude as f64;
                    for i in 1..=per_magnitude {
                        let bound = round_significant(step * i as f64);
                        // Magnitudes overlap when per_magnitude > base.
                        if out.last().is_none_or(|last| bound > *last) {
                            out.push(bound);
                        }
                    }
                }
                out
            }
            Buckets::Explicit { ref bounds } => {
                check_count(bounds.len())?;
                bounds.clone()
            }
        };

        check_bounds(&out)?;
        Ok(out)
    }
}

/// Upper limit on the number of bounds of one layout.
pub const MAX_BUCKETS: usize = 1_000;

fn check_count(count: usize) -> ModelResult<()> {
    if count > MAX_BUCKETS {
        return Err(invalid(format!(
            "{count} buckets requested, at most {MAX_BUCKETS} allowed"
        )));
    }
    Ok(())
}

/// Round generated bounds to drop float noise, unless rounding would merge or
/// reorder neighbours; then the raw values are kept.
fn smooth(raw: Vec<f64>) -> Vec<f64> {
    let rounded: Vec<f64> = raw.iter().copied().map(round_significant).collect();
    if rounded.windows(2).all(|w| w[0] < w[1]) {
        rounded
    } else {
        raw
    }
}

fn invalid(msg: String) -> ModelError {
    ModelError::InvalidBuckets(msg)
}

fn check_bounds(bounds: &[f64]) -> ModelResult<()> {
    if bounds.is_empty() {
        return Err(invalid("at least one bound is required".to_string()));
    }
    if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(invalid(format!("bound {bad} is not finite")));
    }
    if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(invalid(format!(
            "bounds must be strictly increasing ({} >= {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Round to 10 significant digits so `0.2 * 3` comes out as `0.6`.
fn round_significant(v: f64) -> f64 {
    const DIGITS: i32 = 10;

    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let magnitude = v.abs().log10().floor() as i32;
    let shift = DIGITS - 1 - magnitude;
    if shift >= 0 {
        let scale = 10f64.powi(shift);
        (v * scale).round() / scale
    } else {
        let scale = 10f64.powi(-shift);
        (v / scale).round() * scale
    }
}
