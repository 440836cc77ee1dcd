//! Technical indicators for signal generation
//!
//! All functions work on f64 series ordered oldest to newest and return the value at the
//! latest point, or `None` when the series is too short.

use types::Candle;

/// True range series; `TR[i] = max(high-low, |high-prev_close|, |low-prev_close|)`
///
/// Starts at the second candle since the first has no previous close.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close_f64();
            let high = pair[1].high_f64();
            let low = pair[1].low_f64();
            (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs())
        })
        .collect()
}

/// Wilder-smoothed average (alpha = 1/period) seeded with the SMA of the first `period` values
pub fn wilder_smooth(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 1.0 / period as f64;
    Some(
        values[period..]
            .iter()
            .fold(seed, |prev, &v| alpha * v + (1.0 - alpha) * prev),
    )
}

/// Average true range with Wilder smoothing
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    wilder_smooth(&true_ranges(candles), period)
}

/// Exponential moving average (alpha = 2/(period+1)) seeded with the SMA of the first `period` values
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let seed = values[..period].iter().sum::<f64>() / period as f64;
    let alpha = 2.0 / (period as f64 + 1.0);
    Some(
        values[period..]
            .iter()
            .fold(seed, |prev, &v| alpha * v + (1.0 - alpha) * prev),
    )
}

/// Population mean and standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Z-score of the latest value against the `window` values preceding it
///
/// Returns 0 when the window has no dispersion.
pub fn zscore_of_latest(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window + 1 {
        return None;
    }

    let latest = values[values.len() - 1];
    let history = &values[values.len() - 1 - window..values.len() - 1];
    let (mean, std) = mean_std(history);

    if std <= f64::EPSILON {
        Some(0.0)
    } else {
        Some((latest - mean) / std)
    }
}

/// Position of the latest close inside the trailing `window` high/low range, in [0, 1]
///
/// A flat range yields 0.5.
pub fn range_position(candles: &[Candle], window: usize) -> Option<f64> {
    if window == 0 || candles.len() < window {
        return None;
    }

    let recent = &candles[candles.len() - window..];
    let high = recent.iter().map(Candle::high_f64).fold(f64::MIN, f64::max);
    let low = recent.iter().map(Candle::low_f64).fold(f64::MAX, f64::min);
    let close = recent[recent.len() - 1].close_f64();

    let span = high - low;
    if span <= f64::EPSILON {
        Some(0.5)
    } else {
        Some(((close - low) / span).clamp(0.0, 1.0))
    }
}

/// Latest close-to-close return
pub fn latest_return(closes: &[f64]) -> Option<f64> {
    match closes {
        [.., prev, last] if *prev > 0.0 => Some(last / prev - 1.0),
        _ => None,
    }
}
