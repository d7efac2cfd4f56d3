//! Rolling-window indicator primitives
//!
//! Every function returns one slot per input bar. `None` marks a value that
//! is undefined because its warm-up window is not yet full; callers drop
//! such rows instead of imputing them.

/// Small constant keeping ratio indicators finite
pub const EPSILON: f64 = 1e-6;

/// Lift a fully defined series into the optional form
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// `values[t] - values[t - 1]`, undefined on the first bar
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    shift_diff(values, 1)
}

/// `values[t] - values[t - lag]`
pub fn shift_diff(values: &[f64], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| (t >= lag).then(|| values[t] - values[t - lag]))
        .collect()
}

/// Simple rolling mean; defined only when the whole window is defined
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let ss: f64 = w.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (w.len() - 1) as f64).sqrt()
    })
}

fn rolling<F>(values: &[Option<f64>], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut buf = Vec::with_capacity(window);

    for t in (window - 1)..values.len() {
        buf.clear();
        buf.extend(values[t + 1 - window..=t].iter().flatten());
        if buf.len() == window {
            let v = reduce(&buf);
            out[t] = v.is_finite().then_some(v);
        }
    }
    out
}

/// Adjusted exponential moving average with `alpha = 2 / (span + 1)`.
///
/// Each output is the weighted mean of all bars so far with weights
/// `(1 - alpha)^age`, so it is defined from the first bar.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    values
        .iter()
        .map(|&v| {
            numerator = v + decay * numerator;
            denominator = 1.0 + decay * denominator;
            numerator / denominator
        })
        .collect()
}

/// RSI over simple rolling means of gains and losses, scaled 0-100
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let delta = diff(closes);
    let gains: Vec<Option<f64>> = delta
        .iter()
        .map(|d| Some(d.filter(|v| *v > 0.0).unwrap_or(0.0)))
        .collect();
    let losses: Vec<Option<f64>> = delta
        .iter()
        .map(|d| Some(d.filter(|v| *v < 0.0).map(|v| -v).unwrap_or(0.0)))
        .collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| {
            let rs = (*g)? / ((*l)? + EPSILON);
            Some(100.0 - 100.0 / (1.0 + rs))
        })
        .collect()
}

/// MACD histogram: (EMA fast - EMA slow) minus its own EMA
pub fn macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<f64> {
    let fast_ema = ewm_mean(closes, fast);
    let slow_ema = ewm_mean(closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ewm_mean(&line, signal);
    line.iter().zip(&signal_line).map(|(m, s)| m - s).collect()
}

/// Average directional index.
///
/// Directional movement compares the raw high and low deltas
/// (`high.diff()` against `low.diff()`), true range is undefined on the
/// first bar, and both the DI lines and the final DX are simple rolling
/// means over `period`.
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let high_diff = diff(highs);
    let low_diff = diff(lows);

    let mut plus_dm = Vec::with_capacity(n);
    let mut minus_dm = Vec::with_capacity(n);
    for (up, dn) in high_diff.iter().zip(&low_diff) {
        let (plus, minus) = match (up, dn) {
            (Some(up), Some(dn)) => (
                if up > dn && *up > 0.0 { *up } else { 0.0 },
                if dn > up && *dn > 0.0 { *dn } else { 0.0 },
            ),
            _ => (0.0, 0.0),
        };
        plus_dm.push(Some(plus));
        minus_dm.push(Some(minus));
    }

    let true_range: Vec<Option<f64>> = (0..n)
        .map(|t| {
            (t > 0).then(|| {
                let prev_close = closes[t - 1];
                (highs[t] - lows[t])
                    .max((highs[t] - prev_close).abs())
                    .max((lows[t] - prev_close).abs())
            })
        })
        .collect();

    let atr = rolling_mean(&true_range, period);
    let plus_avg = rolling_mean(&plus_dm, period);
    let minus_avg = rolling_mean(&minus_dm, period);

    let dx: Vec<Option<f64>> = (0..n)
        .map(|t| {
            let atr = atr[t]?;
            let plus_di = 100.0 * plus_avg[t]? / (atr + EPSILON);
            let minus_di = 100.0 * minus_avg[t]? / (atr + EPSILON);
            Some((plus_di - minus_di).abs() / (plus_di + minus_di + EPSILON) * 100.0)
        })
        .collect();

    rolling_mean(&dx, period)
}

/// Bollinger bands as `(upper, lower)` at `width` standard deviations
pub fn bollinger(closes: &[f64], window: usize, width: f64) -> Vec<Option<(f64, f64)>> {
    let values = defined(closes);
    let mean = rolling_mean(&values, window);
    let std = rolling_std(&values, window);

    mean.iter()
        .zip(&std)
        .map(|(m, s)| {
            let (m, s) = ((*m)?, (*s)?);
            Some((m + width * s, m - width * s))
        })
        .collect()
}
