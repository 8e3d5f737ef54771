//! Numeric kernels shared by the detectors and the correlation strategy.
//!
//! All functions return `None` on degenerate input (empty slices, zero
//! variance, zero range) and whenever a result would be NaN or infinite,
//! which happens when finite samples overflow during summation.

/// Relative tolerance below which a spread counts as zero.
///
/// Spreads are compared against the magnitude of the data they come from, so
/// series on any scale (nanoseconds or bytes) are treated alike.
pub const EPSILON: f64 = 1e-10;

/// True when `spread` is zero at the scale of `magnitude`.
///
/// Both arguments are in the units of the data. Exact zero always counts.
pub fn is_negligible(spread: f64, magnitude: f64) -> bool {
    spread <= EPSILON * magnitude.abs()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn root_sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    finite(variance.sqrt())
}

/// Ordinary least-squares fit of `value ~ index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fits a line through `(i, values[i])`.
///
/// Returns `None` for fewer than two points or when the values have no
/// variance (`SS_tot = 0`), where R² is undefined.
pub fn linear_regression(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = mean(values)?;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx <= 0.0 {
        return None;
    }

    let slope = finite(sxy / sxx)?;
    let intercept = finite(mean_y - slope * mean_x)?;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, y) in values.iter().enumerate() {
        let predicted = intercept + slope * i as f64;
        ss_res += (y - predicted).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }
    if !ss_res.is_finite()
        || !ss_tot.is_finite()
        || is_negligible(ss_tot.sqrt(), root_sum_of_squares(values))
    {
        return None;
    }

    Some(LinearFit {
        slope,
        intercept,
        r_squared: finite(1.0 - ss_res / ss_tot)?,
    })
}

/// Autocorrelation of the series with itself shifted by `lag`.
pub fn autocorrelation(values: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 || lag >= values.len() {
        return None;
    }

    let mean = mean(values)?;
    let denominator: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if !denominator.is_finite() || is_negligible(denominator.sqrt(), root_sum_of_squares(values)) {
        return None;
    }

    let numerator: f64 = values
        .iter()
        .zip(values.iter().skip(lag))
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum();

    finite(numerator / denominator)
}

/// Sample moments used by the shape test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    /// Excess kurtosis (0 for a normal distribution)
    pub kurtosis: f64,
}

/// Mean, population std dev, skewness and excess kurtosis.
pub fn moments(values: &[f64]) -> Option<Moments> {
    let mean = mean(values)?;
    let std_dev = population_std_dev(values)?;
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if is_negligible(std_dev, scale) {
        return None;
    }

    let n = values.len() as f64;
    let (m3, m4) = values.iter().fold((0.0, 0.0), |(m3, m4), v| {
        let z = (v - mean) / std_dev;
        (m3 + z.powi(3), m4 + z.powi(4))
    });

    Some(Moments {
        mean,
        std_dev,
        skewness: finite(m3 / n)?,
        kurtosis: finite(m4 / n - 3.0)?,
    })
}

/// Chi-square statistic of the values against a uniform distribution over
/// `buckets` equal-width bins spanning `[min, max]`.
pub fn chi_square_uniform(values: &[f64], buckets: usize) -> Option<f64> {
    if values.is_empty() || buckets == 0 {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let range = max - min;
    if !range.is_finite() || is_negligible(range, min.abs().max(max.abs())) {
        return None;
    }

    let mut counts = vec![0usize; buckets];
    for value in &sorted {
        let bucket = (((value - min) / range) * buckets as f64) as usize;
        counts[bucket.min(buckets - 1)] += 1;
    }

    let expected = sorted.len() as f64 / buckets as f64;
    finite(
        counts
            .iter()
            .map(|&observed| (observed as f64 - expected).powi(2) / expected)
            .sum(),
    )
}

/// Pearson correlation coefficient of two aligned series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if is_negligible(sxx.sqrt(), root_sum_of_squares(x))
        || is_negligible(syy.sqrt(), root_sum_of_squares(y))
    {
        return None;
    }

    let r = finite(sxy / (sxx.sqrt() * syy.sqrt()))?;
    Some(r.clamp(-1.0, 1.0))
}

/// Linear-interpolated quantile of an already sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}
