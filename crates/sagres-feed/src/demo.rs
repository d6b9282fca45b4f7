//! Synthetic demo feeds.
//!
//! Generates a realistic, reproducible stand-in for the live backend:
//! a random-walk price with drift plus feed series that carry deliberate
//! relationships to it (volatility-driven borrow, lagged repay, a
//! slightly leading RSI, momentum-coupled funding, trending open
//! interest), so the evaluation pipeline has something to find.

use chrono::Duration;
use rand::distributions::Standard;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sagres_signals::RawFeeds;
use sagres_traits::{Result, TimeSeries, Timestamp};

/// Fixed seed so demo runs are reproducible.
const DEMO_SEED: u64 = 42;

/// Demo price level the other series are scaled against.
const BASE_PRICE: f64 = 90_000.0;

/// Generate demo feeds ending at `end`, covering the trailing `hours`
/// at `step_minutes` resolution.
///
/// # Errors
///
/// Propagates series-construction errors.
pub fn demo_feeds(asset: &str, hours: i64, step_minutes: i64, end: Timestamp) -> Result<RawFeeds> {
    let step_minutes = step_minutes.max(1);
    let n = ((hours * 60) / step_minutes).max(2) as usize;

    let timestamps: Vec<Timestamp> = (0..n)
        .map(|i| end - Duration::minutes(step_minutes * (n - 1 - i) as i64))
        .collect();

    let mut gauss = Gaussian::new(DEMO_SEED);

    // Price: random walk with a mild upward trend
    let returns: Vec<f64> = (0..n).map(|_| gauss.sample(0.0001, 0.002)).collect();
    let mut price = Vec::with_capacity(n);
    let mut cum = 0.0;
    for (i, r) in returns.iter().enumerate() {
        cum += r;
        let trend = 0.05 * i as f64 / (n - 1) as f64;
        price.push(BASE_PRICE * (cum + trend).exp());
    }

    // Normalized absolute one-step moves drive the flow series
    let mut volatility = vec![0.0; n];
    for i in 1..n {
        volatility[i] = (price[i] - price[i - 1]).abs() / BASE_PRICE;
    }

    let total_borrow: Vec<f64> = (0..n)
        .map(|i| 2.5e9 * (1.0 + gauss.sample(0.0, 0.02) + volatility[i] * 10.0))
        .collect();

    // Repay reacts to volatility with a three-sample delay
    let total_repay: Vec<f64> = (0..n)
        .map(|i| {
            let lagged = volatility[(i + n - 3) % n];
            2.3e9 * (1.0 + gauss.sample(0.0, 0.02) + lagged * 8.0)
        })
        .collect();

    // RSI drifts around 50 and peeks six samples ahead of the returns
    let rsi: Vec<f64> = (0..n)
        .map(|i| {
            let lead = returns[(i + 6) % n] * 1000.0;
            (50.0 + gauss.sample(0.0, 5.0) + lead).clamp(10.0, 90.0)
        })
        .collect();

    // Funding follows one-hour price momentum
    let funding_rate: Vec<f64> = (0..n)
        .map(|i| {
            let momentum = if i >= 12 {
                (price[i] - price[i - 12]) / price[i - 12]
            } else {
                0.0
            };
            0.0001 + gauss.sample(0.0, 0.000_05) + momentum * 0.001
        })
        .collect();

    // Open interest grows over the window and dips on volatility
    let open_interest: Vec<f64> = (0..n)
        .map(|i| {
            let trend = 0.1 * i as f64 / (n - 1) as f64;
            15e9 * (1.0 + trend + gauss.sample(0.0, 0.01) - volatility[i] * 5.0)
        })
        .collect();

    Ok(RawFeeds {
        asset: asset.to_uppercase(),
        price: TimeSeries::new(timestamps.clone(), price)?,
        total_borrow: TimeSeries::new(timestamps.clone(), total_borrow)?,
        total_repay: TimeSeries::new(timestamps.clone(), total_repay)?,
        rsi: TimeSeries::new(timestamps.clone(), rsi)?,
        funding_rate: TimeSeries::new(timestamps.clone(), funding_rate)?,
        open_interest: TimeSeries::new(timestamps, open_interest)?,
    })
}

/// Seeded gaussian sampler (Marsaglia polar method).
struct Gaussian {
    rng: StdRng,
    spare: Option<f64>,
}

impl Gaussian {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            spare: None,
        }
    }

    fn sample(&mut self, mean: f64, std: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return mean + std * z;
        }
        loop {
            let u = self.rng.sample::<f64, _>(Standard) * 2.0 - 1.0;
            let v = self.rng.sample::<f64, _>(Standard) * 2.0 - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * factor);
                return mean + std * u * factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn end() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_demo_feeds_shape() {
        let feeds = demo_feeds("btc", 24, 5, end()).unwrap();
        let n = 24 * 60 / 5;

        assert_eq!(feeds.asset, "BTC");
        assert_eq!(feeds.price.len(), n);
        assert_eq!(feeds.total_borrow.len(), n);
        assert_eq!(feeds.total_repay.len(), n);
        assert_eq!(feeds.rsi.len(), n);
        assert_eq!(feeds.funding_rate.len(), n);
        assert_eq!(feeds.open_interest.len(), n);

        assert_eq!(*feeds.price.timestamps().last().unwrap(), end());
        let spacing = feeds.price.timestamps()[1] - feeds.price.timestamps()[0];
        assert_eq!(spacing, Duration::minutes(5));
    }

    #[test]
    fn test_demo_feeds_reproducible() {
        let first = demo_feeds("BTC", 12, 5, end()).unwrap();
        let second = demo_feeds("BTC", 12, 5, end()).unwrap();
        assert_eq!(first.price, second.price);
        assert_eq!(first.funding_rate, second.funding_rate);
    }

    #[test]
    fn test_demo_value_domains() {
        let feeds = demo_feeds("BTC", 24, 5, end()).unwrap();

        assert!(feeds.price.values().iter().all(|v| *v > 0.0));
        assert!(
            feeds
                .rsi
                .values()
                .iter()
                .all(|v| (10.0..=90.0).contains(v))
        );
        assert!(feeds.open_interest.values().iter().all(|v| *v > 0.0));
        assert_eq!(feeds.price.missing_count(), 0);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut gauss = Gaussian::new(7);
        let samples: Vec<f64> = (0..20_000).map(|_| gauss.sample(0.0, 1.0)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (samples.len() - 1) as f64;

        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }
}
