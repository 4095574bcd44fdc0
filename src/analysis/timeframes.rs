use crate::models::TokenSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The fixed analysis windows. Weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    H1,
    H4,
    H12,
    H24,
    D3,
}

impl Timeframe {
    pub const ALL: [Timeframe; 5] = [
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::H12,
        Timeframe::H24,
        Timeframe::D3,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::H12 => "12h",
            Timeframe::H24 => "24h",
            Timeframe::D3 => "3d",
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Timeframe::H1 => 0.15,
            Timeframe::H4 => 0.25,
            Timeframe::H12 => 0.25,
            Timeframe::H24 => 0.20,
            Timeframe::D3 => 0.15,
        }
    }

    /// Series length used when synthesizing history for this window.
    fn synthetic_points(&self) -> usize {
        match self {
            Timeframe::H1 | Timeframe::H4 | Timeframe::H12 => 12,
            Timeframe::H24 => 24,
            Timeframe::D3 => 36,
        }
    }
}

/// Per-timeframe momentum, coarser than the scorer's 24h labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Momentum {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl Momentum {
    pub fn from_price_change(change: f64) -> Self {
        if change > 50.0 {
            Momentum::StrongBullish
        } else if change > 20.0 {
            Momentum::Bullish
        } else if change > -10.0 {
            Momentum::Neutral
        } else if change > -30.0 {
            Momentum::Bearish
        } else {
            Momentum::StrongBearish
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Momentum::StrongBullish => 2.0,
            Momentum::Bullish => 1.0,
            Momentum::Neutral => 0.0,
            Momentum::Bearish => -1.0,
            Momentum::StrongBearish => -2.0,
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Momentum::Bullish | Momentum::StrongBullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Momentum::Bearish | Momentum::StrongBearish)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Momentum::StrongBullish => "strong bullish",
            Momentum::Bullish => "bullish",
            Momentum::Neutral => "neutral",
            Momentum::Bearish => "bearish",
            Momentum::StrongBearish => "strong bearish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTiming {
    Immediate,
    WaitDip,
    WaitBreakout,
    Avoid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeMetrics {
    pub price_change: f64,
    pub average_volume: f64,
    pub volume_trend: VolumeTrend,
    pub momentum: Momentum,
    pub support: f64,
    pub resistance: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiTimeframeAnalysis {
    pub token: TokenSnapshot,
    pub timeframes: BTreeMap<Timeframe, TimeframeMetrics>,
    pub overall_trend: Momentum,
    pub overall_score: f64,
    pub entry_timing: EntryTiming,
    pub risk_reward_ratio: f64,
    pub confidence_level: f64,
    pub analyzed_at: DateTime<Utc>,
}

impl MultiTimeframeAnalysis {
    pub fn average_volatility(&self) -> f64 {
        mean(
            &self
                .timeframes
                .values()
                .map(|tf| tf.volatility)
                .collect::<Vec<_>>(),
        )
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Population standard deviation of step-wise returns, in percent.
fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let avg = mean(&returns);
    let variance = returns.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * 100.0
}

/// Multi-timeframe technical analysis over price/volume series. When no
/// history is supplied a deterministic synthetic series stands in, anchored
/// so its last point equals the snapshot price; production callers feed real
/// series from the price tracker.
#[derive(Debug, Default, Clone)]
pub struct TimeframeAnalyzer;

impl TimeframeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(
        &self,
        token: &TokenSnapshot,
        price_history: Option<&HashMap<Timeframe, Vec<f64>>>,
        volume_history: Option<&HashMap<Timeframe, Vec<f64>>>,
    ) -> MultiTimeframeAnalysis {
        let synthetic_prices;
        let prices = match price_history {
            Some(history) => history,
            None => {
                synthetic_prices = self.synthesize_price_history(token);
                &synthetic_prices
            }
        };
        let synthetic_volumes;
        let volumes = match volume_history {
            Some(history) => history,
            None => {
                synthetic_volumes = self.synthesize_volume_history(token);
                &synthetic_volumes
            }
        };

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            let metrics = self.analyze_timeframe(
                token,
                prices.get(&tf).map(Vec::as_slice).unwrap_or(&[]),
                volumes.get(&tf).map(Vec::as_slice).unwrap_or(&[]),
            );
            timeframes.insert(tf, metrics);
        }

        let overall_trend = self.overall_trend(&timeframes);
        let entry_timing = self.entry_timing(token, &timeframes, overall_trend);
        let risk_reward_ratio = self.risk_reward(token, &timeframes);
        let confidence_level = self.confidence(&timeframes, risk_reward_ratio);
        let overall_score = self.overall_score(
            token,
            overall_trend,
            risk_reward_ratio,
            confidence_level,
        );

        MultiTimeframeAnalysis {
            token: token.clone(),
            timeframes,
            overall_trend,
            overall_score,
            entry_timing,
            risk_reward_ratio,
            confidence_level,
            analyzed_at: Utc::now(),
        }
    }

    fn analyze_timeframe(
        &self,
        token: &TokenSnapshot,
        prices: &[f64],
        volumes: &[f64],
    ) -> TimeframeMetrics {
        let price_change = match (prices.first(), prices.last()) {
            (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first * 100.0,
            _ => token.price_change_24h,
        };

        let average_volume = if volumes.is_empty() {
            token.volume_24h
        } else {
            mean(volumes)
        };

        TimeframeMetrics {
            price_change,
            average_volume,
            volume_trend: self.volume_trend(volumes),
            momentum: Momentum::from_price_change(price_change),
            support: percentile(prices, 20.0),
            resistance: percentile(prices, 80.0),
            volatility: volatility(prices),
        }
    }

    /// Compare mean volume of the first and second halves of the series.
    pub fn volume_trend(&self, volumes: &[f64]) -> VolumeTrend {
        if volumes.len() < 2 {
            return VolumeTrend::Stable;
        }
        let mid = volumes.len() / 2;
        let first_half = mean(&volumes[..mid]);
        let second_half = mean(&volumes[mid..]);

        let ratio = second_half / (first_half + 1.0);
        if ratio > 1.3 {
            VolumeTrend::Increasing
        } else if ratio < 0.7 {
            VolumeTrend::Decreasing
        } else {
            VolumeTrend::Stable
        }
    }

    fn overall_trend(&self, timeframes: &BTreeMap<Timeframe, TimeframeMetrics>) -> Momentum {
        let weighted: f64 = timeframes
            .iter()
            .map(|(tf, metrics)| metrics.momentum.score() * tf.weight())
            .sum();

        if weighted > 1.5 {
            Momentum::StrongBullish
        } else if weighted > 0.5 {
            Momentum::Bullish
        } else if weighted > -0.5 {
            Momentum::Neutral
        } else if weighted > -1.5 {
            Momentum::Bearish
        } else {
            Momentum::StrongBearish
        }
    }

    fn entry_timing(
        &self,
        token: &TokenSnapshot,
        timeframes: &BTreeMap<Timeframe, TimeframeMetrics>,
        overall_trend: Momentum,
    ) -> EntryTiming {
        let short_term = timeframes.get(&Timeframe::H1);
        let medium_term = timeframes.get(&Timeframe::H4);

        // Without short-term context, waiting for a dip is the conservative
        // default.
        let (short_term, _medium_term) = match (short_term, medium_term) {
            (Some(s), Some(m)) => (s, m),
            _ => return EntryTiming::WaitDip,
        };

        if !overall_trend.is_bullish() {
            return EntryTiming::Avoid;
        }

        if short_term.price_change > 30.0 && short_term.volatility > 10.0 {
            EntryTiming::WaitDip
        } else if token.price < short_term.support * 1.1 {
            EntryTiming::Immediate
        } else if token.price > short_term.resistance * 0.95 {
            EntryTiming::WaitBreakout
        } else {
            EntryTiming::Immediate
        }
    }

    fn risk_reward(
        &self,
        token: &TokenSnapshot,
        timeframes: &BTreeMap<Timeframe, TimeframeMetrics>,
    ) -> f64 {
        let supports: Vec<f64> = timeframes
            .values()
            .map(|tf| tf.support)
            .filter(|&s| s > 0.0)
            .collect();
        let resistances: Vec<f64> = timeframes
            .values()
            .map(|tf| tf.resistance)
            .filter(|&r| r > 0.0)
            .collect();

        if supports.is_empty() || resistances.is_empty() {
            return 1.0;
        }

        let potential_loss = (token.price - mean(&supports)).abs();
        let potential_gain = (mean(&resistances) - token.price).abs();

        if potential_loss == 0.0 {
            return 3.0;
        }
        (potential_gain / potential_loss).clamp(0.0, 3.0)
    }

    fn confidence(
        &self,
        timeframes: &BTreeMap<Timeframe, TimeframeMetrics>,
        risk_reward: f64,
    ) -> f64 {
        let mut confidence = 50.0;

        let bullish_frames = timeframes
            .values()
            .filter(|tf| tf.momentum.is_bullish())
            .count();
        confidence += bullish_frames as f64 * 5.0;

        let rising_volume_frames = timeframes
            .values()
            .filter(|tf| tf.volume_trend == VolumeTrend::Increasing)
            .count();
        confidence += rising_volume_frames as f64 * 5.0;

        if risk_reward > 2.0 {
            confidence += 15.0;
        } else if risk_reward > 1.5 {
            confidence += 10.0;
        } else if risk_reward > 1.0 {
            confidence += 5.0;
        }

        let avg_volatility = mean(
            &timeframes
                .values()
                .map(|tf| tf.volatility)
                .collect::<Vec<_>>(),
        );
        if avg_volatility > 20.0 {
            confidence -= 10.0;
        } else if avg_volatility > 15.0 {
            confidence -= 5.0;
        }

        confidence.clamp(0.0, 100.0)
    }

    fn overall_score(
        &self,
        token: &TokenSnapshot,
        overall_trend: Momentum,
        risk_reward: f64,
        confidence: f64,
    ) -> f64 {
        let mut score = 0.0;

        score += match overall_trend {
            Momentum::StrongBullish => 30.0,
            Momentum::Bullish => 20.0,
            Momentum::Neutral => 10.0,
            _ => 0.0,
        };

        let volume_ratio = token.volume_to_mcap_ratio();
        if volume_ratio > 2.0 {
            score += 20.0;
        } else if volume_ratio > 1.0 {
            score += 15.0;
        } else if volume_ratio > 0.5 {
            score += 10.0;
        } else if volume_ratio > 0.2 {
            score += 5.0;
        }

        let mcap = token.market_cap;
        if (1_000_000.0..=10_000_000.0).contains(&mcap) {
            score += 20.0;
        } else if (500_000.0..=20_000_000.0).contains(&mcap) {
            score += 15.0;
        } else if (100_000.0..=50_000_000.0).contains(&mcap) {
            score += 10.0;
        }

        score += (risk_reward * 5.0).min(15.0);
        score += confidence * 0.15;

        score.min(100.0)
    }

    /// Deterministic stand-in series: a geometric ramp from the implied
    /// 24h-ago price to the current one, so the last point always equals the
    /// snapshot price.
    fn synthesize_price_history(&self, token: &TokenSnapshot) -> HashMap<Timeframe, Vec<f64>> {
        let change = token.price_change_24h / 100.0;
        let start = if change > -1.0 {
            token.price / (1.0 + change)
        } else {
            token.price
        };

        let mut history = HashMap::new();
        for tf in Timeframe::ALL {
            let points = tf.synthetic_points();
            let mut prices = Vec::with_capacity(points);
            for i in 0..points {
                let progress = i as f64 / (points - 1) as f64;
                prices.push(start * (token.price / start).powf(progress));
            }
            // Anchor exactly, independent of float error in the ramp.
            prices[points - 1] = token.price;
            history.insert(tf, prices);
        }
        history
    }

    fn synthesize_volume_history(&self, token: &TokenSnapshot) -> HashMap<Timeframe, Vec<f64>> {
        let hourly = token.volume_24h / 24.0;
        Timeframe::ALL
            .iter()
            .map(|&tf| (tf, vec![hourly; tf.synthetic_points()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(price: f64, change_24h: f64) -> TokenSnapshot {
        TokenSnapshot {
            address: "0xtoken".to_string(),
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            price,
            price_change_24h: change_24h,
            volume_24h: 6_000_000.0,
            liquidity: 300_000.0,
            market_cap: 5_000_000.0,
            fdv: 5_000_000.0,
            chain: "ethereum".to_string(),
            pair_address: "0xpair".to_string(),
            created_at: Some(Utc::now() - Duration::hours(120)),
        }
    }

    fn metrics(momentum: Momentum, support: f64, resistance: f64) -> TimeframeMetrics {
        TimeframeMetrics {
            price_change: 0.0,
            average_volume: 1000.0,
            volume_trend: VolumeTrend::Stable,
            momentum,
            support,
            resistance,
            volatility: 5.0,
        }
    }

    #[test]
    fn volume_trend_classification() {
        let analyzer = TimeframeAnalyzer::new();

        // Second-half mean double the first half.
        let doubling = vec![1000.0, 1000.0, 2000.0, 2000.0];
        assert_eq!(analyzer.volume_trend(&doubling), VolumeTrend::Increasing);

        // Second-half mean half the first half.
        let halving = vec![2000.0, 2000.0, 1000.0, 1000.0];
        assert_eq!(analyzer.volume_trend(&halving), VolumeTrend::Decreasing);

        let flat = vec![1500.0, 1500.0, 1500.0, 1500.0];
        assert_eq!(analyzer.volume_trend(&flat), VolumeTrend::Stable);

        assert_eq!(analyzer.volume_trend(&[]), VolumeTrend::Stable);
        assert_eq!(analyzer.volume_trend(&[100.0]), VolumeTrend::Stable);
    }

    #[test]
    fn momentum_breakpoints() {
        assert_eq!(Momentum::from_price_change(60.0), Momentum::StrongBullish);
        assert_eq!(Momentum::from_price_change(30.0), Momentum::Bullish);
        assert_eq!(Momentum::from_price_change(0.0), Momentum::Neutral);
        assert_eq!(Momentum::from_price_change(-20.0), Momentum::Bearish);
        assert_eq!(Momentum::from_price_change(-40.0), Momentum::StrongBearish);
    }

    #[test]
    fn percentile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&values, 20.0) - 1.8).abs() < 1e-9);
        assert!((percentile(&values, 80.0) - 4.2).abs() < 1e-9);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[7.0], 80.0), 7.0);
    }

    #[test]
    fn volatility_of_short_series_is_zero() {
        assert_eq!(volatility(&[]), 0.0);
        assert_eq!(volatility(&[1.0]), 0.0);
        // Constant series has zero-variance returns.
        assert_eq!(volatility(&[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn volatility_measures_return_spread() {
        // Returns alternate +10% / -10%: non-zero spread.
        let prices = vec![1.0, 1.1, 0.99, 1.089];
        assert!(volatility(&prices) > 0.0);
    }

    #[test]
    fn synthetic_series_anchors_on_snapshot_price() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(0.005, 40.0);
        let history = analyzer.synthesize_price_history(&token);

        for tf in Timeframe::ALL {
            let series = &history[&tf];
            assert_eq!(series.len(), tf.synthetic_points());
            assert_eq!(*series.last().unwrap(), token.price);
            assert!(series.iter().all(|p| *p > 0.0));
        }
        assert_eq!(history[&Timeframe::H24].len(), 24);
        assert_eq!(history[&Timeframe::D3].len(), 36);
    }

    #[test]
    fn synthetic_series_survives_total_crash() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(0.001, -100.0);
        let history = analyzer.synthesize_price_history(&token);
        assert!(history[&Timeframe::H1].iter().all(|p| p.is_finite()));
    }

    #[test]
    fn analysis_respects_clamps() {
        let analyzer = TimeframeAnalyzer::new();
        for change in [-95.0, -40.0, 0.0, 35.0, 180.0] {
            let analysis = analyzer.analyze(&token(0.002, change), None, None);
            assert!((0.0..=3.0).contains(&analysis.risk_reward_ratio));
            assert!((0.0..=100.0).contains(&analysis.confidence_level));
            assert!((0.0..=100.0).contains(&analysis.overall_score));
        }
    }

    #[test]
    fn missing_short_timeframes_default_to_wait_dip() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(1.0, 30.0);

        let mut timeframes = BTreeMap::new();
        timeframes.insert(Timeframe::H12, metrics(Momentum::StrongBullish, 0.8, 1.2));
        timeframes.insert(Timeframe::H24, metrics(Momentum::StrongBullish, 0.8, 1.2));

        let timing = analyzer.entry_timing(&token, &timeframes, Momentum::StrongBullish);
        assert_eq!(timing, EntryTiming::WaitDip);
    }

    #[test]
    fn bearish_trend_means_avoid() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(1.0, -40.0);

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            timeframes.insert(tf, metrics(Momentum::Bearish, 0.8, 1.2));
        }
        let timing = analyzer.entry_timing(&token, &timeframes, Momentum::Bearish);
        assert_eq!(timing, EntryTiming::Avoid);
    }

    #[test]
    fn price_near_support_enters_immediately() {
        let analyzer = TimeframeAnalyzer::new();
        // Price within 10% above the 1h support.
        let token = token(0.85, 25.0);

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            timeframes.insert(tf, metrics(Momentum::Bullish, 0.8, 1.2));
        }
        let timing = analyzer.entry_timing(&token, &timeframes, Momentum::Bullish);
        assert_eq!(timing, EntryTiming::Immediate);
    }

    #[test]
    fn price_near_resistance_waits_for_breakout() {
        let analyzer = TimeframeAnalyzer::new();
        // Price within 5% below the 1h resistance, well above support * 1.1.
        let token = token(1.18, 25.0);

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            timeframes.insert(tf, metrics(Momentum::Bullish, 0.8, 1.2));
        }
        let timing = analyzer.entry_timing(&token, &timeframes, Momentum::Bullish);
        assert_eq!(timing, EntryTiming::WaitBreakout);
    }

    #[test]
    fn overheated_short_term_waits_for_dip() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(1.0, 60.0);

        let mut hot = metrics(Momentum::StrongBullish, 0.8, 1.2);
        hot.price_change = 45.0;
        hot.volatility = 18.0;

        let mut timeframes = BTreeMap::new();
        timeframes.insert(Timeframe::H1, hot);
        for tf in [Timeframe::H4, Timeframe::H12, Timeframe::H24, Timeframe::D3] {
            timeframes.insert(tf, metrics(Momentum::StrongBullish, 0.8, 1.2));
        }
        let timing = analyzer.entry_timing(&token, &timeframes, Momentum::StrongBullish);
        assert_eq!(timing, EntryTiming::WaitDip);
    }

    #[test]
    fn risk_reward_defaults_without_levels() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(1.0, 10.0);

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            timeframes.insert(tf, metrics(Momentum::Neutral, 0.0, 0.0));
        }
        assert_eq!(analyzer.risk_reward(&token, &timeframes), 1.0);
    }

    #[test]
    fn risk_reward_maxes_when_price_sits_on_support() {
        let analyzer = TimeframeAnalyzer::new();
        let token = token(0.8, 10.0);

        let mut timeframes = BTreeMap::new();
        for tf in Timeframe::ALL {
            timeframes.insert(tf, metrics(Momentum::Neutral, 0.8, 1.2));
        }
        assert_eq!(analyzer.risk_reward(&token, &timeframes), 3.0);
    }

    #[test]
    fn overall_trend_follows_weighted_momentum() {
        let analyzer = TimeframeAnalyzer::new();

        let mut all_strong = BTreeMap::new();
        for tf in Timeframe::ALL {
            all_strong.insert(tf, metrics(Momentum::StrongBullish, 0.8, 1.2));
        }
        assert_eq!(analyzer.overall_trend(&all_strong), Momentum::StrongBullish);

        let mut mixed = BTreeMap::new();
        for tf in Timeframe::ALL {
            mixed.insert(tf, metrics(Momentum::Neutral, 0.8, 1.2));
        }
        assert_eq!(analyzer.overall_trend(&mixed), Momentum::Neutral);

        let mut all_bearish = BTreeMap::new();
        for tf in Timeframe::ALL {
            all_bearish.insert(tf, metrics(Momentum::StrongBearish, 0.8, 1.2));
        }
        assert_eq!(analyzer.overall_trend(&all_bearish), Momentum::StrongBearish);
    }

    #[test]
    fn confidence_rewards_alignment_and_penalizes_volatility() {
        let analyzer = TimeframeAnalyzer::new();

        let mut aligned = BTreeMap::new();
        for tf in Timeframe::ALL {
            let mut m = metrics(Momentum::StrongBullish, 0.8, 1.2);
            m.volume_trend = VolumeTrend::Increasing;
            aligned.insert(tf, m);
        }
        // 50 base + 25 trend + 25 volume + 15 rr.
        assert_eq!(analyzer.confidence(&aligned, 2.5), 100.0);

        let mut choppy = BTreeMap::new();
        for tf in Timeframe::ALL {
            let mut m = metrics(Momentum::Neutral, 0.8, 1.2);
            m.volatility = 25.0;
            choppy.insert(tf, m);
        }
        // 50 base - 10 volatility.
        assert_eq!(analyzer.confidence(&choppy, 0.5), 40.0);
    }
}
