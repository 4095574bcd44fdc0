use crate::models::TokenSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCapTier {
    Nano,
    Micro,
    Small,
    Mid,
    Large,
}

impl MarketCapTier {
    pub fn from_market_cap(market_cap: f64) -> Self {
        if market_cap < 100_000.0 {
            MarketCapTier::Nano
        } else if market_cap < 1_000_000.0 {
            MarketCapTier::Micro
        } else if market_cap < 10_000_000.0 {
            MarketCapTier::Small
        } else if market_cap < 100_000_000.0 {
            MarketCapTier::Mid
        } else {
            MarketCapTier::Large
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeRating {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl VolumeRating {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 2.0 {
            VolumeRating::VeryHigh
        } else if ratio > 1.0 {
            VolumeRating::High
        } else if ratio > 0.5 {
            VolumeRating::Moderate
        } else if ratio > 0.1 {
            VolumeRating::Low
        } else {
            VolumeRating::VeryLow
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityHealth {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl LiquidityHealth {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.5 {
            LiquidityHealth::Excellent
        } else if ratio > 0.2 {
            LiquidityHealth::Good
        } else if ratio > 0.1 {
            LiquidityHealth::Fair
        } else if ratio > 0.05 {
            LiquidityHealth::Poor
        } else {
            LiquidityHealth::Critical
        }
    }
}

/// 24h price-action label, finest-grained classification in the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMomentum {
    StrongBearish,
    Bearish,
    MildBearish,
    Neutral,
    MildBullish,
    Bullish,
    StrongBullish,
    Explosive,
}

impl PriceMomentum {
    pub fn from_change_24h(change: f64) -> Self {
        if change > 100.0 {
            PriceMomentum::Explosive
        } else if change > 50.0 {
            PriceMomentum::StrongBullish
        } else if change > 20.0 {
            PriceMomentum::Bullish
        } else if change > 5.0 {
            PriceMomentum::MildBullish
        } else if change.abs() <= 5.0 {
            PriceMomentum::Neutral
        } else if change > -20.0 {
            PriceMomentum::MildBearish
        } else if change > -50.0 {
            PriceMomentum::Bearish
        } else {
            PriceMomentum::StrongBearish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Extreme => "extreme",
        };
        write!(f, "{}", label)
    }
}

/// Full rule-based classification of one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClassification {
    pub market_cap_tier: MarketCapTier,
    pub volume_rating: VolumeRating,
    pub volume_ratio: f64,
    pub liquidity_health: LiquidityHealth,
    pub momentum: PriceMomentum,
    pub risk_level: RiskLevel,
    pub opportunity_score: f64,
}

/// Gating ranges for matching candidates against a named archetype. Gates
/// are exclusionary pre-filters: a token failing any of them is dropped
/// regardless of its score.
#[derive(Debug, Clone)]
pub struct ReferenceProfile {
    pub name: &'static str,
    pub market_cap_range: (f64, f64),
    pub volume_ratio_range: (f64, f64),
    pub liquidity_floor: f64,
}

pub const DUST_PROFILE: ReferenceProfile = ReferenceProfile {
    name: "DUST",
    market_cap_range: (1_000_000.0, 50_000_000.0),
    volume_ratio_range: (0.5, 3.0),
    liquidity_floor: 100_000.0,
};

pub const PRICELESS_PROFILE: ReferenceProfile = ReferenceProfile {
    name: "PRICELESS",
    market_cap_range: (500_000.0, 20_000_000.0),
    volume_ratio_range: (1.0, 5.0),
    liquidity_floor: 50_000.0,
};

impl ReferenceProfile {
    pub fn matches(&self, token: &TokenSnapshot) -> bool {
        let (mcap_lo, mcap_hi) = self.market_cap_range;
        if token.market_cap < mcap_lo || token.market_cap > mcap_hi {
            return false;
        }
        let ratio = token.volume_to_mcap_ratio();
        let (ratio_lo, ratio_hi) = self.volume_ratio_range;
        if ratio < ratio_lo || ratio > ratio_hi {
            return false;
        }
        token.liquidity >= self.liquidity_floor
    }
}

/// A profile-gated candidate, ranked by opportunity score.
#[derive(Debug, Clone)]
pub struct ProfileMatch {
    pub token: TokenSnapshot,
    pub classification: TokenClassification,
}

/// Deterministic rule-based token scorer. Inputs are trusted as supplied;
/// degenerate values (negative market cap and the like) simply land in the
/// lowest tiers.
#[derive(Debug, Default, Clone)]
pub struct OpportunityScorer;

impl OpportunityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, token: &TokenSnapshot, now: DateTime<Utc>) -> TokenClassification {
        let volume_ratio = token.volume_to_mcap_ratio();
        TokenClassification {
            market_cap_tier: MarketCapTier::from_market_cap(token.market_cap),
            volume_rating: VolumeRating::from_ratio(volume_ratio),
            volume_ratio,
            liquidity_health: LiquidityHealth::from_ratio(token.liquidity_to_mcap_ratio()),
            momentum: PriceMomentum::from_change_24h(token.price_change_24h),
            risk_level: self.risk_level(token, now),
            opportunity_score: self.opportunity_score(token),
        }
    }

    pub fn risk_level(&self, token: &TokenSnapshot, now: DateTime<Utc>) -> RiskLevel {
        let mut risk_factors = 0u32;

        if token.liquidity < 50_000.0 {
            risk_factors += 2;
        } else if token.liquidity < 100_000.0 {
            risk_factors += 1;
        }

        if token.price_change_24h.abs() > 50.0 {
            risk_factors += 1;
        }

        match token.age_hours(now) {
            Some(age) if age < 24.0 => risk_factors += 2,
            Some(age) if age < 72.0 => risk_factors += 1,
            Some(_) => {}
            // Unknown age is itself a risk signal.
            None => risk_factors += 1,
        }

        if token.market_cap < 1_000_000.0 {
            risk_factors += 1;
        }

        if risk_factors >= 4 {
            RiskLevel::Extreme
        } else if risk_factors >= 3 {
            RiskLevel::High
        } else if risk_factors >= 2 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// 0-100 composite of four independently capped sub-scores.
    pub fn opportunity_score(&self, token: &TokenSnapshot) -> f64 {
        let mut score: f64 = 0.0;

        // Volume activity, up to 30.
        let volume_ratio = token.volume_to_mcap_ratio();
        if volume_ratio > 2.0 {
            score += 30.0;
        } else if volume_ratio > 1.0 {
            score += 20.0;
        } else if volume_ratio > 0.5 {
            score += 10.0;
        }

        // Price momentum, up to 20.
        let change = token.price_change_24h;
        if (20.0..=100.0).contains(&change) {
            score += 20.0;
        } else if (10.0..20.0).contains(&change) {
            score += 15.0;
        } else if (5.0..10.0).contains(&change) {
            score += 10.0;
        }

        // Liquidity health, up to 20.
        if token.liquidity > 200_000.0 {
            score += 20.0;
        } else if token.liquidity > 100_000.0 {
            score += 15.0;
        } else if token.liquidity > 50_000.0 {
            score += 10.0;
        }

        // Market-cap sweet spot, up to 30.
        let mcap = token.market_cap;
        if (1_000_000.0..=10_000_000.0).contains(&mcap) {
            score += 30.0;
        } else if (500_000.0..1_000_000.0).contains(&mcap) {
            score += 20.0;
        } else if mcap > 10_000_000.0 && mcap <= 50_000_000.0 {
            score += 15.0;
        }

        score.min(100.0)
    }

    /// Filter candidates through a profile's hard gates, then rank survivors
    /// by opportunity score descending.
    pub fn find_profile_matches(
        &self,
        profile: &ReferenceProfile,
        candidates: &[TokenSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<ProfileMatch> {
        let mut matches: Vec<ProfileMatch> = candidates
            .iter()
            .filter(|token| profile.matches(token))
            .map(|token| ProfileMatch {
                token: token.clone(),
                classification: self.classify(token, now),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.classification
                .opportunity_score
                .total_cmp(&a.classification.opportunity_score)
        });
        matches
    }

    pub fn find_dust_like(
        &self,
        candidates: &[TokenSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<ProfileMatch> {
        self.find_profile_matches(&DUST_PROFILE, candidates, now)
    }

    pub fn find_priceless_like(
        &self,
        candidates: &[TokenSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<ProfileMatch> {
        self.find_profile_matches(&PRICELESS_PROFILE, candidates, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(market_cap: f64, volume_24h: f64, liquidity: f64, change: f64) -> TokenSnapshot {
        TokenSnapshot {
            address: format!("0x{:x}", (market_cap as u64) ^ (volume_24h as u64)),
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            price: 0.001,
            price_change_24h: change,
            volume_24h,
            liquidity,
            market_cap,
            fdv: market_cap,
            chain: "ethereum".to_string(),
            pair_address: "0xpair".to_string(),
            created_at: Some(Utc::now() - Duration::hours(100)),
        }
    }

    #[test]
    fn market_cap_tier_boundaries() {
        assert_eq!(MarketCapTier::from_market_cap(99_999.0), MarketCapTier::Nano);
        assert_eq!(MarketCapTier::from_market_cap(100_000.0), MarketCapTier::Micro);
        assert_eq!(MarketCapTier::from_market_cap(999_999.0), MarketCapTier::Micro);
        assert_eq!(MarketCapTier::from_market_cap(1_000_000.0), MarketCapTier::Small);
        assert_eq!(MarketCapTier::from_market_cap(10_000_000.0), MarketCapTier::Mid);
        assert_eq!(MarketCapTier::from_market_cap(100_000_000.0), MarketCapTier::Large);
    }

    #[test]
    fn momentum_labels_cover_the_range() {
        assert_eq!(PriceMomentum::from_change_24h(150.0), PriceMomentum::Explosive);
        assert_eq!(PriceMomentum::from_change_24h(60.0), PriceMomentum::StrongBullish);
        assert_eq!(PriceMomentum::from_change_24h(30.0), PriceMomentum::Bullish);
        assert_eq!(PriceMomentum::from_change_24h(10.0), PriceMomentum::MildBullish);
        assert_eq!(PriceMomentum::from_change_24h(0.0), PriceMomentum::Neutral);
        assert_eq!(PriceMomentum::from_change_24h(-10.0), PriceMomentum::MildBearish);
        assert_eq!(PriceMomentum::from_change_24h(-30.0), PriceMomentum::Bearish);
        assert_eq!(PriceMomentum::from_change_24h(-60.0), PriceMomentum::StrongBearish);
    }

    #[test]
    fn opportunity_score_stays_within_bounds() {
        let scorer = OpportunityScorer::new();
        let extremes = [
            token(0.0, 0.0, 0.0, 0.0),
            token(5_000_000.0, 20_000_000.0, 500_000.0, 50.0),
            token(-1_000.0, 1e12, 1e9, 1e6),
            token(1e12, 0.0, 0.0, -99.0),
        ];
        for t in &extremes {
            let score = scorer.opportunity_score(t);
            assert!((0.0..=100.0).contains(&score), "score {} out of bounds", score);
        }
    }

    #[test]
    fn best_case_token_hits_the_cap() {
        let scorer = OpportunityScorer::new();
        // All four sub-scores maxed: 30 + 20 + 20 + 30, clamped to 100.
        let t = token(5_000_000.0, 15_000_000.0, 300_000.0, 50.0);
        assert_eq!(scorer.opportunity_score(&t), 100.0);
    }

    #[test]
    fn risk_level_accumulates_factors() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();

        // Thin liquidity (+2), brand new (+2), tiny cap (+1): extreme.
        let mut risky = token(200_000.0, 100_000.0, 10_000.0, 10.0);
        risky.created_at = Some(now - Duration::hours(2));
        assert_eq!(scorer.risk_level(&risky, now), RiskLevel::Extreme);

        // Old, liquid, mid-cap, quiet: low.
        let mut calm = token(20_000_000.0, 5_000_000.0, 500_000.0, 3.0);
        calm.created_at = Some(now - Duration::hours(500));
        assert_eq!(scorer.risk_level(&calm, now), RiskLevel::Low);
    }

    #[test]
    fn unknown_age_adds_one_risk_factor() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();

        let mut t = token(20_000_000.0, 5_000_000.0, 80_000.0, 3.0);
        t.created_at = Some(now - Duration::hours(500));
        assert_eq!(scorer.risk_level(&t, now), RiskLevel::Low);

        t.created_at = None;
        assert_eq!(scorer.risk_level(&t, now), RiskLevel::Moderate);
    }

    #[test]
    fn dust_gate_rejects_oversized_market_cap() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();

        // Perfect score ingredients but 60M market cap, above DUST's 50M cap.
        let oversized = token(60_000_000.0, 90_000_000.0, 500_000.0, 40.0);
        let inside = token(15_000_000.0, 20_000_000.0, 300_000.0, 40.0);

        let matches = scorer.find_dust_like(&[oversized.clone(), inside.clone()], now);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].token.address, inside.address);
        assert!(matches.iter().all(|m| m.token.address != oversized.address));
    }

    #[test]
    fn dust_gate_enforces_volume_ratio_and_liquidity() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();

        // Ratio 0.1, below DUST's 0.5 floor.
        let sleepy = token(10_000_000.0, 1_000_000.0, 300_000.0, 40.0);
        // Liquidity below DUST's 100K floor.
        let illiquid = token(10_000_000.0, 10_000_000.0, 50_000.0, 40.0);
        assert!(scorer.find_dust_like(&[sleepy, illiquid], now).is_empty());
    }

    #[test]
    fn priceless_matches_rank_by_score_descending() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();

        // Both pass PRICELESS gates (500K-20M cap, ratio 1-5, liq >= 50K);
        // the second scores higher on momentum and liquidity.
        let weaker = token(15_000_000.0, 20_000_000.0, 60_000.0, -10.0);
        let stronger = token(5_000_000.0, 10_000_000.0, 300_000.0, 40.0);

        let matches = scorer.find_priceless_like(&[weaker.clone(), stronger.clone()], now);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].token.address, stronger.address);
        assert!(
            matches[0].classification.opportunity_score
                >= matches[1].classification.opportunity_score
        );
    }

    #[test]
    fn classify_is_deterministic() {
        let scorer = OpportunityScorer::new();
        let now = Utc::now();
        let t = token(3_000_000.0, 4_000_000.0, 150_000.0, 25.0);
        let a = scorer.classify(&t, now);
        let b = scorer.classify(&t, now);
        assert_eq!(a.opportunity_score, b.opportunity_score);
        assert_eq!(a.momentum, b.momentum);
        assert_eq!(a.risk_level, b.risk_level);
    }
}
