use crate::analysis::VolumeTrend;
use crate::models::TokenSnapshot;
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Retention window for per-token history.
const RETENTION_HOURS: i64 = 24;
/// Absolute 1h move (percent) that raises a pump/dump alert.
const MOVE_ALERT_THRESHOLD: f64 = 20.0;
/// Absolute 1h move (percent) that escalates an alert to high severity.
const MOVE_ALERT_HIGH_SEVERITY: f64 = 50.0;
/// Minimum 1h gain (percent) for a volume-spike alert.
const VOLUME_SPIKE_MIN_CHANGE: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub liquidity: f64,
    pub market_cap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Pump,
    Dump,
    VolumeSpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub token: TokenSnapshot,
    pub change_1h: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackedSummary {
    pub token: TokenSnapshot,
    pub current_price: f64,
    pub change_1h: Option<f64>,
    pub change_4h: Option<f64>,
    pub change_24h: Option<f64>,
    pub last_update: DateTime<Utc>,
}

/// Bounded history for one token: points older than the retention window are
/// pruned on every insert, so the store never grows past 24h of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHistory {
    pub token: TokenSnapshot,
    points: VecDeque<PricePoint>,
}

impl TokenHistory {
    fn new(token: TokenSnapshot) -> Self {
        Self {
            token,
            points: VecDeque::new(),
        }
    }

    fn push(&mut self, point: PricePoint) {
        let cutoff = point.timestamp - Duration::hours(RETENTION_HOURS);
        while self
            .points
            .front()
            .map(|p| p.timestamp <= cutoff)
            .unwrap_or(false)
        {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_point(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    /// Percent price change over the trailing window, None when the window
    /// has no anchor point yet.
    pub fn change_over_window(&self, hours: i64, now: DateTime<Utc>) -> Option<f64> {
        if self.points.len() < 2 {
            return None;
        }
        let cutoff = now - Duration::hours(hours);
        let old_price = self
            .points
            .iter()
            .filter(|p| p.timestamp <= cutoff)
            .last()
            .map(|p| p.price)?;
        let current_price = self.points.back()?.price;

        if old_price == 0.0 {
            return None;
        }
        Some((current_price - old_price) / old_price * 100.0)
    }

    /// Volume trend over the trailing window, from first-half vs second-half
    /// mean volume.
    pub fn volume_trend(&self, hours: i64, now: DateTime<Utc>) -> Option<VolumeTrend> {
        let cutoff = now - Duration::hours(hours);
        let recent: Vec<&PricePoint> = self.points.iter().filter(|p| p.timestamp > cutoff).collect();
        if recent.len() < 2 {
            return None;
        }

        let mid = recent.len() / 2;
        let first_half: f64 =
            recent[..mid].iter().map(|p| p.volume).sum::<f64>() / mid as f64;
        let second_half: f64 =
            recent[mid..].iter().map(|p| p.volume).sum::<f64>() / (recent.len() - mid) as f64;

        let ratio = second_half / (first_half + 1.0);
        Some(if ratio > 1.5 {
            VolumeTrend::Increasing
        } else if ratio < 0.7 {
            VolumeTrend::Decreasing
        } else {
            VolumeTrend::Stable
        })
    }
}

/// Time-windowed price store for the tokens the agent cares about. Owns the
/// raw points; consumers go through the query methods rather than filtering
/// lists themselves.
#[derive(Debug, Default)]
pub struct PriceTracker {
    tracked: HashMap<String, TokenHistory>,
}

impl PriceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, token: &TokenSnapshot) {
        if !self.tracked.contains_key(&token.address) {
            info!("Tracking {} for price history", token.symbol);
            self.tracked
                .insert(token.address.clone(), TokenHistory::new(token.clone()));
        }
    }

    pub fn untrack(&mut self, address: &str) {
        self.tracked.remove(address);
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn history(&self, address: &str) -> Option<&TokenHistory> {
        self.tracked.get(address)
    }

    /// Record the latest snapshot for a tracked token. Untracked addresses
    /// are ignored; call `track` first.
    pub fn record(&mut self, snapshot: &TokenSnapshot, now: DateTime<Utc>) {
        if let Some(history) = self.tracked.get_mut(&snapshot.address) {
            history.push(PricePoint {
                timestamp: now,
                price: snapshot.price,
                volume: snapshot.volume_24h,
                liquidity: snapshot.liquidity,
                market_cap: snapshot.market_cap,
            });
            history.token = snapshot.clone();
        }
    }

    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<TrackedSummary> {
        self.tracked
            .values()
            .filter_map(|history| {
                let last = history.last_point()?;
                Some(TrackedSummary {
                    token: history.token.clone(),
                    current_price: last.price,
                    change_1h: history.change_over_window(1, now),
                    change_4h: history.change_over_window(4, now),
                    change_24h: history.change_over_window(24, now),
                    last_update: last.timestamp,
                })
            })
            .collect()
    }

    /// Pump/dump and volume-spike alerts over the last hour.
    pub fn alerts(&self, now: DateTime<Utc>) -> Vec<PriceAlert> {
        let mut alerts = Vec::new();

        for history in self.tracked.values() {
            let change_1h = match history.change_over_window(1, now) {
                Some(change) => change,
                None => continue,
            };

            if change_1h.abs() > MOVE_ALERT_THRESHOLD {
                alerts.push(PriceAlert {
                    kind: if change_1h > 0.0 {
                        AlertKind::Pump
                    } else {
                        AlertKind::Dump
                    },
                    severity: if change_1h.abs() > MOVE_ALERT_HIGH_SEVERITY {
                        AlertSeverity::High
                    } else {
                        AlertSeverity::Medium
                    },
                    token: history.token.clone(),
                    change_1h,
                });
            }

            if history.volume_trend(1, now) == Some(VolumeTrend::Increasing)
                && change_1h > VOLUME_SPIKE_MIN_CHANGE
            {
                alerts.push(PriceAlert {
                    kind: AlertKind::VolumeSpike,
                    severity: AlertSeverity::Medium,
                    token: history.token.clone(),
                    change_1h,
                });
            }
        }

        alerts
    }
}
