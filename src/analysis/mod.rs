pub mod scoring;
pub mod timeframes;

pub use scoring::{OpportunityScorer, ProfileMatch, ReferenceProfile, TokenClassification};
pub use timeframes::{
    EntryTiming, Momentum, MultiTimeframeAnalysis, Timeframe, TimeframeAnalyzer, TimeframeMetrics,
    VolumeTrend,
};
