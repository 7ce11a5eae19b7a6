//! 📊 Dozen Prediction
//!
//! Scores each dozen over the most recent window of spins and picks the one
//! most "due":
//! - deficit: expected count minus observed count (dozen_weight)
//! - delay: spins since last appearance, only past 5 (delay_weight)
//! - repeat penalty: -25 if the dozen hit on the newest spin
//! - deviation: |count - expected| / expected (deviation_weight)
//!
//! `LowestCount` is a simpler alternate that only looks at raw counts over a
//! shorter window. Both produce the same `Prediction` shape.

use std::str::FromStr;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::Serialize;

use crate::config::PredictionConfig;
use crate::history::{DozenWindowStats, HistoryLog};
use crate::spin::Dozen;

/// Gap beyond which the delay term starts contributing
const DELAY_THRESHOLD: usize = 5;

/// Score penalty for a dozen that hit on the newest spin
const REPEAT_PENALTY: f64 = 25.0;

const CONFIDENCE_BASE: f64 = 40.0;
const CONFIDENCE_SLOPE: f64 = 0.55;
const CONFIDENCE_FLOOR: f64 = 20.0;
const CONFIDENCE_CEIL: f64 = 95.0;

/// Supporting numbers returned with a prediction
const MAX_SUPPORTING: usize = 6;

/// Observed distinct numbers needed before frequency ranking is used
const MIN_DISTINCT_OBSERVED: usize = 3;

/// Prediction algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStrategy {
    /// Weighted multi-factor score over the analysis window
    Weighted,
    /// Dozen with the fewest hits over a short window
    LowestCount,
}

impl PredictionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStrategy::Weighted => "weighted",
            PredictionStrategy::LowestCount => "lowest_count",
        }
    }
}

impl FromStr for PredictionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(PredictionStrategy::Weighted),
            "lowest_count" | "lowest-count" | "simple" => Ok(PredictionStrategy::LowestCount),
            other => Err(format!("unknown prediction strategy: {}", other)),
        }
    }
}

/// Per-dozen scoring breakdown kept for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DozenScore {
    pub dozen: Dozen,
    pub count: usize,
    pub gap: usize,
    pub score: f64,
}

/// Why a dozen was chosen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRationale {
    pub strategy: PredictionStrategy,
    pub window_len: usize,
    pub expected_per_dozen: f64,
    pub scores: Vec<DozenScore>,
}

/// Output of one prediction round
///
/// Created once per recorded spin and checked against the next one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// `None` when there is not enough history
    pub dozen: Option<Dozen>,
    /// Percentage, 0 for no prediction
    pub confidence: u8,
    pub supporting_numbers: Vec<u8>,
    pub rationale: Option<PredictionRationale>,
}

impl Prediction {
    pub fn none() -> Self {
        Self {
            dozen: None,
            confidence: 0,
            supporting_numbers: Vec::new(),
            rationale: None,
        }
    }

    pub fn is_some(&self) -> bool {
        self.dozen.is_some()
    }

    /// One-line summary for logging
    pub fn breakdown(&self) -> String {
        match (&self.dozen, &self.rationale) {
            (Some(dozen), Some(rationale)) => {
                let scores: Vec<String> = rationale
                    .scores
                    .iter()
                    .map(|s| format!("D{}={:.1}", s.dozen.index(), s.score))
                    .collect();
                format!(
                    "{} conf={}% [{}] nums={:?} ({}, window={})",
                    dozen,
                    self.confidence,
                    scores.join(" "),
                    self.supporting_numbers,
                    rationale.strategy.as_str(),
                    rationale.window_len
                )
            }
            _ => "no prediction".to_string(),
        }
    }
}

/// Dozen predictor
pub struct Predictor {
    config: PredictionConfig,
}

impl Predictor {
    pub fn new(config: PredictionConfig) -> Self {
        info!("📊 Predictor initialized:");
        info!("   Strategy: {}", config.strategy.as_str());
        info!("   Window: {} spins (min history {})",
              config.analysis_window, config.min_history);
        info!("   Weights: dozen={} delay={} deviation={}",
              config.dozen_weight, config.delay_weight, config.deviation_weight);

        Self { config }
    }

    pub fn strategy(&self) -> PredictionStrategy {
        self.config.strategy
    }

    /// Predict the dozen of the next spin
    ///
    /// `rng` is only consulted for the fallback sample of supporting numbers.
    pub fn predict(&self, history: &HistoryLog, rng: &mut dyn RngCore) -> Prediction {
        if history.len() < self.config.min_history {
            return Prediction::none();
        }

        let window_size = match self.config.strategy {
            PredictionStrategy::Weighted => self.config.analysis_window,
            PredictionStrategy::LowestCount => self.config.lowest_count_window,
        };
        let stats = history.dozen_stats(window_size);

        let (scores, confidence) = match self.config.strategy {
            PredictionStrategy::Weighted => {
                let scores = self.weighted_scores(&stats);
                let confidence = weighted_confidence(pick_best(&scores).score);
                (scores, confidence)
            }
            PredictionStrategy::LowestCount => {
                let scores = lowest_count_scores(&stats);
                let confidence = lowest_count_confidence(pick_best(&scores).score);
                (scores, confidence)
            }
        };

        let dozen = pick_best(&scores).dozen;
        let supporting_numbers = supporting_numbers(history, window_size, dozen, rng);

        let prediction = Prediction {
            dozen: Some(dozen),
            confidence,
            supporting_numbers,
            rationale: Some(PredictionRationale {
                strategy: self.config.strategy,
                window_len: stats.window_len,
                expected_per_dozen: stats.expected_per_dozen(),
                scores,
            }),
        };

        debug!("📊 {}", prediction.breakdown());
        prediction
    }

    fn weighted_scores(&self, stats: &DozenWindowStats) -> Vec<DozenScore> {
        let expected = stats.expected_per_dozen();

        Dozen::ALL
            .iter()
            .map(|&dozen| {
                let cell = stats.cell(dozen);
                let count = cell.count as f64;

                let deficit = self.config.dozen_weight * (expected - count);

                let delay = if cell.last_seen > DELAY_THRESHOLD {
                    self.config.delay_weight * cell.last_seen as f64
                } else {
                    0.0
                };

                let repeat = if cell.last_seen == 0 { REPEAT_PENALTY } else { 0.0 };

                let deviation = if expected > 0.0 {
                    self.config.deviation_weight * ((count - expected).abs() / expected)
                } else {
                    0.0
                };

                DozenScore {
                    dozen,
                    count: cell.count,
                    gap: cell.last_seen,
                    score: deficit + delay - repeat + deviation,
                }
            })
            .collect()
    }
}

/// Highest score, first dozen wins ties
fn pick_best(scores: &[DozenScore]) -> &DozenScore {
    let mut best = &scores[0];
    for candidate in &scores[1..] {
        if candidate.score > best.score {
            best = candidate;
        }
    }
    best
}

fn weighted_confidence(best_score: f64) -> u8 {
    if best_score <= 0.0 {
        return CONFIDENCE_BASE as u8;
    }
    let raw = CONFIDENCE_BASE + CONFIDENCE_SLOPE * (best_score / 2.0).min(100.0);
    raw.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL).round() as u8
}

/// Score = deficit against the even share, so the lowest count scores highest
fn lowest_count_scores(stats: &DozenWindowStats) -> Vec<DozenScore> {
    let expected = stats.expected_per_dozen();
    Dozen::ALL
        .iter()
        .map(|&dozen| {
            let cell = stats.cell(dozen);
            DozenScore {
                dozen,
                count: cell.count,
                gap: cell.last_seen,
                score: expected - cell.count as f64,
            }
        })
        .collect()
}

fn lowest_count_confidence(deficit: f64) -> u8 {
    (CONFIDENCE_BASE + 5.0 * deficit)
        .clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL)
        .round() as u8
}

/// Most frequent numbers of `dozen` in the window
///
/// Ranked by frequency, then by most recent appearance. Falls back to a
/// random sample of the dozen when fewer than 3 distinct numbers were seen.
fn supporting_numbers(
    history: &HistoryLog,
    window_size: usize,
    dozen: Dozen,
    rng: &mut dyn RngCore,
) -> Vec<u8> {
    // (number, hits, first index seen)
    let mut seen: Vec<(u8, usize, usize)> = Vec::new();
    for (idx, spin) in history.window(window_size).enumerate() {
        let n = spin.number();
        if !dozen.contains(n) {
            continue;
        }
        match seen.iter_mut().find(|(num, _, _)| *num == n) {
            Some(entry) => entry.1 += 1,
            None => seen.push((n, 1, idx)),
        }
    }

    if seen.len() < MIN_DISTINCT_OBSERVED {
        let mut pool: Vec<u8> = dozen.numbers().collect();
        pool.shuffle(rng);
        pool.truncate(MAX_SUPPORTING);
        return pool;
    }

    seen.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    seen.into_iter().take(MAX_SUPPORTING).map(|(n, _, _)| n).collect()
}
