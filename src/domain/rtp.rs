//! Theoretical return-to-player calculation.
//!
//! Every game's RTP is derived in closed form from its configured odds.
//! Results are fractions of the amount wagered (`0.95` is 95%). The
//! calculator backs a live preview, so it never fails: malformed input
//! (negative or non-finite parameters, an empty weight table, non-positive
//! odds) yields a zero result.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::game::{triple, GameConfig, GameKind, LotteryOdds, MatchCount, RouletteBet};

/// Blackjack return under basic strategy with an infinite-deck assumption.
pub const BLACKJACK_RTP: f64 = 0.994;

/// Pockets on the bot's roulette wheel, including the single green pocket.
pub const WHEEL_SIZE: u32 = 19;

/// The house pocket. It never wins an outside bet.
pub const GREEN_POCKET: u32 = 0;

const RED_POCKETS: [u32; 9] = [1, 3, 5, 7, 9, 12, 14, 16, 18];

/// Pocket colour on the roulette wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocketColor {
    Green,
    Red,
    Black,
}

/// Colour of a wheel pocket.
#[must_use]
pub fn pocket_color(pocket: u32) -> PocketColor {
    if pocket == GREEN_POCKET {
        PocketColor::Green
    } else if RED_POCKETS.contains(&pocket) {
        PocketColor::Red
    } else {
        PocketColor::Black
    }
}

/// Outcome of an RTP calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RtpResult {
    /// One expected return for the whole game.
    Single(f64),
    /// Roulette: expected return per bet kind.
    Breakdown(BTreeMap<RouletteBet, f64>),
}

impl RtpResult {
    /// Zero result shaped for the given game.
    #[must_use]
    pub fn zero(kind: GameKind) -> Self {
        match kind {
            GameKind::Roulette => RtpResult::Breakdown(
                RouletteBet::ALL.into_iter().map(|bet| (bet, 0.0)).collect(),
            ),
            _ => RtpResult::Single(0.0),
        }
    }

    /// Highest expected return across the result (the single value, or the
    /// best bet kind of a breakdown).
    #[must_use]
    pub fn peak(&self) -> f64 {
        match self {
            RtpResult::Single(value) => *value,
            RtpResult::Breakdown(values) => values.values().copied().fold(0.0, f64::max),
        }
    }

    /// The result scaled to percent for display.
    #[must_use]
    pub fn percent(&self) -> RtpResult {
        match self {
            RtpResult::Single(value) => RtpResult::Single(value * 100.0),
            RtpResult::Breakdown(values) => {
                RtpResult::Breakdown(values.iter().map(|(bet, v)| (*bet, v * 100.0)).collect())
            }
        }
    }

    /// Whether any part of the result is above `ceiling` (a fraction).
    #[must_use]
    pub fn exceeds(&self, ceiling: f64) -> bool {
        self.peak() > ceiling
    }
}

/// RTP of a game configuration.
#[must_use]
pub fn compute_rtp(config: &GameConfig) -> RtpResult {
    match config {
        GameConfig::Dice { win_multiplier, .. } => single(*win_multiplier / 6.0, &[*win_multiplier]),
        GameConfig::CoinFlip { win_multiplier, .. } => {
            single(0.5 * *win_multiplier, &[*win_multiplier])
        }
        GameConfig::Slots {
            symbol_weights,
            win_multipliers,
            ..
        } => RtpResult::Single(slots_rtp(symbol_weights, win_multipliers)),
        GameConfig::Lottery { win_multipliers, .. } => {
            RtpResult::Single(lottery_rtp(LotteryOdds::STANDARD, win_multipliers))
        }
        GameConfig::Roulette { win_multipliers, .. } => roulette_rtp(win_multipliers),
        GameConfig::RockPaperScissors { casino_cut, .. } => {
            if casino_cut.is_finite() && (0.0..=1.0).contains(casino_cut) {
                RtpResult::Single(1.0 - casino_cut)
            } else {
                RtpResult::Single(0.0)
            }
        }
        GameConfig::GoldenJackpot {
            win_multiplier,
            one_in_chance,
            ..
        } => {
            if *one_in_chance > 0.0 {
                single(win_multiplier / one_in_chance, &[*win_multiplier, *one_in_chance])
            } else {
                RtpResult::Single(0.0)
            }
        }
        GameConfig::Blackjack { .. } => RtpResult::Single(BLACKJACK_RTP),
        GameConfig::Prediction { .. } => RtpResult::Single(0.0),
    }
}

fn single(value: f64, params: &[f64]) -> RtpResult {
    RtpResult::Single(if params.iter().copied().all(valid_parameter) {
        finite_or_zero(value)
    } else {
        0.0
    })
}

fn valid_parameter(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Probability of three of a kind per symbol, for independent weighted draws.
///
/// Empty when the weights are unusable.
#[must_use]
pub fn slots_triple_probabilities(symbol_weights: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    if !symbol_weights.values().copied().all(valid_parameter) {
        return BTreeMap::new();
    }
    let total: f64 = symbol_weights.values().sum();
    if total <= 0.0 || !total.is_finite() {
        return BTreeMap::new();
    }
    symbol_weights
        .iter()
        .map(|(symbol, weight)| (symbol.clone(), (weight / total).powi(3)))
        .collect()
}

fn slots_rtp(symbol_weights: &BTreeMap<String, f64>, win_multipliers: &BTreeMap<String, f64>) -> f64 {
    if !win_multipliers.values().copied().all(valid_parameter) {
        return 0.0;
    }
    let rtp = slots_triple_probabilities(symbol_weights)
        .iter()
        .map(|(symbol, probability)| {
            probability * win_multipliers.get(&triple(symbol)).copied().unwrap_or(0.0)
        })
        .sum();
    finite_or_zero(rtp)
}

/// Binomial coefficient `C(n, k)`, computed multiplicatively.
///
/// Returns 0 when `k > n`.
#[must_use]
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}

/// Hypergeometric probability of matching exactly `k` numbers, for `k`
/// in `0..=pick_count`.
#[must_use]
pub fn lottery_distribution(odds: LotteryOdds) -> Vec<f64> {
    let outcomes = binomial(odds.total_numbers, odds.drawn_count);
    if outcomes == 0.0 {
        return vec![0.0; odds.pick_count as usize + 1];
    }
    (0..=odds.pick_count)
        .map(|k| {
            let misses_available = odds.total_numbers.saturating_sub(odds.pick_count);
            let favorable = if k > odds.drawn_count {
                0.0
            } else {
                binomial(odds.pick_count, k) * binomial(misses_available, odds.drawn_count - k)
            };
            favorable / outcomes
        })
        .collect()
}

fn lottery_rtp(odds: LotteryOdds, win_multipliers: &BTreeMap<MatchCount, f64>) -> f64 {
    if !win_multipliers.values().copied().all(valid_parameter) {
        return 0.0;
    }
    let rtp = lottery_distribution(odds)
        .iter()
        .zip(0u32..)
        .map(|(probability, k)| {
            probability * win_multipliers.get(&MatchCount(k)).copied().unwrap_or(0.0)
        })
        .sum();
    finite_or_zero(rtp)
}

/// Whether a pocket wins the given bet kind, for the representative bet of
/// that kind (number 1, red, even, low half, first dozen, first column).
fn pocket_wins(bet: RouletteBet, pocket: u32) -> bool {
    if pocket == GREEN_POCKET {
        return false;
    }
    match bet {
        RouletteBet::Number => pocket == 1,
        RouletteBet::Color => pocket_color(pocket) == PocketColor::Red,
        RouletteBet::Parity => pocket % 2 == 0,
        RouletteBet::Range => pocket <= (WHEEL_SIZE - 1) / 2,
        RouletteBet::Dozen => pocket <= (WHEEL_SIZE - 1) / 3,
        RouletteBet::Column => pocket % 3 == 1,
    }
}

/// Probability of winning one bet of the given kind on a single spin.
#[must_use]
pub fn roulette_win_probability(bet: RouletteBet) -> f64 {
    let winning = (0..WHEEL_SIZE).filter(|pocket| pocket_wins(bet, *pocket)).count();
    winning as f64 / f64::from(WHEEL_SIZE)
}

fn roulette_rtp(win_multipliers: &BTreeMap<RouletteBet, f64>) -> RtpResult {
    RtpResult::Breakdown(
        RouletteBet::ALL
            .into_iter()
            .map(|bet| {
                let multiplier = win_multipliers.get(&bet).copied().unwrap_or(0.0);
                let rtp = if valid_parameter(multiplier) {
                    finite_or_zero(roulette_win_probability(bet) * multiplier)
                } else {
                    0.0
                };
                (bet, rtp)
            })
            .collect(),
    )
}

/// RTP of a configuration with raw form edits applied on top.
///
/// `edits` is a JSON object of camelCase field names to new values, as a
/// settings form produces them: numbers, numeric strings, or empty strings
/// mid-edit. Nested maps (weights, multipliers) are merged key by key.
/// Anything that does not form a valid config previews as zero.
#[must_use]
pub fn preview_config_change(base: &GameConfig, edits: &Value) -> RtpResult {
    let kind = base.kind();
    let Ok(mut merged) = serde_json::to_value(base) else {
        return RtpResult::zero(kind);
    };
    if let (Value::Object(target), Value::Object(patch)) = (&mut merged, edits) {
        merge_object(target, patch);
    }
    coerce_numbers(&mut merged);
    if let Value::Object(fields) = &mut merged {
        fields.insert("game".to_string(), Value::String(kind.as_str().to_string()));
    }
    match serde_json::from_value::<GameConfig>(merged) {
        Ok(config) => compute_rtp(&config),
        Err(_) => RtpResult::zero(kind),
    }
}

fn merge_object(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_object(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Turn form strings into numbers; blank or unparsable strings become 0.
fn coerce_numbers(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                if key != "game" {
                    coerce_numbers(field);
                }
            }
        }
        Value::String(text) => {
            let parsed = text.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            *value = serde_json::Number::from_f64(parsed.unwrap_or(0.0))
                .map_or(Value::Null, Value::Number);
        }
        Value::Null => *value = Value::from(0),
        _ => {}
    }
}
