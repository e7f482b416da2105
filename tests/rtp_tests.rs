//! RTP calculator behaviour over the public API.

use std::collections::BTreeMap;

use croupier::domain::game::{
    triple, BetLimits, CasinoSettings, GameConfig, GameKind, LotteryOdds, RouletteBet,
};
use croupier::domain::rtp::{
    compute_rtp, lottery_distribution, preview_config_change, slots_triple_probabilities,
    RtpResult,
};
use proptest::prelude::*;
use serde_json::json;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn default_configs_produce_expected_returns() {
    let settings = CasinoSettings::default();
    let expect = |kind: GameKind| compute_rtp(settings.get(kind)).peak();

    assert!(close(expect(GameKind::Dice), 5.0 / 6.0));
    assert!(close(expect(GameKind::CoinFlip), 0.95));
    assert!(close(expect(GameKind::RockPaperScissors), 0.975));
    assert!(close(expect(GameKind::GoldenJackpot), 10_000.0 / 12_000.0));
    assert!(close(expect(GameKind::Blackjack), 0.994));
    assert!(close(expect(GameKind::Prediction), 0.0));
}

#[test]
fn slots_rtp_weights_triples_by_multiplier() {
    let weights: BTreeMap<String, f64> = [("A".to_string(), 1.0), ("B".to_string(), 1.0)].into();
    let multipliers: BTreeMap<String, f64> = [(triple("A"), 8.0)].into();
    let config = GameConfig::Slots {
        limits: BetLimits::unbounded(),
        symbol_weights: weights,
        win_multipliers: multipliers,
    };
    // P(AAA) = 1/8
    assert!(close(compute_rtp(&config).peak(), 1.0));
}

#[test]
fn slots_with_zero_weights_is_zero() {
    let config = GameConfig::Slots {
        limits: BetLimits::unbounded(),
        symbol_weights: [("A".to_string(), 0.0)].into(),
        win_multipliers: [(triple("A"), 10.0)].into(),
    };
    assert_eq!(compute_rtp(&config), RtpResult::Single(0.0));
}

#[test]
fn golden_jackpot_zero_chance_is_zero() {
    let config = GameConfig::GoldenJackpot {
        limits: BetLimits::unbounded(),
        win_multiplier: 100.0,
        one_in_chance: 0.0,
    };
    assert_eq!(compute_rtp(&config), RtpResult::Single(0.0));
}

#[test]
fn preview_merges_nested_multipliers() {
    let base = GameConfig::default_for(GameKind::Roulette);
    let preview = preview_config_change(&base, &json!({ "winMultipliers": { "number": "19" } }));
    let RtpResult::Breakdown(values) = preview else {
        panic!("roulette preview must be a breakdown");
    };
    assert!(close(values[&RouletteBet::Number], 1.0));
    // Untouched bets keep their saved multipliers.
    assert!(close(
        values[&RouletteBet::Color],
        9.0 / 19.0 * 1.9
    ));
}

#[test]
fn preview_with_garbage_is_zero_not_error() {
    let base = GameConfig::default_for(GameKind::GoldenJackpot);
    let preview = preview_config_change(&base, &json!({ "oneInChance": "abc" }));
    assert_eq!(preview, RtpResult::Single(0.0));
}

proptest! {
    #[test]
    fn rtp_is_never_negative_or_nan(multiplier in proptest::num::f64::ANY, chance in proptest::num::f64::ANY) {
        let configs = [
            GameConfig::Dice { limits: BetLimits::unbounded(), win_multiplier: multiplier },
            GameConfig::CoinFlip { limits: BetLimits::unbounded(), win_multiplier: multiplier },
            GameConfig::RockPaperScissors { limits: BetLimits::unbounded(), casino_cut: chance },
            GameConfig::GoldenJackpot {
                limits: BetLimits::unbounded(),
                win_multiplier: multiplier,
                one_in_chance: chance,
            },
        ];
        for config in &configs {
            let rtp = compute_rtp(config).peak();
            prop_assert!(rtp.is_finite());
            prop_assert!(rtp >= 0.0);
        }
    }

    #[test]
    fn triple_probabilities_never_exceed_one(weights in proptest::collection::vec(0.0f64..1_000.0, 1..8)) {
        let table: BTreeMap<String, f64> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| (format!("s{i}"), *w))
            .collect();
        let total: f64 = slots_triple_probabilities(&table).values().sum();
        prop_assert!(total <= 1.0 + 1e-9);
    }

    #[test]
    fn equal_slot_weights_give_uniform_triples(symbols in 1usize..12, weight in 0.001f64..1_000.0) {
        let table: BTreeMap<String, f64> =
            (0..symbols).map(|i| (format!("s{i}"), weight)).collect();
        let probabilities = slots_triple_probabilities(&table);
        let expected = (1.0 / symbols as f64).powi(3);
        prop_assert_eq!(probabilities.len(), symbols);
        for probability in probabilities.values() {
            prop_assert!((probability - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn dice_and_coinflip_are_linear_through_origin(multiplier in 0.0f64..1_000.0, scale in 0.0f64..10.0) {
        let dice = |m: f64| compute_rtp(&GameConfig::Dice { limits: BetLimits::unbounded(), win_multiplier: m }).peak();
        let coin = |m: f64| compute_rtp(&GameConfig::CoinFlip { limits: BetLimits::unbounded(), win_multiplier: m }).peak();

        prop_assert_eq!(dice(0.0), 0.0);
        prop_assert_eq!(coin(0.0), 0.0);
        prop_assert!((dice(multiplier) - multiplier / 6.0).abs() < 1e-9);
        prop_assert!((coin(multiplier) - multiplier / 2.0).abs() < 1e-9);
        prop_assert!((dice(scale * multiplier) - scale * dice(multiplier)).abs() < 1e-9);
        prop_assert!((coin(scale * multiplier) - scale * coin(multiplier)).abs() < 1e-9);
    }

    #[test]
    fn lottery_distribution_sums_to_one(
        (total_numbers, drawn_count, pick_count) in (1u32..=60)
            .prop_flat_map(|total| (Just(total), 0..=total, 0..=total)),
    ) {
        let odds = LotteryOdds { total_numbers, drawn_count, pick_count };
        let distribution = lottery_distribution(odds);
        prop_assert_eq!(distribution.len(), pick_count as usize + 1);
        prop_assert!(distribution.iter().all(|p| *p >= 0.0));
        let total: f64 = distribution.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "{:?} sums to {}", odds, total);
    }

    #[test]
    fn empty_preview_matches_saved_config(multiplier in 0.0f64..50.0) {
        let base = GameConfig::Dice { limits: BetLimits::unbounded(), win_multiplier: multiplier };
        let preview = preview_config_change(&base, &json!({})).peak();
        prop_assert!((preview - compute_rtp(&base).peak()).abs() < 1e-9);
    }
}
