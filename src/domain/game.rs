//! Game configuration model.
//!
//! Every configurable game is one variant of the closed [`GameConfig`] sum
//! type. Each variant carries its [`BetLimits`] plus the tunable odds the
//! RTP calculator reads. [`CasinoSettings`] groups one config per game for a
//! guild and knows the dashboard defaults.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

/// Every configurable game, in dashboard display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameKind {
    #[serde(rename = "dice")]
    Dice,
    #[serde(rename = "coinflip")]
    CoinFlip,
    #[serde(rename = "slots")]
    Slots,
    #[serde(rename = "lottery")]
    Lottery,
    #[serde(rename = "roulette")]
    Roulette,
    #[serde(rename = "rps")]
    RockPaperScissors,
    #[serde(rename = "goldenJackpot")]
    GoldenJackpot,
    #[serde(rename = "blackjack")]
    Blackjack,
    #[serde(rename = "prediction")]
    Prediction,
}

impl GameKind {
    pub const ALL: [GameKind; 9] = [
        GameKind::Dice,
        GameKind::CoinFlip,
        GameKind::Slots,
        GameKind::Lottery,
        GameKind::Roulette,
        GameKind::RockPaperScissors,
        GameKind::GoldenJackpot,
        GameKind::Blackjack,
        GameKind::Prediction,
    ];

    /// Stable storage key, identical to the serialized tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::CoinFlip => "coinflip",
            GameKind::Slots => "slots",
            GameKind::Lottery => "lottery",
            GameKind::Roulette => "roulette",
            GameKind::RockPaperScissors => "rps",
            GameKind::GoldenJackpot => "goldenJackpot",
            GameKind::Blackjack => "blackjack",
            GameKind::Prediction => "prediction",
        }
    }

    /// Human-readable name shown to operators.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            GameKind::Dice => "Dice",
            GameKind::CoinFlip => "Coin Flip",
            GameKind::Slots => "Slots",
            GameKind::Lottery => "Lottery",
            GameKind::Roulette => "Roulette",
            GameKind::RockPaperScissors => "Rock Paper Scissors",
            GameKind::GoldenJackpot => "Golden Jackpot",
            GameKind::Blackjack => "Blackjack",
            GameKind::Prediction => "Prediction",
        }
    }

    /// Parse a storage key.
    ///
    /// # Errors
    /// Returns [`DomainError::UnknownVariant`] for keys outside the closed set.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownVariant {
                vocabulary: "game",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum and maximum wager. `max_bet == 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetLimits {
    #[serde(default)]
    pub min_bet: Decimal,
    #[serde(default)]
    pub max_bet: Decimal,
}

impl BetLimits {
    /// No minimum, no maximum.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min_bet: Decimal::ZERO,
            max_bet: Decimal::ZERO,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let ordered = self.max_bet.is_zero() || self.max_bet >= self.min_bet;
        if self.min_bet.is_sign_negative() || self.max_bet.is_sign_negative() || !ordered {
            return Err(DomainError::InvalidBetLimits {
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        Ok(())
    }
}

/// Bet kinds offered on the 19-number roulette wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouletteBet {
    Number,
    Color,
    Parity,
    Range,
    Dozen,
    Column,
}

impl RouletteBet {
    pub const ALL: [RouletteBet; 6] = [
        RouletteBet::Number,
        RouletteBet::Color,
        RouletteBet::Parity,
        RouletteBet::Range,
        RouletteBet::Dozen,
        RouletteBet::Column,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RouletteBet::Number => "number",
            RouletteBet::Color => "color",
            RouletteBet::Parity => "parity",
            RouletteBet::Range => "range",
            RouletteBet::Dozen => "dozen",
            RouletteBet::Column => "column",
        }
    }
}

impl fmt::Display for RouletteBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of drawn numbers a lottery ticket matched.
///
/// Serialized as a plain integer; accepted as an integer or a numeric
/// string because JSON object keys are always strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchCount(pub u32);

impl Serialize for MatchCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for MatchCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MatchCountVisitor;

        impl serde::de::Visitor<'_> for MatchCountVisitor {
            type Value = MatchCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a match count as integer or numeric string")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<MatchCount, E> {
                u32::try_from(v).map(MatchCount).map_err(E::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<MatchCount, E> {
                u32::try_from(v).map(MatchCount).map_err(E::custom)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<MatchCount, E> {
                v.trim().parse().map(MatchCount).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MatchCountVisitor)
    }
}

/// Fixed lottery shape: how many numbers exist, are drawn, and are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryOdds {
    pub total_numbers: u32,
    pub drawn_count: u32,
    pub pick_count: u32,
}

impl LotteryOdds {
    /// The bot's lottery: pick 4, draw 4 out of 40.
    pub const STANDARD: LotteryOdds = LotteryOdds {
        total_numbers: 40,
        drawn_count: 4,
        pick_count: 4,
    };
}

/// Tunable parameters of one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all_fields = "camelCase")]
pub enum GameConfig {
    #[serde(rename = "dice")]
    Dice {
        #[serde(flatten)]
        limits: BetLimits,
        win_multiplier: f64,
    },
    #[serde(rename = "coinflip")]
    CoinFlip {
        #[serde(flatten)]
        limits: BetLimits,
        win_multiplier: f64,
    },
    #[serde(rename = "slots")]
    Slots {
        #[serde(flatten)]
        limits: BetLimits,
        #[serde(default)]
        symbol_weights: BTreeMap<String, f64>,
        #[serde(default)]
        win_multipliers: BTreeMap<String, f64>,
    },
    #[serde(rename = "lottery")]
    Lottery {
        #[serde(flatten)]
        limits: BetLimits,
        #[serde(default)]
        win_multipliers: BTreeMap<MatchCount, f64>,
    },
    #[serde(rename = "roulette")]
    Roulette {
        #[serde(flatten)]
        limits: BetLimits,
        #[serde(default)]
        win_multipliers: BTreeMap<RouletteBet, f64>,
    },
    #[serde(rename = "rps")]
    RockPaperScissors {
        #[serde(flatten)]
        limits: BetLimits,
        casino_cut: f64,
    },
    #[serde(rename = "goldenJackpot")]
    GoldenJackpot {
        #[serde(flatten)]
        limits: BetLimits,
        win_multiplier: f64,
        one_in_chance: f64,
    },
    #[serde(rename = "blackjack")]
    Blackjack {
        #[serde(flatten)]
        limits: BetLimits,
    },
    #[serde(rename = "prediction")]
    Prediction {
        #[serde(flatten)]
        limits: BetLimits,
    },
}

impl GameConfig {
    #[must_use]
    pub const fn kind(&self) -> GameKind {
        match self {
            GameConfig::Dice { .. } => GameKind::Dice,
            GameConfig::CoinFlip { .. } => GameKind::CoinFlip,
            GameConfig::Slots { .. } => GameKind::Slots,
            GameConfig::Lottery { .. } => GameKind::Lottery,
            GameConfig::Roulette { .. } => GameKind::Roulette,
            GameConfig::RockPaperScissors { .. } => GameKind::RockPaperScissors,
            GameConfig::GoldenJackpot { .. } => GameKind::GoldenJackpot,
            GameConfig::Blackjack { .. } => GameKind::Blackjack,
            GameConfig::Prediction { .. } => GameKind::Prediction,
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &BetLimits {
        match self {
            GameConfig::Dice { limits, .. }
            | GameConfig::CoinFlip { limits, .. }
            | GameConfig::Slots { limits, .. }
            | GameConfig::Lottery { limits, .. }
            | GameConfig::Roulette { limits, .. }
            | GameConfig::RockPaperScissors { limits, .. }
            | GameConfig::GoldenJackpot { limits, .. }
            | GameConfig::Blackjack { limits }
            | GameConfig::Prediction { limits } => limits,
        }
    }

    /// Dashboard default configuration for a game.
    #[must_use]
    pub fn default_for(kind: GameKind) -> Self {
        let limits = BetLimits::unbounded();
        match kind {
            GameKind::Dice => GameConfig::Dice {
                limits,
                win_multiplier: 5.0,
            },
            GameKind::CoinFlip => GameConfig::CoinFlip {
                limits,
                win_multiplier: 1.9,
            },
            GameKind::Slots => {
                let table = [
                    ("🍒", 35.0, 5.0),
                    ("🍋", 25.0, 10.0),
                    ("🍉", 10.0, 20.0),
                    ("🔔", 4.0, 50.0),
                    ("7️⃣", 2.0, 100.0),
                ];
                GameConfig::Slots {
                    limits,
                    symbol_weights: table
                        .iter()
                        .map(|(symbol, weight, _)| ((*symbol).to_string(), *weight))
                        .collect(),
                    win_multipliers: table
                        .iter()
                        .map(|(symbol, _, multiplier)| (triple(symbol), *multiplier))
                        .collect(),
                }
            }
            GameKind::Lottery => GameConfig::Lottery {
                limits,
                win_multipliers: [(4, 100.0), (3, 40.0), (2, 10.0), (1, 1.0), (0, 0.0)]
                    .into_iter()
                    .map(|(count, multiplier)| (MatchCount(count), multiplier))
                    .collect(),
            },
            GameKind::Roulette => GameConfig::Roulette {
                limits,
                win_multipliers: [
                    (RouletteBet::Number, 18.0),
                    (RouletteBet::Color, 1.9),
                    (RouletteBet::Parity, 1.9),
                    (RouletteBet::Range, 1.9),
                    (RouletteBet::Dozen, 2.9),
                    (RouletteBet::Column, 2.9),
                ]
                .into_iter()
                .collect(),
            },
            GameKind::RockPaperScissors => GameConfig::RockPaperScissors {
                limits,
                casino_cut: 0.025,
            },
            GameKind::GoldenJackpot => GameConfig::GoldenJackpot {
                limits,
                win_multiplier: 10_000.0,
                one_in_chance: 12_000.0,
            },
            GameKind::Blackjack => GameConfig::Blackjack { limits },
            GameKind::Prediction => GameConfig::Prediction { limits },
        }
    }

    /// Check the configuration against the domain invariants.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.limits().validate()?;
        match self {
            GameConfig::Dice { win_multiplier, .. } | GameConfig::CoinFlip { win_multiplier, .. } => {
                non_negative("winMultiplier", *win_multiplier)
            }
            GameConfig::Slots {
                symbol_weights,
                win_multipliers,
                ..
            } => {
                for (symbol, weight) in symbol_weights {
                    non_negative(&format!("symbolWeights.{symbol}"), *weight)?;
                }
                for (combo, multiplier) in win_multipliers {
                    non_negative(&format!("winMultipliers.{combo}"), *multiplier)?;
                }
                if symbol_weights.values().sum::<f64>() <= 0.0 {
                    return Err(DomainError::EmptyWeights);
                }
                Ok(())
            }
            GameConfig::Lottery { win_multipliers, .. } => win_multipliers
                .iter()
                .try_for_each(|(count, m)| non_negative(&format!("winMultipliers.{}", count.0), *m)),
            GameConfig::Roulette { win_multipliers, .. } => win_multipliers
                .iter()
                .try_for_each(|(bet, m)| non_negative(&format!("winMultipliers.{bet}"), *m)),
            GameConfig::RockPaperScissors { casino_cut, .. } => {
                if casino_cut.is_finite() && (0.0..=1.0).contains(casino_cut) {
                    Ok(())
                } else {
                    Err(DomainError::CutOutOfRange(*casino_cut))
                }
            }
            GameConfig::GoldenJackpot {
                win_multiplier,
                one_in_chance,
                ..
            } => {
                non_negative("winMultiplier", *win_multiplier)?;
                if one_in_chance.is_finite() && *one_in_chance > 0.0 {
                    Ok(())
                } else {
                    Err(DomainError::NonPositiveOdds(*one_in_chance))
                }
            }
            GameConfig::Blackjack { .. } | GameConfig::Prediction { .. } => Ok(()),
        }
    }
}

/// Combo key for three of a kind.
#[must_use]
pub fn triple(symbol: &str) -> String {
    symbol.repeat(3)
}

fn non_negative(field: &str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DomainError::NegativeParameter {
            field: field.to_string(),
            value,
        })
    }
}

/// One configuration per game for a guild.
#[derive(Debug, Clone, PartialEq)]
pub struct CasinoSettings {
    games: BTreeMap<GameKind, GameConfig>,
}

impl CasinoSettings {
    /// Settings with only the supplied configs; other games fall back to defaults.
    pub fn from_configs(configs: impl IntoIterator<Item = GameConfig>) -> Self {
        let mut settings = Self::default();
        for config in configs {
            settings.upsert(config);
        }
        settings
    }

    #[must_use]
    pub fn get(&self, kind: GameKind) -> &GameConfig {
        // Every kind is populated at construction.
        &self.games[&kind]
    }

    /// Replace the config of the game the value belongs to.
    pub fn upsert(&mut self, config: GameConfig) {
        self.games.insert(config.kind(), config);
    }

    /// Iterate configs in display order.
    pub fn iter(&self) -> impl Iterator<Item = &GameConfig> {
        self.games.values()
    }
}

impl Default for CasinoSettings {
    fn default() -> Self {
        Self {
            games: GameKind::ALL
                .into_iter()
                .map(|kind| (kind, GameConfig::default_for(kind)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn game_kind_round_trips_storage_key() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(GameKind::parse("poker").is_err());
    }

    #[test]
    fn bet_limits_zero_max_is_unbounded() {
        let limits = BetLimits {
            min_bet: dec!(10),
            max_bet: Decimal::ZERO,
        };
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn bet_limits_must_be_ordered() {
        let inverted = BetLimits {
            min_bet: dec!(100),
            max_bet: dec!(1),
        };
        assert_eq!(
            inverted.validate(),
            Err(DomainError::InvalidBetLimits {
                min: dec!(100),
                max: dec!(1),
            })
        );
        let negative = BetLimits {
            min_bet: dec!(-1),
            max_bet: dec!(5),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn defaults_cover_every_game() {
        let settings = CasinoSettings::default();
        let kinds: Vec<GameKind> = settings.iter().map(GameConfig::kind).collect();
        assert_eq!(kinds, GameKind::ALL.to_vec());
        for config in settings.iter() {
            assert!(config.validate().is_ok(), "{:?}", config.kind());
        }
    }

    #[test]
    fn from_configs_overrides_single_game() {
        let settings = CasinoSettings::from_configs([GameConfig::Dice {
            limits: BetLimits::unbounded(),
            win_multiplier: 4.0,
        }]);
        assert!(matches!(
            settings.get(GameKind::Dice),
            GameConfig::Dice { win_multiplier, .. } if *win_multiplier == 4.0
        ));
        assert_eq!(
            settings.get(GameKind::CoinFlip),
            &GameConfig::default_for(GameKind::CoinFlip)
        );
    }

    #[test]
    fn dice_serializes_with_camel_case_tag() {
        let json = serde_json::to_value(GameConfig::default_for(GameKind::Dice)).unwrap();
        assert_eq!(json["game"], "dice");
        assert_eq!(json["winMultiplier"], 5.0);
        assert!(json.get("maxBet").is_some());
    }

    #[test]
    fn lottery_parses_string_match_counts() {
        let json = r#"{"game":"lottery","minBet":0,"maxBet":0,"winMultipliers":{"4":100,"3":40}}"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        match config {
            GameConfig::Lottery { win_multipliers, .. } => {
                assert_eq!(win_multipliers.get(&MatchCount(4)), Some(&100.0));
                assert_eq!(win_multipliers.get(&MatchCount(3)), Some(&40.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_cut_above_one() {
        let config = GameConfig::RockPaperScissors {
            limits: BetLimits::unbounded(),
            casino_cut: 1.5,
        };
        assert_eq!(config.validate(), Err(DomainError::CutOutOfRange(1.5)));
    }

    #[test]
    fn validate_rejects_inverted_limits() {
        let config = GameConfig::Blackjack {
            limits: BetLimits {
                min_bet: dec!(50),
                max_bet: dec!(10),
            },
        };
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidBetLimits { .. })
        ));
    }

    #[test]
    fn validate_rejects_all_zero_weights() {
        let config = GameConfig::Slots {
            limits: BetLimits::unbounded(),
            symbol_weights: [("A".to_string(), 0.0)].into_iter().collect(),
            win_multipliers: BTreeMap::new(),
        };
        assert_eq!(config.validate(), Err(DomainError::EmptyWeights));
    }
}
