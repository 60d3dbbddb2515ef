//! Dice expressions and d20 rolling.
//!
//! Expressions are sums of terms: `NdM` dice, signed integer constants and
//! three-letter ability tokens (`STR`, `DEX`, ...) that resolve to an actor's
//! ability modifier, e.g. `1d8+STR` or `2d6 - 1`.

use crate::actor::{Ability, AbilityScores};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest number of dice a single term may roll.
pub const MAX_DICE_PER_TERM: u32 = 1000;

/// Largest die the parser accepts.
pub const MAX_DIE_SIDES: u32 = 10_000;

/// Largest ability modifier any score can produce, in either direction.
const MAX_ABILITY_MODIFIER: i64 = 128;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: d{0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Zero dice in term {0}")]
    ZeroCount(String),
    #[error("Unknown ability token: {0}")]
    UnknownToken(String),
    #[error("Operator without a term in {0}")]
    DanglingOperator(String),
    #[error("Too many dice in one term: {0} (max {MAX_DICE_PER_TERM})")]
    TooManyDice(u32),
    #[error("Expression can exceed the integer range: {0}")]
    TooLarge(String),
}

/// Source of individual die results.
///
/// The engine only ever asks for one die at a time, so a scripted source can
/// fix outcomes exactly.
pub trait DieSource: Send {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Uniform dice backed by a seedable RNG.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl DieSource for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }
}

/// Resolves ability tokens to modifiers.
pub trait ModifierSource {
    fn modifier(&self, ability: Ability) -> i32;
}

impl ModifierSource for AbilityScores {
    fn modifier(&self, ability: Ability) -> i32 {
        i32::from(AbilityScores::modifier(self, ability))
    }
}

/// Resolves every ability token to zero.
impl ModifierSource for () {
    fn modifier(&self, _ability: Ability) -> i32 {
        0
    }
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Combine two advantage states (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (Advantage::Advantage, Advantage::Disadvantage)
            | (Advantage::Disadvantage, Advantage::Advantage) => Advantage::Normal,
            (Advantage::Advantage, Advantage::Advantage) => Advantage::Advantage,
            (Advantage::Disadvantage, Advantage::Disadvantage) => Advantage::Disadvantage,
        }
    }

    /// Map a boolean advantage flag.
    pub fn from_flag(advantage: bool) -> Advantage {
        if advantage {
            Advantage::Advantage
        } else {
            Advantage::Normal
        }
    }

    pub fn parse(s: &str) -> Option<Advantage> {
        match s.trim().to_lowercase().as_str() {
            "" | "normal" | "none" | "false" => Some(Advantage::Normal),
            "advantage" | "adv" | "true" => Some(Advantage::Advantage),
            "disadvantage" | "dis" => Some(Advantage::Disadvantage),
            _ => None,
        }
    }
}

/// One term of a dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Dice { count: u32, sides: u32, sign: i32 },
    Constant(i32),
    Ability { ability: Ability, sign: i32 },
}

/// A parsed dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    terms: Vec<Term>,
    original: String,
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let original = notation.trim().to_string();
        let compact: String = original
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut terms = Vec::new();
        let mut current = String::new();
        let mut sign: i32 = 1;
        let mut pending_operator = false;

        for ch in compact.chars() {
            match ch {
                '+' | '-' => {
                    if current.is_empty() {
                        // A leading sign is allowed once; anything else is two operators in a row.
                        if pending_operator || !terms.is_empty() {
                            return Err(DiceError::DanglingOperator(original));
                        }
                    } else {
                        terms.push(Self::parse_term(&current, sign)?);
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                    pending_operator = true;
                }
                _ => {
                    current.push(ch);
                    pending_operator = false;
                }
            }
        }

        if current.is_empty() {
            return Err(DiceError::DanglingOperator(original));
        }
        terms.push(Self::parse_term(&current, sign)?);

        if Self::worst_case(&terms) > i64::from(i32::MAX) {
            return Err(DiceError::TooLarge(original));
        }
        Ok(DiceExpression { terms, original })
    }

    /// Largest magnitude a critical roll of `terms` can reach.
    fn worst_case(terms: &[Term]) -> i64 {
        let mut low: i64 = 0;
        let mut high: i64 = 0;
        for term in terms {
            let (a, b) = match *term {
                Term::Dice { count, sides, sign } => {
                    let max = 2 * i64::from(count) * i64::from(sides);
                    if sign > 0 {
                        (0, max)
                    } else {
                        (-max, 0)
                    }
                }
                Term::Constant(value) => (i64::from(value), i64::from(value)),
                Term::Ability { .. } => (-MAX_ABILITY_MODIFIER, MAX_ABILITY_MODIFIER),
            };
            low += a;
            high += b;
        }
        low.abs().max(high.abs())
    }

    fn parse_term(s: &str, sign: i32) -> Result<Term, DiceError> {
        if let Some(ability) = Ability::from_abbreviation(s) {
            return Ok(Term::Ability { ability, sign });
        }

        if s.chars().all(|c| c.is_ascii_digit()) {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            return Ok(Term::Constant(sign * value));
        }

        if s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DiceError::UnknownToken(s.to_uppercase()));
        }
        let Some(d_pos) = s.find('d') else {
            return Err(DiceError::InvalidNotation(s.to_string()));
        };
        let count_str = &s[..d_pos];
        let sides_str = &s[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };
        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;

        if count == 0 {
            return Err(DiceError::ZeroCount(s.to_string()));
        }
        if count > MAX_DICE_PER_TERM {
            return Err(DiceError::TooManyDice(count));
        }
        if sides == 0 || sides > MAX_DIE_SIDES {
            return Err(DiceError::InvalidDieSize(sides));
        }

        Ok(Term::Dice { count, sides, sign })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether the expression contains at least one dice term.
    pub fn has_dice(&self) -> bool {
        self.terms.iter().any(|t| matches!(t, Term::Dice { .. }))
    }

    /// Smallest and largest possible totals for the given modifiers.
    pub fn bounds(&self, modifiers: &impl ModifierSource) -> (i32, i32) {
        let mut low: i32 = 0;
        let mut high: i32 = 0;
        for term in &self.terms {
            match *term {
                Term::Dice { count, sides, sign } => {
                    let (a, b) = (count as i32, (count * sides) as i32);
                    if sign > 0 {
                        low = low.saturating_add(a);
                        high = high.saturating_add(b);
                    } else {
                        low = low.saturating_sub(b);
                        high = high.saturating_sub(a);
                    }
                }
                Term::Constant(value) => {
                    low = low.saturating_add(value);
                    high = high.saturating_add(value);
                }
                Term::Ability { ability, sign } => {
                    let value = sign.saturating_mul(modifiers.modifier(ability));
                    low = low.saturating_add(value);
                    high = high.saturating_add(value);
                }
            }
        }
        (low, high)
    }

    /// Roll the expression once.
    pub fn evaluate<D: DieSource + ?Sized>(
        &self,
        dice: &mut D,
        modifiers: &impl ModifierSource,
    ) -> RollResult {
        self.roll(dice, modifiers, false)
    }

    /// Roll for a critical hit: dice terms twice, flat terms once.
    pub fn evaluate_critical<D: DieSource + ?Sized>(
        &self,
        dice: &mut D,
        modifiers: &impl ModifierSource,
    ) -> RollResult {
        self.roll(dice, modifiers, true)
    }

    fn roll<D: DieSource + ?Sized>(
        &self,
        dice: &mut D,
        modifiers: &impl ModifierSource,
        critical: bool,
    ) -> RollResult {
        let mut component_results = Vec::new();
        let mut ability_bonuses = Vec::new();
        let mut modifier: i32 = 0;

        for term in &self.terms {
            match *term {
                Term::Dice { count, sides, sign } => {
                    let count = if critical { count * 2 } else { count };
                    let rolls: Vec<u32> = (0..count).map(|_| dice.roll_die(sides)).collect();
                    let subtotal = sign * rolls.iter().sum::<u32>() as i32;
                    component_results.push(ComponentResult {
                        count,
                        sides,
                        rolls,
                        subtotal,
                    });
                }
                Term::Constant(value) => modifier = modifier.saturating_add(value),
                Term::Ability { ability, sign } => ability_bonuses.push(AbilityBonus {
                    ability,
                    value: sign.saturating_mul(modifiers.modifier(ability)),
                }),
            }
        }

        let total = component_results
            .iter()
            .map(|c| c.subtotal)
            .chain(ability_bonuses.iter().map(|b| b.value))
            .fold(modifier, i32::saturating_add);

        RollResult {
            expression: self.original.clone(),
            component_results,
            ability_bonuses,
            modifier,
            total,
            critical,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DiceExpression::parse(&s)
    }
}

impl From<DiceExpression> for String {
    fn from(expr: DiceExpression) -> String {
        expr.original
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Result of rolling a single dice term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentResult {
    pub count: u32,
    pub sides: u32,
    pub rolls: Vec<u32>,
    /// Signed sum of the rolls.
    pub subtotal: i32,
}

/// An ability token resolved during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBonus {
    pub ability: Ability,
    pub value: i32,
}

/// Complete result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: String,
    pub component_results: Vec<ComponentResult>,
    pub ability_bonuses: Vec<AbilityBonus>,
    /// Sum of the constant terms.
    pub modifier: i32,
    pub total: i32,
    pub critical: bool,
}

impl RollResult {
    /// Every individual die rolled, in order.
    pub fn rolls(&self) -> Vec<u32> {
        self.component_results
            .iter()
            .flat_map(|c| c.rolls.iter().copied())
            .collect()
    }

    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let mut parts: Vec<String> = self
            .component_results
            .iter()
            .map(|c| {
                let rolls: Vec<String> = c.rolls.iter().map(|r| r.to_string()).collect();
                let group = format!("[{}]", rolls.join(", "));
                if c.subtotal < 0 {
                    format!("-{group}")
                } else {
                    group
                }
            })
            .collect();

        for bonus in &self.ability_bonuses {
            parts.push(format!("{} {:+}", bonus.ability.abbreviation(), bonus.value));
        }
        if self.modifier != 0 {
            parts.push(format!("{:+}", self.modifier));
        }
        parts.join(" ")
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.expression, self.dice_display(), self.total)
    }
}

/// A d20 roll, possibly with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// Every d20 rolled (one or two).
    pub rolls: Vec<u32>,
    /// The die that counts.
    pub kept: u32,
    pub advantage: Advantage,
}

impl D20Roll {
    pub fn natural_20(&self) -> bool {
        self.kept == 20
    }

    pub fn natural_1(&self) -> bool {
        self.kept == 1
    }
}

/// Roll a d20 under the given advantage state.
pub fn roll_d20<D: DieSource + ?Sized>(dice: &mut D, advantage: Advantage) -> D20Roll {
    let first = dice.roll_die(20);
    match advantage {
        Advantage::Normal => D20Roll {
            rolls: vec![first],
            kept: first,
            advantage,
        },
        Advantage::Advantage | Advantage::Disadvantage => {
            let second = dice.roll_die(20);
            let kept = if advantage == Advantage::Advantage {
                first.max(second)
            } else {
                first.min(second)
            };
            D20Roll {
                rolls: vec![first, second],
                kept,
                advantage,
            }
        }
    }
}

/// Parse and evaluate an expression in one step.
pub fn evaluate<D: DieSource + ?Sized>(
    notation: &str,
    dice: &mut D,
    modifiers: &impl ModifierSource,
) -> Result<RollResult, DiceError> {
    Ok(DiceExpression::parse(notation)?.evaluate(dice, modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedDice;

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("1d20").unwrap();
        assert_eq!(
            expr.terms(),
            &[Term::Dice {
                count: 1,
                sides: 20,
                sign: 1
            }]
        );
    }

    #[test]
    fn test_parse_with_ability_token() {
        let expr = DiceExpression::parse("1d8 + str - 1").unwrap();
        assert_eq!(expr.terms().len(), 3);
        assert_eq!(
            expr.terms()[1],
            Term::Ability {
                ability: Ability::Strength,
                sign: 1
            }
        );
        assert_eq!(expr.terms()[2], Term::Constant(-1));
        assert_eq!(expr.to_string(), "1d8 + str - 1");
    }

    #[test]
    fn test_dex_is_not_a_die() {
        let expr = DiceExpression::parse("1d4+DEX").unwrap();
        assert!(matches!(
            expr.terms()[1],
            Term::Ability {
                ability: Ability::Dexterity,
                ..
            }
        ));
    }

    #[test]
    fn test_shorthand_single_die() {
        let expr = DiceExpression::parse("d6").unwrap();
        assert!(matches!(expr.terms()[0], Term::Dice { count: 1, sides: 6, .. }));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(DiceExpression::parse("  "), Err(DiceError::NoDice));
        assert_eq!(DiceExpression::parse("1d0"), Err(DiceError::InvalidDieSize(0)));
        assert!(matches!(DiceExpression::parse("0d6"), Err(DiceError::ZeroCount(_))));
        assert!(matches!(DiceExpression::parse("1d6+LCK"), Err(DiceError::UnknownToken(_))));
        assert!(matches!(DiceExpression::parse("1d6+"), Err(DiceError::DanglingOperator(_))));
        assert!(matches!(DiceExpression::parse("1d6++2"), Err(DiceError::DanglingOperator(_))));
        assert!(matches!(DiceExpression::parse("1dx"), Err(DiceError::InvalidNotation(_))));
        assert_eq!(DiceExpression::parse("5000d6"), Err(DiceError::TooManyDice(5000)));
    }

    #[test]
    fn test_roll_range() {
        let expr = DiceExpression::parse("3d6+2").unwrap();
        let mut dice = SeededDice::from_seed(7);
        for _ in 0..200 {
            let result = expr.evaluate(&mut dice, &());
            assert!(result.total >= 5 && result.total <= 20);
        }
        assert_eq!(expr.bounds(&()), (5, 20));
    }

    #[test]
    fn test_seeded_rolls_reproducible() {
        let expr = DiceExpression::parse("4d10-STR").unwrap();
        let scores = AbilityScores::new(14, 10, 10, 10, 10, 10);
        let a: Vec<i32> = {
            let mut dice = SeededDice::from_seed(42);
            (0..10).map(|_| expr.evaluate(&mut dice, &scores).total).collect()
        };
        let b: Vec<i32> = {
            let mut dice = SeededDice::from_seed(42);
            (0..10).map(|_| expr.evaluate(&mut dice, &scores).total).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_ability_resolution() {
        let scores = AbilityScores::new(16, 12, 10, 10, 10, 10);
        let mut dice = ScriptedDice::new([5]);
        let result = evaluate("1d8+STR+1", &mut dice, &scores).unwrap();
        assert_eq!(result.total, 5 + 3 + 1);
        assert_eq!(result.ability_bonuses[0].value, 3);
        assert_eq!(result.modifier, 1);
    }

    #[test]
    fn test_critical_doubles_dice_only() {
        let scores = AbilityScores::new(16, 10, 10, 10, 10, 10);
        let expr = DiceExpression::parse("1d8+STR+2").unwrap();
        let mut dice = ScriptedDice::new([4, 6]);
        let result = expr.evaluate_critical(&mut dice, &scores);
        assert_eq!(result.rolls(), vec![4, 6]);
        assert_eq!(result.total, 4 + 6 + 3 + 2);
        assert!(result.critical);
    }

    #[test]
    fn test_subtracted_dice() {
        let mut dice = ScriptedDice::new([3, 2]);
        let result = evaluate("1d6-1d4", &mut dice, &()).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.dice_display(), "[3] -[2]");
    }

    #[test]
    fn test_d20_advantage_and_disadvantage() {
        let mut dice = ScriptedDice::new([4, 17, 4, 17, 9]);
        let adv = roll_d20(&mut dice, Advantage::Advantage);
        assert_eq!(adv.kept, 17);
        let dis = roll_d20(&mut dice, Advantage::Disadvantage);
        assert_eq!(dis.kept, 4);
        let normal = roll_d20(&mut dice, Advantage::Normal);
        assert_eq!(normal.rolls, vec![9]);
    }

    #[test]
    fn test_advantage_combine_and_parse() {
        assert_eq!(
            Advantage::Advantage.combine(Advantage::Disadvantage),
            Advantage::Normal
        );
        assert_eq!(Advantage::parse("Disadvantage"), Some(Advantage::Disadvantage));
        assert_eq!(Advantage::parse("sideways"), None);
        assert_eq!(Advantage::from_flag(true), Advantage::Advantage);
    }

    #[test]
    fn test_expression_serde_as_string() {
        let expr: DiceExpression = serde_json::from_str("\"2d6+CON\"").unwrap();
        assert_eq!(serde_json::to_string(&expr).unwrap(), "\"2d6+CON\"");
        assert!(serde_json::from_str::<DiceExpression>("\"2d\"").is_err());
    }

    #[test]
    fn test_expressions_past_integer_range_rejected() {
        assert!(matches!(
            DiceExpression::parse("2147483647+1"),
            Err(DiceError::TooLarge(_))
        ));
        assert!(matches!(
            DiceExpression::parse("-2147483647-2147483647"),
            Err(DiceError::TooLarge(_))
        ));
        // Fits normally but not when a critical doubles the dice
        assert!(matches!(
            DiceExpression::parse("2147000000+1000d1000"),
            Err(DiceError::TooLarge(_))
        ));

        let big = DiceExpression::parse("2147483000+STR").unwrap();
        let result = big.evaluate(&mut ScriptedDice::new([]), &AbilityScores::new(18, 10, 10, 10, 10, 10));
        assert_eq!(result.total, 2147483004);
    }
}
