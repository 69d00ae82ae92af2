//! Turning face draws into rolls, modified values and outcomes.

use serde::{Deserialize, Serialize};

use crate::{
    error::{DiceError, Result},
    history::record::RollRecord,
    rules::{
        conditions::{ConditionSpec, Outcome, TestConditions},
        dice::{DieType, Modifier, RollMode},
    },
    statistics::roller::FaceGenerator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedRoll {
    pub base: u32,
    pub modified: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestedRoll {
    pub base: u32,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedTestedRoll {
    pub base: u32,
    pub modified: i32,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollManyOptions {
    pub count: u32,
    pub mode: RollMode,
}

impl Default for RollManyOptions {
    fn default() -> Self {
        Self {
            count: 1,
            mode: RollMode::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollMany {
    pub values: Vec<u32>,
    pub sum: i64,
}

pub fn roll_plain<G>(rng: &mut G, die: DieType) -> Result<u32>
where
    G: FaceGenerator + ?Sized,
{
    rng.generate(die.sides())
}

/// Advantage and disadvantage always draw twice, even when the first draw
/// already decides the result.
pub fn roll_with_mode<G>(rng: &mut G, die: DieType, mode: RollMode) -> Result<u32>
where
    G: FaceGenerator + ?Sized,
{
    match mode {
        RollMode::Plain => roll_plain(rng, die),
        RollMode::Advantage => {
            let first = roll_plain(rng, die)?;
            let second = roll_plain(rng, die)?;
            Ok(first.max(second))
        }
        RollMode::Disadvantage => {
            let first = roll_plain(rng, die)?;
            let second = roll_plain(rng, die)?;
            Ok(first.min(second))
        }
    }
}

pub fn roll<G>(rng: &mut G, die: DieType, mode: RollMode) -> Result<u32>
where
    G: FaceGenerator + ?Sized,
{
    roll_with_mode(rng, die, mode)
}

pub fn roll_many<G>(rng: &mut G, die: DieType, options: RollManyOptions) -> Result<RollMany>
where
    G: FaceGenerator + ?Sized,
{
    if options.count < 1 {
        return Err(DiceError::invalid_argument("must roll at least one die"));
    }
    let values = (0..options.count)
        .map(|_| roll_with_mode(rng, die, options.mode))
        .collect::<Result<Vec<_>>>()?;
    let sum = values.iter().map(|&v| i64::from(v)).sum();
    Ok(RollMany { values, sum })
}

pub fn roll_modified<G>(
    rng: &mut G,
    die: DieType,
    modifier: &Modifier,
    mode: RollMode,
) -> Result<ModifiedRoll>
where
    G: FaceGenerator + ?Sized,
{
    let base = roll_with_mode(rng, die, mode)?;
    let modified = modifier.apply(face_value(base)?)?;
    Ok(ModifiedRoll { base, modified })
}

pub fn classify(value: i32, conditions: &TestConditions) -> Outcome {
    conditions.classify(value)
}

/// Classifies against conditions still in their field-presence form.
pub fn classify_spec(value: i32, spec: &ConditionSpec, die: DieType) -> Result<Outcome> {
    Ok(spec.resolve(die)?.classify(value))
}

pub fn roll_tested<G>(
    rng: &mut G,
    die: DieType,
    conditions: &TestConditions,
    mode: RollMode,
) -> Result<TestedRoll>
where
    G: FaceGenerator + ?Sized,
{
    let base = roll_with_mode(rng, die, mode)?;
    let outcome = classify(face_value(base)?, conditions);
    Ok(TestedRoll { base, outcome })
}

pub fn roll_modified_tested<G>(
    rng: &mut G,
    die: DieType,
    modifier: &Modifier,
    conditions: &TestConditions,
    mode: RollMode,
) -> Result<ModifiedTestedRoll>
where
    G: FaceGenerator + ?Sized,
{
    let ModifiedRoll { base, modified } = roll_modified(rng, die, modifier, mode)?;
    let outcome = classify(modified, conditions);
    Ok(ModifiedTestedRoll {
        base,
        modified,
        outcome,
    })
}

/// Rolls and produces a `Plain` or `Modified` record.
pub fn roll_record<G>(
    rng: &mut G,
    die: DieType,
    modifier: Option<&Modifier>,
    mode: RollMode,
) -> Result<RollRecord>
where
    G: FaceGenerator + ?Sized,
{
    match modifier {
        None => Ok(RollRecord::plain(roll_with_mode(rng, die, mode)?)),
        Some(modifier) => {
            let roll = roll_modified(rng, die, modifier, mode)?;
            Ok(RollRecord::modified(roll.base, roll.modified))
        }
    }
}

/// Rolls, classifies and produces a `Tested` or `ModifiedTested` record.
pub fn roll_tested_record<G>(
    rng: &mut G,
    die: DieType,
    conditions: &TestConditions,
    modifier: Option<&Modifier>,
    mode: RollMode,
) -> Result<RollRecord>
where
    G: FaceGenerator + ?Sized,
{
    match modifier {
        None => {
            let roll = roll_tested(rng, die, conditions, mode)?;
            Ok(RollRecord::tested(roll.base, roll.outcome))
        }
        Some(modifier) => {
            let roll = roll_modified_tested(rng, die, modifier, conditions, mode)?;
            Ok(RollRecord::modified_tested(
                roll.base,
                roll.modified,
                roll.outcome,
            ))
        }
    }
}

fn face_value(face: u32) -> Result<i32> {
    i32::try_from(face).map_err(|_| DiceError::invalid_argument(format!("face {face} overflows")))
}
