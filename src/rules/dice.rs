use std::{fmt, str::FromStr, sync::Arc};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::{DiceError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    #[display("d4")]
    D4,
    #[display("d6")]
    D6,
    #[display("d8")]
    D8,
    #[display("d10")]
    D10,
    #[display("d12")]
    D12,
    #[display("d20")]
    D20,
}

impl DieType {
    pub fn all() -> Vec<DieType> {
        vec![
            DieType::D4,
            DieType::D6,
            DieType::D8,
            DieType::D10,
            DieType::D12,
            DieType::D20,
        ]
    }

    /// The only face-count table in the crate.
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    pub fn from_sides(sides: u32) -> Result<DieType> {
        DieType::all()
            .into_iter()
            .find(|d| d.sides() == sides)
            .ok_or_else(|| DiceError::invalid_argument(format!("no d{sides} in the dice set")))
    }

    pub fn contains(&self, face: i32) -> bool {
        face >= 1 && face <= self.sides() as i32
    }
}

impl FromStr for DieType {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let sides = lower
            .strip_prefix('d')
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| DiceError::invalid_argument(format!("unknown die type {s:?}")))?;
        DieType::from_sides(sides)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    #[display("plain")]
    Plain,
    #[display("advantage")]
    Advantage,
    #[display("disadvantage")]
    Disadvantage,
}

impl FromStr for RollMode {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "normal" => Ok(RollMode::Plain),
            "advantage" | "adv" => Ok(RollMode::Advantage),
            "disadvantage" | "dis" => Ok(RollMode::Disadvantage),
            _ => Err(DiceError::invalid_argument(format!("unknown roll mode {s:?}"))),
        }
    }
}

type ModifierFn = dyn Fn(i32) -> Option<i32> + Send + Sync;

/// A deterministic transform applied to a base roll.
///
/// Modifiers are total functions over `i32`. A fallible one is built with
/// [`Modifier::checked`], which tries it on [`Modifier::SAMPLE_INPUT`] and
/// rejects it up front if that yields no value. The absence of a modifier is
/// [`Modifier::identity`].
#[derive(Clone)]
pub struct Modifier {
    label: String,
    apply: Arc<ModifierFn>,
}

impl Modifier {
    pub const SAMPLE_INPUT: i32 = 1;

    pub fn identity() -> Self {
        Self {
            label: "identity".to_string(),
            apply: Arc::new(|v: i32| Some(v)),
        }
    }

    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(i32) -> i32 + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            apply: Arc::new(move |v| Some(f(v))),
        }
    }

    pub fn checked<F>(label: impl Into<String>, f: F) -> Result<Self>
    where
        F: Fn(i32) -> Option<i32> + Send + Sync + 'static,
    {
        let label = label.into();
        if f(Self::SAMPLE_INPUT).is_none() {
            return Err(DiceError::invalid_argument(format!(
                "modifier {label:?} produced no value for {}",
                Self::SAMPLE_INPUT
            )));
        }
        Ok(Self {
            label,
            apply: Arc::new(f),
        })
    }

    pub fn flat(bonus: i32) -> Self {
        let label = if bonus < 0 {
            format!("{bonus}")
        } else {
            format!("+{bonus}")
        };
        Self {
            label,
            apply: Arc::new(move |v: i32| v.checked_add(bonus)),
        }
    }

    pub fn scale(factor: i32) -> Self {
        Self {
            label: format!("*{factor}"),
            apply: Arc::new(move |v: i32| v.checked_mul(factor)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(&self, value: i32) -> Result<i32> {
        (self.apply)(value).ok_or_else(|| {
            DiceError::invalid_argument(format!(
                "modifier {:?} produced no value for {value}",
                self.label
            ))
        })
    }
}

impl Default for Modifier {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sides() {
        let sides: Vec<u32> = DieType::all().iter().map(|d| d.sides()).collect();
        assert_eq!(sides, vec![4, 6, 8, 10, 12, 20]);
    }

    #[test]
    fn test_parse_die_type() {
        assert_eq!("d20".parse::<DieType>().unwrap(), DieType::D20);
        assert_eq!("D6".parse::<DieType>().unwrap(), DieType::D6);
        assert_eq!(DieType::D10.to_string(), "d10");
        for bad in ["d7", "20", "dx", "", "d100"] {
            let err = bad.parse::<DieType>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{bad}");
        }
    }

    #[test]
    fn test_parse_roll_mode() {
        assert_eq!("adv".parse::<RollMode>().unwrap(), RollMode::Advantage);
        assert_eq!("Disadvantage".parse::<RollMode>().unwrap(), RollMode::Disadvantage);
        assert_eq!("plain".parse::<RollMode>().unwrap(), RollMode::Plain);
        assert!("sideways".parse::<RollMode>().is_err());
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&RollMode::Advantage).unwrap();
        assert_eq!(json, "\"advantage\"");
        let die: DieType = serde_json::from_str("\"d12\"").unwrap();
        assert_eq!(die, DieType::D12);
    }

    #[test]
    fn test_identity_modifier() {
        let m = Modifier::identity();
        for v in [-3, 0, 1, 20] {
            assert_eq!(m.apply(v).unwrap(), v);
        }
    }

    #[test]
    fn test_flat_and_scale() {
        assert_eq!(Modifier::flat(3).apply(4).unwrap(), 7);
        assert_eq!(Modifier::flat(-2).label(), "-2");
        assert_eq!(Modifier::scale(2).apply(6).unwrap(), 12);
        let err = Modifier::flat(1).apply(i32::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_checked_modifier_rejects_empty_output() {
        let err = Modifier::checked("never", |_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let halve = Modifier::checked("halve", |v| Some(v / 2)).unwrap();
        assert_eq!(halve.apply(9).unwrap(), 4);
    }
}
