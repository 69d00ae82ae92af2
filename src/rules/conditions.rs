use std::collections::BTreeSet;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DiceError, Result},
    rules::dice::DieType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[display("success")]
    Success,
    #[display("failure")]
    Failure,
    #[display("critical success")]
    CriticalSuccess,
    #[display("critical failure")]
    CriticalFailure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::CriticalSuccess)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Outcome::CriticalSuccess | Outcome::CriticalFailure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[display("odd")]
    Odd,
    #[display("even")]
    Even,
}

impl Parity {
    pub fn matches(&self, value: i32) -> bool {
        match self {
            Parity::Odd => value.rem_euclid(2) == 1,
            Parity::Even => value.rem_euclid(2) == 0,
        }
    }
}

/// The plain comparison a value is held against once no critical threshold applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    AtLeast(i32),
    AtMost(i32),
    Exact(i32),
    Within { min: i32, max: i32 },
    InList(BTreeSet<i32>),
    Parity(Parity),
}

impl Check {
    fn passes(&self, value: i32) -> bool {
        match self {
            Check::AtLeast(target) => value >= *target,
            Check::AtMost(target) => value <= *target,
            Check::Exact(target) => value == *target,
            Check::Within { min, max } => (*min..=*max).contains(&value),
            Check::InList(values) => values.contains(&value),
            Check::Parity(parity) => parity.matches(value),
        }
    }
}

/// Test conditions validated against one die's face range.
///
/// Construction is the only place a threshold can be rejected; once built,
/// classification never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConditions {
    check: Check,
    critical_success: Option<i32>,
    critical_failure: Option<i32>,
}

impl TestConditions {
    pub fn at_least(die: DieType, target: i32) -> Result<Self> {
        in_range(die, "target", target)?;
        Ok(Self::plain(Check::AtLeast(target)))
    }

    pub fn at_most(die: DieType, target: i32) -> Result<Self> {
        in_range(die, "target", target)?;
        Ok(Self::plain(Check::AtMost(target)))
    }

    pub fn exact(die: DieType, target: i32) -> Result<Self> {
        in_range(die, "target", target)?;
        Ok(Self::plain(Check::Exact(target)))
    }

    pub fn within(die: DieType, min: i32, max: i32) -> Result<Self> {
        in_range(die, "min", min)?;
        in_range(die, "max", max)?;
        if min > max {
            return Err(DiceError::configuration(format!(
                "range minimum {min} is above maximum {max}"
            )));
        }
        Ok(Self::plain(Check::Within { min, max }))
    }

    pub fn in_list(die: DieType, values: &[i32]) -> Result<Self> {
        if values.is_empty() {
            return Err(DiceError::configuration("value list is empty"));
        }
        let mut set = BTreeSet::new();
        for &value in values {
            in_range(die, "listed value", value)?;
            if !set.insert(value) {
                return Err(DiceError::configuration(format!(
                    "value {value} is listed more than once"
                )));
            }
        }
        Ok(Self::plain(Check::InList(set)))
    }

    pub fn parity(parity: Parity) -> Self {
        Self::plain(Check::Parity(parity))
    }

    /// A skill check: success at or above `target`, with optional critical
    /// thresholds satisfying `critical_failure < target <= critical_success`.
    pub fn skill(
        die: DieType,
        target: i32,
        critical_success: Option<i32>,
        critical_failure: Option<i32>,
    ) -> Result<Self> {
        in_range(die, "target", target)?;
        if let Some(cs) = critical_success {
            in_range(die, "critical success", cs)?;
            if cs < target {
                return Err(DiceError::configuration(format!(
                    "critical success {cs} is below target {target}"
                )));
            }
        }
        if let Some(cf) = critical_failure {
            in_range(die, "critical failure", cf)?;
            if cf >= target {
                return Err(DiceError::configuration(format!(
                    "critical failure {cf} is not below target {target}"
                )));
            }
        }
        Ok(Self {
            check: Check::AtLeast(target),
            critical_success,
            critical_failure,
        })
    }

    fn plain(check: Check) -> Self {
        Self {
            check,
            critical_success: None,
            critical_failure: None,
        }
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn critical_success(&self) -> Option<i32> {
        self.critical_success
    }

    pub fn critical_failure(&self) -> Option<i32> {
        self.critical_failure
    }

    /// Classifies `value`: a value list decides alone, then critical
    /// thresholds, then the plain comparison.
    pub fn classify(&self, value: i32) -> Outcome {
        if let Check::InList(values) = &self.check {
            return pass_fail(values.contains(&value));
        }
        if let Some(cs) = self.critical_success
            && value >= cs
        {
            return Outcome::CriticalSuccess;
        }
        if let Some(cf) = self.critical_failure
            && value <= cf
        {
            return Outcome::CriticalFailure;
        }
        pass_fail(self.check.passes(value))
    }
}

fn pass_fail(passed: bool) -> Outcome {
    if passed {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}

fn in_range(die: DieType, what: &str, value: i32) -> Result<()> {
    if die.contains(value) {
        Ok(())
    } else {
        Err(DiceError::configuration(format!(
            "{what} {value} is outside [1, {}] for a {die}",
            die.sides()
        )))
    }
}

/// Test conditions in their field-presence form, as they arrive over JSON.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_most: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parity: Option<Parity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_success: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_failure: Option<i32>,
}

impl ConditionSpec {
    /// Resolves the fields into validated conditions for `die`.
    ///
    /// Exactly one comparison (a value list, a target, `atMost`, `exact`, a
    /// `min`/`max` range or a parity) may be present. Critical thresholds go
    /// with a target; a value list ignores them.
    pub fn resolve(&self, die: DieType) -> Result<TestConditions> {
        let ranged = self.min.is_some() || self.max.is_some();
        let comparisons = [
            self.values.is_some(),
            self.target.is_some(),
            self.at_most.is_some(),
            self.exact.is_some(),
            ranged,
            self.parity.is_some(),
        ];
        if comparisons.iter().filter(|&&present| present).count() > 1 {
            return Err(DiceError::configuration("test conditions carry conflicting comparisons"));
        }

        if let Some(values) = &self.values {
            return TestConditions::in_list(die, values);
        }
        if let Some(target) = self.target {
            return TestConditions::skill(die, target, self.critical_success, self.critical_failure);
        }
        if self.critical_success.is_some() || self.critical_failure.is_some() {
            return Err(DiceError::configuration("critical thresholds need a target"));
        }
        if let Some(target) = self.at_most {
            return TestConditions::at_most(die, target);
        }
        if let Some(target) = self.exact {
            return TestConditions::exact(die, target);
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) => return TestConditions::within(die, min, max),
            (Some(_), None) | (None, Some(_)) => {
                return Err(DiceError::configuration("a range needs both min and max"));
            }
            (None, None) => {}
        }
        if let Some(parity) = self.parity {
            return Ok(TestConditions::parity(parity));
        }
        Err(DiceError::invalid_state("test conditions carry no usable field"))
    }
}

impl From<&TestConditions> for ConditionSpec {
    fn from(conditions: &TestConditions) -> Self {
        let mut spec = ConditionSpec {
            critical_success: conditions.critical_success,
            critical_failure: conditions.critical_failure,
            ..Default::default()
        };
        match &conditions.check {
            Check::AtLeast(target) => spec.target = Some(*target),
            Check::AtMost(target) => spec.at_most = Some(*target),
            Check::Exact(target) => spec.exact = Some(*target),
            Check::Within { min, max } => {
                spec.min = Some(*min);
                spec.max = Some(*max);
            }
            Check::InList(values) => spec.values = Some(values.iter().copied().collect()),
            Check::Parity(parity) => spec.parity = Some(*parity),
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_critical_precedence() {
        let skill = TestConditions::skill(DieType::D6, 4, Some(6), Some(1)).unwrap();
        assert_eq!(skill.classify(6), Outcome::CriticalSuccess);
        assert_eq!(skill.classify(1), Outcome::CriticalFailure);
        assert_eq!(skill.classify(4), Outcome::Success);
        assert_eq!(skill.classify(5), Outcome::Success);
        assert_eq!(skill.classify(2), Outcome::Failure);
        assert_eq!(skill.classify(3), Outcome::Failure);
    }

    #[test]
    fn test_critical_on_target() {
        // critical success may sit exactly on the target
        let skill = TestConditions::skill(DieType::D20, 20, Some(20), None).unwrap();
        assert_eq!(skill.classify(20), Outcome::CriticalSuccess);
        assert_eq!(skill.classify(19), Outcome::Failure);
    }

    #[test]
    fn test_modified_values_beyond_face_range() {
        let skill = TestConditions::skill(DieType::D20, 15, Some(20), Some(1)).unwrap();
        assert_eq!(skill.classify(23), Outcome::CriticalSuccess);
        assert_eq!(skill.classify(-2), Outcome::CriticalFailure);
    }

    #[test]
    fn test_skill_threshold_ordering() {
        let err = TestConditions::skill(DieType::D6, 4, Some(6), Some(4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = TestConditions::skill(DieType::D6, 4, Some(3), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = TestConditions::skill(DieType::D6, 7, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_plain_checks() {
        let d = DieType::D8;
        assert_eq!(TestConditions::at_least(d, 5).unwrap().classify(5), Outcome::Success);
        assert_eq!(TestConditions::at_least(d, 5).unwrap().classify(4), Outcome::Failure);
        assert_eq!(TestConditions::at_most(d, 3).unwrap().classify(3), Outcome::Success);
        assert_eq!(TestConditions::at_most(d, 3).unwrap().classify(4), Outcome::Failure);
        assert_eq!(TestConditions::exact(d, 7).unwrap().classify(7), Outcome::Success);
        assert_eq!(TestConditions::exact(d, 7).unwrap().classify(8), Outcome::Failure);

        let within = TestConditions::within(d, 2, 4).unwrap();
        assert_eq!(within.classify(2), Outcome::Success);
        assert_eq!(within.classify(4), Outcome::Success);
        assert_eq!(within.classify(5), Outcome::Failure);
        assert!(TestConditions::within(d, 5, 2).is_err());

        let odd = TestConditions::parity(Parity::Odd);
        assert_eq!(odd.classify(3), Outcome::Success);
        assert_eq!(odd.classify(-3), Outcome::Success);
        assert_eq!(odd.classify(4), Outcome::Failure);
    }

    #[test]
    fn test_in_list() {
        let list = TestConditions::in_list(DieType::D6, &[2, 4, 6]).unwrap();
        assert_eq!(list.classify(4), Outcome::Success);
        assert_eq!(list.classify(5), Outcome::Failure);

        assert!(TestConditions::in_list(DieType::D6, &[]).is_err());
        assert!(TestConditions::in_list(DieType::D6, &[2, 2]).is_err());
        assert!(TestConditions::in_list(DieType::D6, &[7]).is_err());
    }

    #[test]
    fn test_value_list_ignores_criticals() {
        let spec = ConditionSpec {
            values: Some(vec![1, 6]),
            critical_success: Some(6),
            critical_failure: Some(1),
            ..Default::default()
        };
        let conditions = spec.resolve(DieType::D6).unwrap();
        assert_eq!(conditions.classify(6), Outcome::Success);
        assert_eq!(conditions.classify(1), Outcome::Success);
        assert_eq!(conditions.classify(3), Outcome::Failure);
    }

    #[test]
    fn test_spec_rejects_conflicting_comparisons() {
        let conflicting = [
            r#"{"target": 4, "atMost": 2}"#,
            r#"{"target": 3, "min": 1, "max": 2}"#,
            r#"{"exact": 3, "parity": "odd"}"#,
            r#"{"values": [1, 2], "atMost": 2}"#,
            r#"{"atMost": 2, "min": 1}"#,
        ];
        for json in conflicting {
            let spec: ConditionSpec = serde_json::from_str(json).unwrap();
            let err = spec.resolve(DieType::D6).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{json}");
        }
    }

    #[test]
    fn test_spec_without_fields() {
        let err = ConditionSpec::default().resolve(DieType::D20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_spec_from_json() {
        let spec: ConditionSpec =
            serde_json::from_str(r#"{"target": 4, "criticalSuccess": 6, "criticalFailure": 1}"#)
                .unwrap();
        let conditions = spec.resolve(DieType::D6).unwrap();
        assert_eq!(conditions.classify(6), Outcome::CriticalSuccess);

        let back = ConditionSpec::from(&conditions);
        assert_eq!(back, spec);
    }

    #[test]
    fn test_outcome_serde() {
        assert_eq!(
            serde_json::to_string(&Outcome::CriticalFailure).unwrap(),
            "\"critical_failure\""
        );
    }
}
