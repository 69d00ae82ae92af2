pub mod die;
pub mod error;
pub mod history;
pub mod roll_parser;
pub mod rules;
pub mod statistics;
pub mod utils;

pub mod prelude {
    pub use crate::{
        die::Die,
        error::{DiceError, ErrorKind, Result},
        history::{
            cache::{HistoryCache, HistoryCacheBuilder, HistoryConfig, HistoryReport},
            record::{RecordView, RollRecord, StrippedRecord},
            store::{RecordStore, ReportOptions},
        },
        roll_parser::{RollRequest, parse_modifier, parse_roll},
        rules::{
            conditions::{ConditionSpec, Outcome, Parity, TestConditions},
            dice::{DieType, Modifier, RollMode},
            evaluator::{
                ModifiedRoll, ModifiedTestedRoll, RollMany, RollManyOptions, TestedRoll, classify,
                roll, roll_many, roll_modified, roll_modified_tested, roll_record, roll_tested,
                roll_tested_record,
            },
        },
        statistics::{
            fairness::FaceTally,
            roller::{FaceGenerator, Roller},
        },
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_demo() -> anyhow::Result<()> {
        let mut roller = Roller::from_seed(1234);
        let mut history = HistoryCache::builder()
            .max_keys(2)
            .per_key_capacity(3)
            .build()?;

        let request = parse_roll("d20+5 [adv]")?;
        let attack = ConditionSpec {
            target: Some(12),
            critical_success: Some(20),
            critical_failure: Some(1),
            ..Default::default()
        }
        .resolve(request.die)?;

        history.set_active_key("hero")?;
        for _ in 0..5 {
            let record = roll_tested_record(
                &mut roller,
                request.die,
                &attack,
                request.modifier().as_ref(),
                request.mode,
            )?;
            assert!(record.is_modified() && record.is_tested());
            history.add(record)?;
        }

        history.set_active_key("goblin")?;
        let saves = TestConditions::at_least(DieType::D20, 10)?;
        for _ in 0..2 {
            history.add(roll_tested_record(
                &mut roller,
                DieType::D20,
                &saves,
                None,
                RollMode::Disadvantage,
            )?)?;
        }

        history.set_active_key("dragon")?;
        history.add(roll_record(&mut roller, DieType::D12, None, RollMode::Plain)?)?;

        let report = history.report(ReportOptions::verbose())?;
        assert!(!report.contains_key("hero"));
        assert_eq!(report.get("goblin").map(Vec::len), Some(2));
        assert_eq!(report.get("dragon").map(Vec::len), Some(1));

        let json = serde_json::to_value(&report)?;
        assert!(json["goblin"][0]["timestamp"].is_string());
        let brief = serde_json::to_value(history.report(ReportOptions::default())?)?;
        assert!(brief["goblin"][0].get("timestamp").is_none());
        assert!(brief["goblin"][0]["outcome"].is_string());

        Ok(())
    }
}
