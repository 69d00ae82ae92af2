use crate::{
    error::Result,
    history::{
        cache::DEFAULT_RECORD_CAPACITY,
        record::{RecordView, RollRecord},
        store::{RecordStore, ReportOptions},
    },
    rules::{
        conditions::TestConditions,
        dice::{DieType, Modifier, RollMode},
        evaluator::{
            self, ModifiedRoll, ModifiedTestedRoll, RollMany, RollManyOptions, TestedRoll,
        },
    },
    statistics::roller::Roller,
    utils,
};

/// A single die that keeps a rolling log of its own results.
#[derive(Debug)]
pub struct Die {
    die_type: DieType,
    roller: Roller,
    history: RecordStore,
}

impl Die {
    pub fn new(die_type: DieType) -> Result<Self> {
        Self::with_roller(die_type, Roller::new(), DEFAULT_RECORD_CAPACITY)
    }

    pub fn with_roller(die_type: DieType, roller: Roller, capacity: usize) -> Result<Self> {
        Ok(Self {
            die_type,
            roller,
            history: RecordStore::new(capacity)?,
        })
    }

    pub fn die_type(&self) -> DieType {
        self.die_type
    }

    pub fn sides(&self) -> u32 {
        self.die_type.sides()
    }

    pub fn roll(&mut self, mode: RollMode) -> Result<u32> {
        let face = evaluator::roll(&mut self.roller, self.die_type, mode)?;
        self.record(RollRecord::plain(face))?;
        Ok(face)
    }

    /// Rolls `count` times; every value is recorded separately.
    pub fn roll_many(&mut self, options: RollManyOptions) -> Result<RollMany> {
        let many = evaluator::roll_many(&mut self.roller, self.die_type, options)?;
        for &face in &many.values {
            self.record(RollRecord::plain(face))?;
        }
        Ok(many)
    }

    pub fn roll_modified(&mut self, modifier: &Modifier, mode: RollMode) -> Result<ModifiedRoll> {
        let roll = evaluator::roll_modified(&mut self.roller, self.die_type, modifier, mode)?;
        self.record(RollRecord::modified(roll.base, roll.modified))?;
        Ok(roll)
    }

    pub fn roll_tested(
        &mut self,
        conditions: &TestConditions,
        mode: RollMode,
    ) -> Result<TestedRoll> {
        let roll = evaluator::roll_tested(&mut self.roller, self.die_type, conditions, mode)?;
        self.record(RollRecord::tested(roll.base, roll.outcome))?;
        Ok(roll)
    }

    pub fn roll_modified_tested(
        &mut self,
        modifier: &Modifier,
        conditions: &TestConditions,
        mode: RollMode,
    ) -> Result<ModifiedTestedRoll> {
        let roll = evaluator::roll_modified_tested(
            &mut self.roller,
            self.die_type,
            modifier,
            conditions,
            mode,
        )?;
        self.record(RollRecord::modified_tested(
            roll.base,
            roll.modified,
            roll.outcome,
        ))?;
        Ok(roll)
    }

    fn record(&mut self, record: RollRecord) -> Result<()> {
        log::info!("{}", utils::log_line(&self.die_type.to_string(), &record));
        self.history.add(record)
    }

    pub fn history(&self) -> &RecordStore {
        &self.history
    }

    pub fn report(&self, options: ReportOptions) -> Result<Vec<RecordView>> {
        self.history.report(options)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
