use std::path::PathBuf;

use clap::Parser;
use polyroll::{prelude::*, utils};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dice expression, e.g. `d20`, `3d6+2` or `d20+5 [adv]`; the bonus applies to each die
    #[arg(default_value = "d20")]
    roll: String,

    /// Modifier expression applied instead of the expression's flat bonus, e.g. `*2`
    #[arg(short, long, allow_hyphen_values = true)]
    modifier: Option<String>,

    /// Succeed at or above this value
    #[arg(short, long)]
    target: Option<i32>,

    /// Critical success at or above this value (needs --target)
    #[arg(long)]
    critical_success: Option<i32>,

    /// Critical failure at or below this value (needs --target)
    #[arg(long)]
    critical_failure: Option<i32>,

    /// Succeed at or below this value
    #[arg(long)]
    at_most: Option<i32>,

    /// Succeed only on exactly this value
    #[arg(long)]
    exact: Option<i32>,

    /// Lower bound of a succeeding range
    #[arg(long, requires = "max")]
    min: Option<i32>,

    /// Upper bound of a succeeding range
    #[arg(long, requires = "min")]
    max: Option<i32>,

    /// Succeed only on one of these values
    #[arg(long, value_delimiter = ',')]
    values: Option<Vec<i32>>,

    /// Succeed on odd or even values
    #[arg(long, value_parser = ["odd", "even"])]
    parity: Option<String>,

    /// Number of times to roll the expression
    #[arg(short, long, default_value_t = 1)]
    repeat: u32,

    /// History key to record under
    #[arg(short, long, default_value = "default")]
    key: String,

    /// History configuration JSON file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long, default_value = None)]
    seed: Option<u64>,

    /// Only report this many of the most recent records
    #[arg(short, long)]
    limit: Option<usize>,

    /// Include timestamps in the report
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn condition_spec(&self) -> Option<ConditionSpec> {
        let parity = self.parity.as_deref().map(|p| match p {
            "odd" => Parity::Odd,
            _ => Parity::Even,
        });
        let spec = ConditionSpec {
            values: self.values.clone(),
            target: self.target,
            at_most: self.at_most,
            exact: self.exact,
            min: self.min,
            max: self.max,
            parity,
            critical_success: self.critical_success,
            critical_failure: self.critical_failure,
        };
        (spec != ConditionSpec::default()).then_some(spec)
    }
}

#[derive(Debug, Serialize)]
struct Output {
    roll: RollRequest,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sums: Vec<i64>,
    history: HistoryReport,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .format_timestamp_secs()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    log::debug!("Starting with args: {:?}", args);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading history configuration from {}", path.display());
            let file = std::fs::File::open(path)?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader)?
        }
        None => HistoryConfig::default(),
    };
    let mut history = HistoryCache::from_config(&config)?;
    history.set_active_key(&args.key)?;

    let mut roller = match args.seed {
        Some(seed) => Roller::from_seed(seed),
        None => Roller::new(),
    };

    let request = parse_roll(&args.roll)?;
    let modifier = match &args.modifier {
        Some(expr) => Some(parse_modifier(expr)?),
        None => request.modifier(),
    };
    let conditions = args
        .condition_spec()
        .map(|spec| spec.resolve(request.die))
        .transpose()?;

    let mut sums = Vec::new();
    for _ in 0..args.repeat {
        let mut sum = 0i64;
        for _ in 0..request.count {
            let record = match &conditions {
                Some(conditions) => roll_tested_record(
                    &mut roller,
                    request.die,
                    conditions,
                    modifier.as_ref(),
                    request.mode,
                )?,
                None => roll_record(&mut roller, request.die, modifier.as_ref(), request.mode)?,
            };
            sum += i64::from(record.modified_value().unwrap_or(record.face() as i32));
            log::info!("{}", utils::log_line(&args.key, &record));
            history.add(record)?;
        }
        if request.count > 1 {
            log::info!("{} total: {}", args.roll, sum);
            sums.push(sum);
        }
    }

    let options = ReportOptions {
        limit: args.limit,
        verbose: args.verbose,
    };
    let output = Output {
        roll: request,
        sums,
        history: history.report(options)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
