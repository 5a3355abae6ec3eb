use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use weft_batch::{render_table, BatchHarness, FileConfig, RunFactory, Scenario, SequenceSetup};
use weft_kernel::families;
use weft_kernel::{ArgValue, Arguments, ConfigError, EngineConfig};

fn engine_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Base random seed"),
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_parser(value_parser!(u64))
                .help("Step cap per run"),
        )
        .arg(
            Arg::new("stopping-condition")
                .long("stopping-condition")
                .help("Stopping condition name (fully_grouped, single_group, None)"),
        )
}

fn cli() -> Command {
    Command::new("weft")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stochastic codelet engine and batch statistics harness")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Log level (falls back to RUST_LOG, then info)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML file with [engine], [harness] and [[scenario]] sections"),
        )
        .subcommand(engine_args(
            Command::new("single")
                .about("Run one sequence once and print the result")
                .arg(
                    Arg::new("sequence")
                        .long("sequence")
                        .help("Whitespace-separated integers, e.g. \"1 2 3 4\""),
                ),
        ))
        .subcommand(engine_args(
            Command::new("batch")
                .about("Run every scenario many times and compare with the last snapshot")
                .after_help("Exits with status 2 when the configuration or a scenario is rejected.")
                .arg(
                    Arg::new("scenario")
                        .long("scenario")
                        .action(ArgAction::Append)
                        .help("NAME=SEQUENCE; repeat for several scenarios"),
                )
                .arg(
                    Arg::new("iterations")
                        .long("iterations")
                        .value_parser(value_parser!(usize))
                        .help("Runs per scenario"),
                )
                .arg(
                    Arg::new("stats-dir")
                        .long("stats-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot directory"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .action(ArgAction::SetTrue)
                        .help("Run iterations of a scenario in parallel"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the comparison as JSON"),
                ),
        ))
}

fn init_tracing(level: Option<&String>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_file_config(matches: &ArgMatches) -> anyhow::Result<FileConfig> {
    let Some(path) = matches.get_one::<PathBuf>("config") else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    FileConfig::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn apply_engine_overrides(engine: &mut EngineConfig, args: &ArgMatches) {
    if let Some(seed) = args.get_one::<u64>("seed") {
        engine.seed = *seed;
    }
    if let Some(max_steps) = args.get_one::<u64>("max-steps") {
        engine.max_steps = *max_steps;
    }
}

fn sequence_scenario(name: &str, sequence: &str) -> Scenario {
    Scenario::new(
        name,
        Arguments::new().with("sequence", ArgValue::Text(sequence.to_string())),
    )
}

fn run_single(file: FileConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let mut engine = file.engine.clone();
    apply_engine_overrides(&mut engine, args);
    let condition_name = args
        .get_one::<String>("stopping-condition")
        .cloned()
        .or_else(|| file.harness.stopping_condition.clone());

    let scenario = match args.get_one::<String>("sequence") {
        Some(sequence) => sequence_scenario("single", sequence),
        None => file.scenarios().into_iter().next().ok_or_else(|| {
            ConfigError::MissingInputSpecification("pass --sequence or a [[scenario]]".into())
        })?,
    };

    let conditions = families::builtin_stopping_conditions();
    let stopping = conditions.resolve(condition_name.as_deref())?;
    let mut controller = SequenceSetup::default().build(&scenario, engine)?;
    let report = controller.run(stopping.as_deref())?;

    println!("scenario: {}", scenario.name());
    println!("reason:   {}", report.reason);
    println!("steps:    {}", report.steps_executed);
    println!();
    let ws = controller.workspace();
    let values: Vec<String> = ws.items().map(|i| i.value().to_string()).collect();
    println!("items:  {}", values.join(" "));
    for (id, group) in ws.groups() {
        println!("  {id}: {group}");
    }
    println!();
    for (name, value) in controller.metrics() {
        println!("{name:>12}: {value}");
    }
    Ok(())
}

async fn run_batch(file: FileConfig, args: &ArgMatches) -> anyhow::Result<()> {
    let mut engine = file.engine.clone();
    apply_engine_overrides(&mut engine, args);

    let mut config = file.harness.clone();
    if let Some(n) = args.get_one::<usize>("iterations") {
        config.num_iterations = *n;
    }
    if let Some(dir) = args.get_one::<PathBuf>("stats-dir") {
        config.stats_directory = dir.clone();
    }
    if args.get_flag("parallel") {
        config.parallel = true;
    }
    if let Some(name) = args.get_one::<String>("stopping-condition") {
        config.stopping_condition = Some(name.clone());
    }

    let mut scenarios = Vec::new();
    for entry in args.get_many::<String>("scenario").into_iter().flatten() {
        let Some((name, sequence)) = entry.split_once('=') else {
            bail!("--scenario expects NAME=SEQUENCE, got '{entry}'");
        };
        scenarios.push(sequence_scenario(name.trim(), sequence));
    }
    if scenarios.is_empty() {
        scenarios = file.scenarios();
    }

    let factory: Arc<dyn RunFactory> = Arc::new(SequenceSetup::default());
    let harness = BatchHarness::from_registry(
        engine,
        config,
        factory,
        &families::builtin_stopping_conditions(),
    )?;

    let abort = harness.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current iteration");
            abort.abort();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || harness.run(&scenarios))
        .await
        .context("batch task failed")?;
    let report = match outcome {
        Ok(report) => report,
        Err(error) if error.is_fatal() => {
            error!(%error, "batch input rejected");
            std::process::exit(2);
        }
        Err(error) => return Err(error.into()),
    };

    let comparisons = report.comparisons();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&comparisons)?);
    } else {
        print!("{}", render_table(&comparisons));
    }
    info!(
        snapshot = %report.snapshot.display(),
        aborted = report.aborted,
        "batch complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_one::<String>("log-level"));
    let file = load_file_config(&matches)?;

    match matches.subcommand() {
        Some(("single", args)) => run_single(file, args),
        Some(("batch", args)) => run_batch(file, args).await,
        _ => bail!("unknown subcommand"),
    }
}
