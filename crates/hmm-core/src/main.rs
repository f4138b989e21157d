//! hmm - discrete hidden Markov model toolkit
//!
//! Command-line front end over `hmm_core`:
//! - Sequence likelihood, posteriors and Viterbi decoding
//! - Baum-Welch re-estimation (one step or a full training run)
//! - Model initialization and sampling
//!
//! stdout carries the command payload; logs go to stderr.

use clap::{Args, Parser, Subcommand};
use hmm_common::{OutputFormat, SCHEMA_VERSION};
use hmm_core::config::{load_config, ConfigOptions};
use hmm_core::exit_codes::ExitCode;
use hmm_core::inference::{train, Hmm, StopReason};
use hmm_core::log_event;
use hmm_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, Stage,
};
use hmm_core::store;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

/// Discrete hidden Markov models: evaluate, decode and train
#[derive(Parser)]
#[command(name = "hmm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Training settings file (overrides HMM_CONFIG_DIR and the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Probability of an emission sequence under a model
    Evaluate(InputArgs),

    /// Most probable hidden state path (Viterbi)
    Decode(DecodeArgs),

    /// Posterior state probabilities at every time step
    Posteriors(PosteriorsArgs),

    /// Apply one Baum-Welch re-estimation step
    Improve(ImproveArgs),

    /// Re-estimate until the log-likelihood converges
    Train(TrainArgs),

    /// Draw a hidden path and emissions from a model
    Sample(SampleArgs),

    /// Write a uniform or random starting model
    Init(InitArgs),

    /// Validate settings, a model and optionally a sequence
    Check(CheckArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct InputArgs {
    /// Model directory (initial.txt, transition.txt, emission.txt)
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Emission sequence file
    #[arg(long, short = 's')]
    sequence: PathBuf,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also write the decoded path as a sequence file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PosteriorsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also write the T x N posterior matrix as a container file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ImproveArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory for the re-estimated model
    #[arg(long, short = 'o')]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory for the trained model
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Override max_iterations from the settings file
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Override tolerance from the settings file
    #[arg(long)]
    tolerance: Option<f64>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Model directory
    #[arg(long, short = 'm')]
    model: PathBuf,

    /// Number of steps to draw
    #[arg(long, short = 'n')]
    length: usize,

    /// Seed for reproducible draws
    #[arg(long)]
    seed: Option<u64>,

    /// Write the emissions as a sequence file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Write the hidden states as a sequence file
    #[arg(long)]
    states_output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Number of hidden states
    #[arg(long)]
    states: usize,

    /// Size of the emission alphabet
    #[arg(long)]
    emissions: usize,

    /// Draw random rows from this seed instead of uniform ones
    #[arg(long)]
    seed: Option<u64>,

    /// Model directory to write
    #[arg(long, short = 'o')]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Model directory to validate
    #[arg(long, short = 'm')]
    model: Option<PathBuf>,

    /// Sequence to validate against the model
    #[arg(long, short = 's', requires = "model")]
    sequence: Option<PathBuf>,
}

/// Per-invocation state shared by every command.
struct Run<'a> {
    global: &'a GlobalOpts,
    ctx: LogContext,
}

type CommandResult = hmm_common::Result<ExitCode>;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(cli.global.verbose, cli.global.quiet);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    let span = tracing::info_span!("run", run_id = %ctx.run_id);
    let _guard = span.enter();

    let run = Run {
        global: &cli.global,
        ctx,
    };
    log_event!(
        run.ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "hmm run started",
        version = env!("CARGO_PKG_VERSION")
    );

    let result = match &cli.command {
        Commands::Evaluate(args) => run_evaluate(&run, args),
        Commands::Decode(args) => run_decode(&run, args),
        Commands::Posteriors(args) => run_posteriors(&run, args),
        Commands::Improve(args) => run_improve(&run, args),
        Commands::Train(args) => run_train(&run, args),
        Commands::Sample(args) => run_sample(&run, args),
        Commands::Init(args) => run_init(&run, args),
        Commands::Check(args) => run_check(&run, args),
        Commands::Version => {
            print_version(&cli.global);
            Ok(ExitCode::Clean)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => output_error(&run, &err, log_config.format),
    };

    log_event!(
        run.ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Write,
        "hmm run finished",
        exit_code = exit_code.as_i32() as i64
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Loading helpers
// ============================================================================

fn load_model(run: &Run, dir: &Path) -> hmm_common::Result<Hmm> {
    let hmm = store::load_model(dir)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::MODEL_LOADED,
        Stage::Load,
        "model loaded",
        path = tracing::field::display(dir.display()),
        num_states = hmm.num_states() as u64,
        num_emissions = hmm.num_emissions() as u64
    );
    Ok(hmm)
}

fn load_sequence(run: &Run, path: &Path) -> hmm_common::Result<Vec<usize>> {
    let sequence = store::load_sequence(path)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::SEQUENCE_LOADED,
        Stage::Load,
        "sequence loaded",
        path = tracing::field::display(path.display()),
        length = sequence.len() as u64
    );
    Ok(sequence)
}

fn load_input(run: &Run, args: &InputArgs) -> hmm_common::Result<(Hmm, Vec<usize>)> {
    let hmm = load_model(run, &args.model)?;
    let sequence = load_sequence(run, &args.sequence)?;
    Ok((hmm, sequence))
}

fn save_model(run: &Run, dir: &Path, hmm: &Hmm) -> hmm_common::Result<()> {
    store::save_model(dir, hmm)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::MODEL_WRITTEN,
        Stage::Write,
        "model written",
        path = tracing::field::display(dir.display())
    );
    Ok(())
}

fn save_sequence(run: &Run, path: &Path, sequence: &[usize]) -> hmm_common::Result<()> {
    store::save_sequence(path, sequence)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::SEQUENCE_WRITTEN,
        Stage::Write,
        "sequence written",
        path = tracing::field::display(path.display()),
        length = sequence.len() as u64
    );
    Ok(())
}

fn model_json(hmm: &Hmm) -> serde_json::Value {
    serde_json::json!({
        "num_states": hmm.num_states(),
        "num_emissions": hmm.num_emissions(),
        "initial_distribution": hmm.initial_distribution(),
        "transition_probabilities": hmm.transition_probabilities(),
        "emission_probabilities": hmm.emission_probabilities(),
    })
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_evaluate(run: &Run, args: &InputArgs) -> CommandResult {
    let (hmm, sequence) = load_input(run, args)?;

    let likelihood = hmm.emissions_probability(&sequence)?;
    let log_likelihood = hmm.log_emissions_probability(&sequence)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::EVALUATE_FINISHED,
        Stage::Evaluate,
        "sequence evaluated",
        log_likelihood = log_likelihood
    );

    let body = serde_json::json!({
        "sequence_length": sequence.len(),
        "likelihood": likelihood,
        "log_likelihood": log_likelihood,
    });
    let summary = format!(
        "T={} P={:e} logP={:.6}",
        sequence.len(),
        likelihood,
        log_likelihood
    );
    emit(run, "evaluate", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_decode(run: &Run, args: &DecodeArgs) -> CommandResult {
    let (hmm, sequence) = load_input(run, &args.input)?;

    let states = hmm.most_probable_states(&sequence)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::DECODE_FINISHED,
        Stage::Decode,
        "sequence decoded",
        length = states.len() as u64
    );
    if let Some(path) = &args.output {
        save_sequence(run, path, &states)?;
    }

    let summary = states
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let body = serde_json::json!({
        "sequence_length": sequence.len(),
        "states": states,
    });
    emit(run, "decode", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_posteriors(run: &Run, args: &PosteriorsArgs) -> CommandResult {
    let (hmm, sequence) = load_input(run, &args.input)?;

    let posteriors = hmm.state_posteriors(&sequence)?;
    log_event!(
        run.ctx,
        INFO,
        event_names::EVALUATE_FINISHED,
        Stage::Evaluate,
        "posteriors computed",
        length = posteriors.len() as u64
    );
    if let Some(path) = &args.output {
        let text = hmm_math::matrix_to_text(&posteriors)?;
        std::fs::write(path, text)?;
    }

    // Most likely state per step, which can differ from the Viterbi path.
    let marginal_states: Vec<usize> = posteriors
        .iter()
        .map(|row| hmm_math::argmax(row).unwrap_or(0))
        .collect();
    let summary = format!("T={} N={}", posteriors.len(), hmm.num_states());
    let body = serde_json::json!({
        "sequence_length": sequence.len(),
        "posteriors": posteriors,
        "marginal_states": marginal_states,
    });
    emit(run, "posteriors", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_improve(run: &Run, args: &ImproveArgs) -> CommandResult {
    let (hmm, sequence) = load_input(run, &args.input)?;

    let before = hmm.log_emissions_probability(&sequence)?;
    let improved = hmm.improve(&sequence)?;
    let after = improved.log_emissions_probability(&sequence)?;
    save_model(run, &args.output, &improved)?;

    let summary = format!("logP {:.6} -> {:.6}", before, after);
    let body = serde_json::json!({
        "log_likelihood_before": before,
        "log_likelihood_after": after,
        "output": args.output,
        "model": model_json(&improved),
    });
    emit(run, "improve", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_train(run: &Run, args: &TrainArgs) -> CommandResult {
    let config = load_config(&ConfigOptions {
        config_dir: None,
        training_path: run.global.config.clone(),
    })?;
    match &config.training_path {
        Some(path) => log_event!(
            run.ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "training settings loaded",
            path = tracing::field::display(path.display())
        ),
        None => log_event!(
            run.ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no training settings file, using defaults"
        ),
    }

    let mut settings = config.training.clone();
    if let Some(max_iterations) = args.max_iterations {
        settings.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        settings.tolerance = tolerance;
    }
    hmm_core::config::validate_training(&settings)
        .map_err(|e| hmm_common::Error::InvalidSettings(e.to_string()))?;

    let (hmm, sequence) = load_input(run, &args.input)?;
    let report = {
        let span = tracing::info_span!("train", stage = %Stage::Train);
        let _guard = span.enter();
        train(&hmm, &sequence, &settings.train_options())?
    };
    save_model(run, &args.output, &report.model)?;

    let summary = format!(
        "{} after {} iteration(s): logP {:.6} -> {:.6}",
        match report.stop_reason {
            StopReason::Converged => "converged",
            StopReason::BudgetExhausted => "not converged",
            StopReason::SequenceImpossible => "stopped (sequence impossible under next model)",
        },
        report.iterations,
        report.initial_log_likelihood,
        report.final_log_likelihood
    );
    let body = serde_json::json!({
        "converged": report.converged,
        "stop_reason": report.stop_reason,
        "iterations": report.iterations,
        "initial_log_likelihood": report.initial_log_likelihood,
        "final_log_likelihood": report.final_log_likelihood,
        "history": report.history,
        "settings": settings,
        "config": config.snapshot(),
        "output": args.output,
        "model": model_json(&report.model),
    });
    emit(run, "train", body, &summary);

    Ok(if report.converged {
        ExitCode::Clean
    } else {
        ExitCode::NotConverged
    })
}

fn run_sample(run: &Run, args: &SampleArgs) -> CommandResult {
    let hmm = load_model(run, &args.model)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sample = hmm.sample(args.length, &mut rng)?;

    if let Some(path) = &args.output {
        save_sequence(run, path, &sample.emissions)?;
    }
    if let Some(path) = &args.states_output {
        save_sequence(run, path, &sample.states)?;
    }

    let summary = format!("drew {} step(s)", sample.emissions.len());
    let body = serde_json::json!({
        "length": sample.emissions.len(),
        "seed": args.seed,
        "states": sample.states,
        "emissions": sample.emissions,
    });
    emit(run, "sample", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_init(run: &Run, args: &InitArgs) -> CommandResult {
    let hmm = match args.seed {
        Some(seed) => Hmm::random(args.states, args.emissions, &mut StdRng::seed_from_u64(seed))?,
        None => Hmm::uniform(args.states, args.emissions)?,
    };
    save_model(run, &args.output, &hmm)?;

    let kind = if args.seed.is_some() {
        "random"
    } else {
        "uniform"
    };
    let summary = format!(
        "{} model N={} K={} -> {}",
        kind,
        hmm.num_states(),
        hmm.num_emissions(),
        args.output.display()
    );
    let body = serde_json::json!({
        "kind": kind,
        "seed": args.seed,
        "output": args.output,
        "model": model_json(&hmm),
    });
    emit(run, "init", body, &summary);
    Ok(ExitCode::Clean)
}

fn run_check(run: &Run, args: &CheckArgs) -> CommandResult {
    let mut checks: Vec<serde_json::Value> = Vec::new();
    let mut first_error: Option<hmm_common::Error> = None;

    match load_config(&ConfigOptions {
        config_dir: None,
        training_path: run.global.config.clone(),
    }) {
        Ok(config) => {
            let snapshot = config.snapshot();
            checks.push(serde_json::json!({
                "check": "config",
                "status": "ok",
                "source": snapshot.training_path.as_ref().map(|p| p.display().to_string()),
                "using_defaults": snapshot.training_path.is_none(),
                "schema_version": snapshot.schema_version,
            }));
        }
        Err(e) => {
            let err = hmm_common::Error::from(e);
            checks.push(check_failure("config", &err));
            first_error.get_or_insert(err);
        }
    }

    if let Some(dir) = &args.model {
        match load_model(run, dir) {
            Ok(hmm) => {
                checks.push(serde_json::json!({
                    "check": "model",
                    "status": "ok",
                    "num_states": hmm.num_states(),
                    "num_emissions": hmm.num_emissions(),
                }));
                if let Some(path) = &args.sequence {
                    let result = load_sequence(run, path).and_then(|sequence| {
                        hmm.log_emissions_probability(&sequence)
                            .map(|ll| (sequence.len(), ll))
                            .map_err(hmm_common::Error::from)
                    });
                    match result {
                        Ok((length, log_likelihood)) => checks.push(serde_json::json!({
                            "check": "sequence",
                            "status": "ok",
                            "length": length,
                            "log_likelihood": log_likelihood,
                        })),
                        Err(err) => {
                            checks.push(check_failure("sequence", &err));
                            first_error.get_or_insert(err);
                        }
                    }
                }
            }
            Err(err) => {
                checks.push(check_failure("model", &err));
                first_error.get_or_insert(err);
            }
        }
    }

    let all_ok = first_error.is_none();
    let failed = checks.iter().filter(|c| c["status"] != "ok").count();
    let summary = if all_ok {
        format!("OK ({} check(s))", checks.len())
    } else {
        format!("FAILED ({} of {} check(s))", failed, checks.len())
    };
    let body = serde_json::json!({
        "status": if all_ok { "ok" } else { "error" },
        "checks": checks,
    });
    emit(run, "check", body, &summary);

    Ok(match &first_error {
        None => ExitCode::Clean,
        Some(err) => ExitCode::from(err),
    })
}

fn check_failure(check: &str, err: &hmm_common::Error) -> serde_json::Value {
    serde_json::json!({
        "check": check,
        "status": "error",
        "error": err.to_json(),
    })
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "hmm_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => {
            println!("{}", to_pretty(&version_info));
        }
        OutputFormat::Exitcode => {}
        _ => {
            println!("hmm {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Write a command payload to stdout in the requested format.
fn emit(run: &Run, command: &str, body: serde_json::Value, summary: &str) {
    match run.global.format {
        OutputFormat::Json => {
            let mut response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run.ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": command,
            });
            if let (Some(out), serde_json::Value::Object(fields)) = (response.as_object_mut(), body)
            {
                out.extend(fields);
            }
            println!("{}", to_pretty(&response));
        }
        OutputFormat::Summary => {
            println!("[{}] {}: {}", run.ctx.run_id, command, summary);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# hmm {}", command);
            println!();
            if let serde_json::Value::Object(fields) = body {
                for (key, value) in fields {
                    match value {
                        serde_json::Value::String(s) => println!("- **{}**: {}", key, s),
                        other => println!("- **{}**: `{}`", key, other),
                    }
                }
            }
            println!();
            println!("Run: {}", run.ctx.run_id);
        }
    }
}

fn output_error(run: &Run, error: &hmm_common::Error, log_format: LogFormat) -> ExitCode {
    let exit_code = ExitCode::from(error);

    if log_format == LogFormat::Jsonl {
        let event = run
            .ctx
            .event(
                hmm_core::logging::Level::Error,
                event_names::INTERNAL_ERROR,
                Stage::Write,
                error.to_string(),
            )
            .with_field("code", error.code())
            .with_field("exit_code", exit_code.code_name());
        eprintln!("{}", event.to_jsonl());
    }

    match run.global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": run.ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": error.to_json(),
            });
            eprintln!("{}", to_pretty(&response));
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error: {}", run.ctx.run_id, error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("# Error");
            eprintln!();
            eprintln!("{}", error);
            eprintln!();
            eprintln!("Hint: {}", error.remediation());
        }
    }

    exit_code
}
