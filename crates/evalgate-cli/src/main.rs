use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evalgate_core::{
    default_evaluators, load_dataset, load_outputs, load_prompts, load_regression_config,
    load_run_config, with_run, Eval, GeneratedOutput, ModelClient, NoopTracker, OllamaClient,
    RegressionDetector, RegressionStatus, Tracker,
};
use evalgate_store::SqliteStore;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "evalgate", about = "Score LLM outputs offline and gate on regressions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate model outputs for every dataset sample via Ollama
    Infer(InferArgs),
    /// Score generated outputs, aggregate, and apply the regression policy
    Run(RunArgs),
}

#[derive(Debug, Clone, Parser)]
struct InferArgs {
    /// Run config JSON: { "prompt_version", "model", "temperature"?, "top_p"? }
    #[arg(long)]
    config: PathBuf,

    /// Golden dataset JSON: { "samples": [...] }
    #[arg(long)]
    dataset: PathBuf,

    /// Directory holding prompts/<version>/{system,user}.txt
    #[arg(long, default_value = "prompts")]
    prompts: PathBuf,

    /// Where to write the generated-outputs JSON array
    #[arg(long)]
    out: PathBuf,

    /// Override the Ollama generate endpoint
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Parser)]
struct RunArgs {
    /// Golden dataset JSON: { "samples": [...] }
    #[arg(long)]
    dataset: PathBuf,

    /// Generated outputs JSON array: [{ "id", "output" }, ...]
    #[arg(long)]
    outputs: PathBuf,

    /// Regression policy JSON: { metric: { "min_score"?, "max_delta"? } }
    #[arg(long)]
    regression_config: PathBuf,

    /// Baseline aggregates JSON from a prior accepted run; when absent the
    /// candidate doubles as its own baseline (control comparison)
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Where to write the per-sample results JSON
    #[arg(long)]
    results_out: PathBuf,

    /// SQLite tracking database; omit to skip tracking
    #[arg(long)]
    store: Option<PathBuf>,

    /// Tracked run name
    #[arg(long, default_value = "regression_check")]
    run_name: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => {
            infer(args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run(args).await,
    }
}

async fn infer(args: InferArgs) -> Result<()> {
    let config = load_run_config(&args.config).await?;
    let dataset = load_dataset(&args.dataset).await?;
    let (system_prompt, user_template) = load_prompts(&args.prompts, &config.prompt_version).await?;

    let mut client = OllamaClient::new(&config.model, config.temperature, config.top_p)?;
    if let Some(url) = args.base_url {
        client = client.with_base_url(url);
    }

    let mut outputs = Vec::with_capacity(dataset.len());
    for sample in &dataset {
        let user_prompt = user_template.replace("{{input}}", &sample.input);
        let output = client.generate(&system_prompt, &user_prompt).await?;
        outputs.push(GeneratedOutput {
            id: sample.id.clone(),
            input: Some(sample.input.clone()),
            output: Value::String(output),
        });
    }

    write_json(&args.out, &serde_json::to_string_pretty(&outputs)?).await?;
    println!("Saved {} outputs to {}", outputs.len(), args.out.display());
    Ok(())
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    // Load everything up front: a missing or malformed file aborts the run
    // before any results are written.
    let dataset = load_dataset(&args.dataset).await?;
    let outputs = load_outputs(&args.outputs).await?;
    let policy = load_regression_config(&args.regression_config).await?;
    let baseline = match &args.baseline {
        Some(path) => Some(evalgate_core::load_baseline(path).await?),
        None => None,
    };

    let report = Eval::builder()
        .dataset(dataset)
        .outputs(outputs)
        .evaluators(default_evaluators())
        .build()?
        .run()?;

    let baseline = baseline.unwrap_or_else(|| report.aggregates.clone());
    let regression = RegressionDetector::new(policy).compare(&baseline, &report.aggregates);

    write_json(&args.results_out, &serde_json::to_string_pretty(&report.records)?).await?;

    let params = BTreeMap::from([
        ("dataset".to_string(), args.dataset.display().to_string()),
        ("outputs".to_string(), args.outputs.display().to_string()),
        ("regression_status".to_string(), regression.status.to_string()),
    ]);

    let mut store;
    let mut noop = NoopTracker;
    let tracker: &mut dyn Tracker = match &args.store {
        Some(db) => {
            store = SqliteStore::open(db)
                .with_context(|| format!("Failed to open tracking store {}", db.display()))?;
            &mut store
        }
        None => &mut noop,
    };
    with_run(tracker, &args.run_name, |t| {
        t.log_params(&params)?;
        t.log_metrics(&report.aggregates)?;
        t.log_artifact(&args.results_out)
    })?;

    println!("{}", report.summary_table());
    println!("Regression status: {}", regression.status);
    for detail in &regression.details {
        println!("⚠ {detail}");
    }

    // A FAIL verdict is a normal outcome; artifacts are already persisted.
    // The non-zero exit is what CI gates on.
    Ok(match regression.status {
        RegressionStatus::Pass => ExitCode::SUCCESS,
        RegressionStatus::Fail => ExitCode::FAILURE,
    })
}

async fn write_json(path: &PathBuf, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
