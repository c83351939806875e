//! Command-line interface
//!
//! Runs the training pipeline, serves the prediction form, scores a single
//! impression and seeds the document store with synthetic impressions.

use clap::{Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::inference::{sanitize_field_name, AdPredictor};
use crate::ingestion::{generate_impressions, SampleConfig};
use crate::pipeline::{PipelineError, TrainPipeline};
use crate::storage::{DocumentStore, FileModelRegistry, JsonLinesStore, ModelRegistry};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim(&format!("┌{}┐", "─".repeat(W - 1)))); }
fn line_box_bottom() { println!("  {}", dim(&format!("└{}┘", "─".repeat(W - 1)))); }
fn line_box_sep()    { println!("  {}", dim(&format!("├{}┤", "─".repeat(W - 1)))); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len + 2);
    println!("  {}  {}{}{}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = (W - 1).saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}{}{}{}{}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    println!("  {} {}...", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("  {} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "adclick")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ad-click prediction: training pipeline and prediction form")]
#[command(long_about = None)]
pub struct Cli {
    /// Root directory for artifacts, data and the model registry
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full training pipeline once
    Train {
        /// Column schema YAML
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Model hyperparameter YAML
        #[arg(long)]
        model_config: Option<PathBuf>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Score one impression with the production model
    Predict {
        /// Age of the user
        #[arg(short, long)]
        age: String,

        /// Gender level, e.g. "Male"
        #[arg(long)]
        gender: Option<String>,

        /// Device level, e.g. "Mobile"
        #[arg(long)]
        device_type: Option<String>,

        /// Ad position level, e.g. "Top"
        #[arg(long)]
        ad_position: Option<String>,

        /// Browsing history level, e.g. "Social Media"
        #[arg(long)]
        browsing_history: Option<String>,

        /// Time-of-day level, e.g. "Night"
        #[arg(long)]
        time_of_day: Option<String>,
    },

    /// Append synthetic impressions to the raw collection
    SampleData {
        /// Number of records
        #[arg(short = 'n', long, default_value = "1000")]
        records: usize,

        /// Generator seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Probability of flipping a label
        #[arg(long, default_value = "0.05")]
        label_noise: f64,
    },
}

/// Environment config, optionally re-rooted by `--root`
pub fn app_config(root: Option<&PathBuf>) -> AppConfig {
    let config = AppConfig::default();
    match root {
        Some(root) => config.rooted_at(root),
        None => config,
    }
}

/// Indicator fields selecting `level` for each given group
pub fn indicator_fields(age: &str, selections: &[(&str, Option<&str>)]) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("age".to_string(), age.trim().to_string());
    for (column, level) in selections {
        if let Some(level) = level {
            let name = sanitize_field_name(&format!("{}_{}", column, level.trim()));
            fields.insert(name, "1".to_string());
        }
    }
    fields
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    mut app: AppConfig,
    schema: Option<PathBuf>,
    model_config: Option<PathBuf>,
) -> anyhow::Result<()> {
    section("Train");

    if let Some(path) = schema {
        app = app.with_schema_path(path);
    }
    if let Some(path) = model_config {
        app = app.with_model_config_path(path);
    }

    let store: Arc<dyn DocumentStore> = Arc::new(JsonLinesStore::new(&app.data_dir));
    let registry: Arc<dyn ModelRegistry> = Arc::new(FileModelRegistry::new(&app.bucket_dir));

    step_run(&format!("Collection {}", app.collection_name.cyan()));
    let start = Instant::now();
    let pipeline = TrainPipeline::new(app, store, registry)?;

    let report = match pipeline.run_pipeline() {
        Ok(report) => report,
        Err(PipelineError::ModelNotAccepted {
            trained_model_f1_score,
            best_model_f1_score,
            difference,
        }) => {
            println!();
            println!("  {}", "Model not accepted".yellow().bold());
            println!("  {:<16} {:.4}", muted("Trained F1"), trained_model_f1_score);
            println!("  {:<16} {:.4}", muted("Production F1"), best_model_f1_score.unwrap_or(0.0));
            println!("  {:<16} {:+.4}", muted("Difference"), difference);
            println!();
            anyhow::bail!("trained model did not beat the production model");
        }
        Err(e) => return Err(e.into()),
    };
    step_done(&format!("{:?}", start.elapsed()));

    let metrics = &report.trainer.metric_artifact;
    println!();
    line_box_top();
    line_box_center(&format!("{}", "Model pushed".white().bold()));
    line_box_sep();
    line_box(&kv("Train accuracy ", &format!("{:.4}", report.trainer.train_accuracy)));
    line_box(&kv("Test accuracy  ", &format!("{:.4}", metrics.accuracy)));
    line_box(&kv("Test F1        ", &format!("{:.4}", metrics.f1_score)));
    line_box(&kv("Precision      ", &format!("{:.4}", metrics.precision_score)));
    line_box(&kv("Recall         ", &format!("{:.4}", metrics.recall_score)));
    line_box(&kv("Eval F1        ", &format!("{:.4}", report.evaluation.trained_model_f1_score)));
    line_box(&kv("Gain           ", &format!("{:+.4}", report.evaluation.changed_accuracy)));
    line_box_sep();
    line_box(&kv("Artifacts ", &report.artifact_dir.display().to_string()));
    line_box(&kv("Registry  ", &report.pusher.registry_location));
    line_box_bottom();
    println!();

    Ok(())
}

pub fn cmd_predict(app: AppConfig, fields: BTreeMap<String, String>) -> anyhow::Result<()> {
    section("Predict");

    let registry: Arc<dyn ModelRegistry> = Arc::new(FileModelRegistry::new(&app.bucket_dir));
    let predictor = AdPredictor::new(registry, app.model_key.clone());
    let prediction = predictor.predict_fields(&fields)?;

    let message = if prediction.label == 1 {
        prediction.message.green().bold()
    } else {
        prediction.message.red().bold()
    };
    println!("  {:<16} {}", muted("Prediction"), message);
    println!("  {:<16} {:.4}", muted("P(click)"), prediction.probability);
    println!();
    Ok(())
}

pub fn cmd_sample_data(app: AppConfig, records: usize, seed: u64, label_noise: f64) -> anyhow::Result<()> {
    section("Sample data");

    if !(0.0..=1.0).contains(&label_noise) {
        anyhow::bail!("label noise must lie in [0, 1], got {}", label_noise);
    }

    let config = SampleConfig {
        n_records: records,
        seed,
        label_noise,
        ..SampleConfig::default()
    };
    let documents = generate_impressions(&config);

    let store = JsonLinesStore::new(&app.data_dir);
    let inserted = store.insert_many(&app.collection_name, &documents)?;
    step_ok(&format!(
        "{} records → {}",
        inserted,
        store.collection_path(&app.collection_name).display()
    ));
    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(mut app: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::run_server;

    if let Some(host) = host {
        app.host = host;
    }
    if let Some(port) = port {
        app.port = port;
    }
    let base = format!("http://{}:{}", app.host, app.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Ad Click Prediction".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Form   ", &base));
    line_box(&kv("Train  ", &format!("{}/train", base)));
    line_box(&kv("Health ", &format!("{}/health", base)));
    line_box_empty();
    line_box_sep();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_bottom();
    println!();

    run_server(app).await
}

fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("adclick sample-data -n 1000", "Seed the raw collection"),
        ("adclick train", "Run the training pipeline"),
        ("adclick predict -a 25 --device-type Mobile", "Score one impression"),
        ("adclick serve -p 5000", "Start the prediction form"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<44} {}", cmd.white(), muted(desc));
    }
    println!();
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = app_config(cli.root.as_ref());

    match cli.command {
        Some(Commands::Train { schema, model_config }) => cmd_train(app, schema, model_config),
        Some(Commands::Serve { port, host }) => cmd_serve(app, host, port).await,
        Some(Commands::Predict {
            age,
            gender,
            device_type,
            ad_position,
            browsing_history,
            time_of_day,
        }) => {
            let fields = indicator_fields(
                &age,
                &[
                    ("gender", gender.as_deref()),
                    ("device_type", device_type.as_deref()),
                    ("ad_position", ad_position.as_deref()),
                    ("browsing_history", browsing_history.as_deref()),
                    ("time_of_day", time_of_day.as_deref()),
                ],
            );
            cmd_predict(app, fields)
        }
        Some(Commands::SampleData { records, seed, label_noise }) => {
            cmd_sample_data(app, records, seed, label_noise)
        }
        None => {
            show_help();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_fields() {
        let fields = indicator_fields(
            " 31 ",
            &[
                ("device_type", Some("Mobile")),
                ("browsing_history", Some("Social Media")),
                ("gender", None),
            ],
        );
        assert_eq!(fields.get("age").map(String::as_str), Some("31"));
        assert_eq!(fields.get("device_type_Mobile").map(String::as_str), Some("1"));
        assert_eq!(fields.get("browsing_history_Social_Media").map(String::as_str), Some("1"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "hello".red());
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from([
            "adclick", "predict", "--age", "40", "--device-type", "Tablet",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Predict { age, device_type, gender, .. }) => {
                assert_eq!(age, "40");
                assert_eq!(device_type.as_deref(), Some("Tablet"));
                assert!(gender.is_none());
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_root_rebases_paths() {
        let root = PathBuf::from("/tmp/adclick-root");
        let app = app_config(Some(&root));
        assert_eq!(app.data_dir, root.join("data"));
        assert_eq!(app.bucket_dir, root.join("model-registry"));
    }
}
