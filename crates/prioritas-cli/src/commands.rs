//! Subcommand handlers
//!
//! Each handler loads its inputs, runs one library operation and prints the
//! result. Rendering is split out into `render_*` functions that return the
//! text instead of printing it.

use crate::cli::{Cli, Commands};
use crate::config::{self, Overrides};
use anyhow::Context;
use prioritas_classifiers::{
    evaluate, split_holdout, EvaluationReport, PrioritizationPipeline, RankedComplaint,
    SelectedFeatureSet, SignificanceSelector, SyntheticGenerator, TrainedModel,
};
use prioritas_core::source::write_json;
use prioritas_core::{ComplaintSource, FileSource, PriorityLabel};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{info, warn};

/// Dispatch the parsed command line
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Select {
            input,
            threshold,
            json,
        } => {
            let overrides = Overrides {
                threshold: *threshold,
                alpha: None,
            };
            select(&cli.config, overrides, input, *json)
        }
        Commands::Train {
            input,
            output,
            threshold,
            alpha,
        } => {
            let overrides = Overrides {
                threshold: *threshold,
                alpha: *alpha,
            };
            train(&cli.config, overrides, input, output)
        }
        Commands::Predict { model, input, json } => predict(model, input, *json),
        Commands::Evaluate {
            input,
            test_fraction,
            json,
        } => evaluate_holdout(&cli.config, input, *test_fraction, *json),
        Commands::Generate {
            count,
            seed,
            noise,
            output,
        } => generate(*count, *seed, *noise, output.as_deref()),
    }
}

fn select(config_path: &Path, overrides: Overrides, input: &Path, json: bool) -> anyhow::Result<()> {
    let config = config::load(config_path, overrides)?;
    let labeled = FileSource::new(input).labeled()?;

    let pipeline = PrioritizationPipeline::new(config)?;
    let extractor = pipeline.extractor_for(&labeled)?;
    let selection = SignificanceSelector::new(extractor, pipeline.config().selection.clone())?
        .select(&labeled)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
    } else {
        print!("{}", render_selection(&selection));
    }
    Ok(())
}

fn train(
    config_path: &Path,
    overrides: Overrides,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let config = config::load(config_path, overrides)?;
    let pipeline = PrioritizationPipeline::new(config)?;
    let run = pipeline.run_from_source(&FileSource::new(input))?;

    if run.selection.is_empty() {
        warn!(
            threshold = run.selection.threshold,
            "No feature passed the significance test; the saved model cannot predict"
        );
    }

    run.model
        .save(output)
        .with_context(|| format!("failed to write model to {}", output.display()))?;
    info!(path = %output.display(), "Model saved");

    print!("{}", render_selection(&run.selection));
    println!();
    println!("Trained on {} records in {} µs", run.model.total_records(), run.total_latency_us);
    for (label, stats) in run.model.classes() {
        println!("  {:<8} {:>5} records  prior {:.3}", label, stats.count, stats.prior);
    }
    println!("Model written to {}", output.display());
    Ok(())
}

fn predict(model_path: &Path, input: &Path, json: bool) -> anyhow::Result<()> {
    let model = TrainedModel::load(model_path)
        .with_context(|| format!("failed to load model from {}", model_path.display()))?;
    let complaints = FileSource::new(input).complaints()?;

    let ranked = PrioritizationPipeline::default().prioritize(&model, &complaints)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        print!("{}", render_ranking(&ranked));
    }
    Ok(())
}

fn evaluate_holdout(
    config_path: &Path,
    input: &Path,
    test_fraction: f64,
    json: bool,
) -> anyhow::Result<()> {
    let config = config::load(config_path, Overrides::default())?;
    let labeled = FileSource::new(input).labeled()?;
    let (train_set, test_set) = split_holdout(&labeled, test_fraction)?;
    info!(train = train_set.len(), test = test_set.len(), "Split batch");

    let run = PrioritizationPipeline::new(config)?.run(&train_set)?;
    let report = evaluate(&run.model, &test_set)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

fn generate(count: usize, seed: u64, noise: f64, output: Option<&Path>) -> anyhow::Result<()> {
    let batch = SyntheticGenerator::new(seed).with_noise(noise).generate(count);

    match output {
        Some(path) => {
            write_json(path, &batch)?;
            info!(count, seed, path = %path.display(), "Synthetic batch written");
        }
        None => println!("{}", serde_json::to_string_pretty(&batch)?),
    }
    Ok(())
}

/// Selected features first, then rejected and degenerate ones
pub fn render_selection(selection: &SelectedFeatureSet) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} records, threshold p < {}",
        selection.record_count, selection.threshold
    );
    let _ = writeln!(
        out,
        "{:<32} {:>10} {:>4} {:>10}  status",
        "feature", "chi2", "df", "p-value"
    );

    for (status, scores) in [("selected", &selection.features), ("rejected", &selection.rejected)] {
        for score in scores {
            let _ = writeln!(
                out,
                "{:<32} {:>10.3} {:>4} {:>10.3e}  {}",
                score.feature, score.statistic, score.degrees_of_freedom, score.p_value, status
            );
        }
    }
    for degenerate in &selection.degenerate {
        let _ = writeln!(
            out,
            "{:<32} {:>10} {:>4} {:>10}  degenerate: {}",
            degenerate.feature, "-", "-", "-", degenerate.reason
        );
    }
    out
}

/// Ranked queue, most pressing first
pub fn render_ranking(ranked: &[RankedComplaint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<38} {:<8} {:>10}", "#", "complaint", "priority", "confidence");
    for (position, entry) in ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<38} {:<8} {:>9.1}%",
            position + 1,
            entry.complaint_id,
            entry.prediction.label,
            entry.prediction.confidence * 100.0
        );
    }
    out
}

/// Accuracy, per-label metrics and the confusion matrix
pub fn render_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "accuracy {:.3} ({} / {}), macro F1 {:.3}",
        report.accuracy,
        report.correct,
        report.total,
        report.macro_f1()
    );
    let _ = writeln!(
        out,
        "{:<8} {:>9} {:>9} {:>9} {:>8}",
        "label", "precision", "recall", "f1", "support"
    );
    for (label, metrics) in &report.per_class {
        let _ = writeln!(
            out,
            "{:<8} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            label, metrics.precision, metrics.recall, metrics.f1, metrics.support
        );
    }

    let _ = write!(out, "\nactual \\ predicted");
    for label in PriorityLabel::ALL {
        let _ = write!(out, " {:>8}", label);
    }
    let _ = writeln!(out);
    for actual in PriorityLabel::ALL {
        let _ = write!(out, "{:<18}", actual);
        for predicted in PriorityLabel::ALL {
            let count = report
                .confusion
                .get(&actual)
                .and_then(|row| row.get(&predicted))
                .copied()
                .unwrap_or(0);
            let _ = write!(out, " {:>8}", count);
        }
        let _ = writeln!(out);
    }
    out
}
