use std::io::{self, IsTerminal};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use synoptic_core::{BatchOutput, InputPaths, Pipeline, PipelineOptions, Resources};
use synoptic_ingest::{DiscoveryOptions, discover_reports};
use synoptic_model::Report;
use synoptic_transform::{TransformKind, default_registry};
use tracing::{debug, info, info_span, trace};

use synoptic_cli::logging::redact_value;
use synoptic_cli::output::{OutputPaths, run_stamp, write_outputs};

use crate::cli::{InputArgs, RunArgs};
use crate::summary::apply_table_style;
use crate::types::RunResult;

pub fn run_transforms() -> Result<()> {
    let registry = default_registry();
    let mut table = Table::new();
    table.set_header(vec!["Transform", "Kind", "Description"]);
    apply_table_style(&mut table);
    for name in registry.names() {
        let Some(transform) = registry.get(&name) else {
            continue;
        };
        let kind = match transform.kind() {
            TransformKind::Cleaning => "cleaning",
            TransformKind::Computed => "computed",
        };
        table.add_row(vec![name.as_str(), kind, transform.description()]);
    }
    println!("{table}");
    Ok(())
}

fn input_paths(inputs: &InputArgs) -> InputPaths {
    InputPaths {
        schema: inputs.schema.clone(),
        code_book: inputs.code_book.clone(),
        thresholds: inputs.thresholds.clone(),
        regex_rules: inputs.regex_rules.clone(),
        exclusions: inputs.exclusions.clone(),
        categories: inputs.categories.clone(),
        frequency_list: inputs.frequency_list.clone(),
        word_list: inputs.word_list.clone(),
        section_rules: inputs.section_rules.clone(),
    }
}

/// Options from the config file, with the flags applied on top.
fn pipeline_options(args: &RunArgs) -> Result<PipelineOptions> {
    let mut options = match &args.config {
        Some(path) => PipelineOptions::from_toml_file(path)?,
        None => PipelineOptions::default(),
    };
    options.report_type = args.report_type.into();
    if args.no_autocorrect {
        options = options.with_autocorrect(false);
    }
    if args.training {
        options = options.with_training(true);
    }
    if args.ocr_repair {
        options = options.with_ocr_repair(true);
    }
    options.validate()?;
    Ok(options)
}

fn progress_bar(len: usize) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

pub fn run_reports(args: &RunArgs) -> Result<RunResult> {
    let started = Instant::now();
    let options = pipeline_options(args)?;
    let report_type = options.report_type;
    let run_span = info_span!("run", report_type = %report_type);
    let _run_guard = run_span.enter();

    let resources =
        Resources::load(&input_paths(&args.inputs), &options).context("load startup inputs")?;
    let pipeline = Pipeline::new(resources, options).context("build pipeline")?;

    let discovery = DiscoveryOptions {
        start: args.start,
        end: args.end,
        report_ending: args.report_ending.clone(),
        ..DiscoveryOptions::default()
    };
    let files = discover_reports(&args.reports_dir, &discovery)
        .with_context(|| format!("discover reports in {}", args.reports_dir.display()))?;
    info!(
        reports = files.len(),
        dir = %args.reports_dir.display(),
        "reports discovered"
    );

    let bar = progress_bar(files.len());
    let mut batch = BatchOutput::new();
    for file in &files {
        bar.set_message(file.id.clone());
        let result = file
            .read()
            .with_context(|| format!("read {}", file.path.display()))
            .and_then(|text| {
                trace!(id = %file.id, text = redact_value(&text), "report text");
                pipeline.process_text(&file.id, &text)
            });
        if let Ok(outcome) = &result {
            for report in &outcome.reports {
                trace!(id = %report.id(), section = redact_value(report.section()), "isolated section");
            }
        }
        batch.record(&file.id, result);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.reports_dir.join("output"));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    let outputs = OutputPaths::new(&output_dir, &run_stamp(Local::now()));

    let rows: Vec<Report> = batch
        .reports
        .iter()
        .filter(|report| !(args.only_synoptic && report.is_no_synoptic()))
        .cloned()
        .collect();
    let columns: Vec<&str> = pipeline.encoder().schema().canonical_names().collect();
    write_outputs(&outputs, &columns, &rows, &batch.audit)?;
    debug!(
        rows = rows.len(),
        skipped = batch.reports.len() - rows.len(),
        "rows selected"
    );

    Ok(RunResult {
        report_type,
        outputs,
        rows: rows.len(),
        batch,
        elapsed: started.elapsed(),
    })
}
