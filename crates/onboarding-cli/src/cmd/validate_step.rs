use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use onboarding_form::{StepCatalog, StepNumber, StepView, validate_step};
use serde::Serialize;
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct ValidateStepArgs {
    /// JSON file holding the rendered step (controls, rows, uploads)
    #[arg(long, value_name = "view.json")]
    pub view: PathBuf,
    /// Step number, starting at 1
    #[arg(long)]
    pub step: StepNumber,
}

#[derive(Debug, Serialize)]
struct StepReport<'a> {
    step: StepNumber,
    name: &'a str,
    valid: bool,
    invalid_fields: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

pub fn run(args: &ValidateStepArgs, json: bool) -> Result<bool> {
    let catalog = StepCatalog::onboarding();
    let descriptor = catalog.get(args.step).ok_or_else(|| {
        anyhow!(
            "step {} does not exist; the form has {} steps",
            args.step,
            catalog.total()
        )
    })?;

    let raw = fs::read_to_string(&args.view)
        .with_context(|| format!("failed to read {}", args.view.display()))?;
    let mut view: StepView = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid step view", args.view.display()))?;

    let outcome = validate_step(descriptor, Some(&mut view));
    debug!(
        step = args.step,
        invalid = outcome.failing_count(),
        marked = view.invalid_marks(),
        "validated step view"
    );

    let report = StepReport {
        step: args.step,
        name: &descriptor.name,
        valid: outcome.is_valid,
        invalid_fields: &outcome.invalid_field_labels,
        notice: outcome.notice(),
    };
    if json {
        super::print_json(&report)?;
    } else if report.valid {
        println!("{} ({}): valid", report.step, report.name);
    } else {
        println!("{} ({}): invalid", report.step, report.name);
        if let Some(notice) = &report.notice {
            println!("  {notice}");
        }
        for label in report.invalid_fields {
            println!("  - {label}");
        }
    }
    Ok(outcome.is_valid)
}
