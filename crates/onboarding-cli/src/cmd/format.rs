use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use onboarding_form::{format_iban, format_phone};
use serde_json::json;

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    #[arg(value_enum)]
    pub kind: FormatKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatKind {
    /// Blocks of four characters
    Iban,
    /// `+34 XXX XXX XXX`
    Phone,
}

pub fn run(args: &FormatArgs, json: bool) -> Result<()> {
    let formatted = match args.kind {
        FormatKind::Iban => format_iban(&args.value),
        FormatKind::Phone => format_phone(&args.value),
    };
    if formatted.is_empty() {
        bail!("nothing to format in `{}`", args.value);
    }
    if json {
        super::print_json(&json!({ "input": args.value, "formatted": formatted }))
    } else {
        println!("{formatted}");
        Ok(())
    }
}
