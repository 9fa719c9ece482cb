pub mod check;
pub mod format;
pub mod validate_step;

use anyhow::Result;
use serde::Serialize;

pub(crate) fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
