use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let count = app.storage.count_records().context("Failed to count cards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "count": count }));
        }
        OutputFormat::Plain => {
            println!("{}", count);
        }
    }

    Ok(())
}
