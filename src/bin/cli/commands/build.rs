use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, rebuild: bool, format: &OutputFormat) -> Result<()> {
    let summary = app.build(rebuild)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "database": app.storage.db_path(),
                "built": summary.is_some(),
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match summary {
            Some(summary) => {
                println!("Built {:?}", app.storage.db_path());
                println!("  text cards:   {}", summary.text_records);
                println!("  image cards:  {}", summary.image_records);
                println!("  indexed:      {}", summary.indexed_records);
                if summary.skipped_files > 0 {
                    println!("  skipped files: {}", summary.skipped_files);
                }
            }
            None => {
                println!(
                    "Card store already exists at {:?} (use --rebuild to replace it)",
                    app.storage.db_path()
                );
            }
        },
    }

    Ok(())
}
