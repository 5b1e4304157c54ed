use anyhow::{Context, Result};

use flashdeck_lib::flashcards::{draw_random, RecordId};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(app: &App, exclude: &[RecordId], format: &OutputFormat, use_color: bool) -> Result<()> {
    let record = draw_random(&app.storage, exclude).context("Failed to draw a card")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Plain => match record {
            Some(record) => {
                println!("{}", terminal::render_question(&record, use_color));
                println!();
                println!("{}", terminal::render_answer(&record, use_color));
            }
            None => println!("No cards left to draw."),
        },
    }

    Ok(())
}
