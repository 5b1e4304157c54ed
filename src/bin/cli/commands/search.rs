use anyhow::{Context, Result};

use flashdeck_lib::flashcards::{draw_random_filtered, RecordId};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(
    app: &App,
    keywords: &[String],
    exclude: &[RecordId],
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let draw = draw_random_filtered(&app.storage, exclude, keywords)
        .with_context(|| format!("Search for {:?} failed", keywords))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&draw)?);
        }
        OutputFormat::Plain => {
            let Some(record) = &draw.record else {
                println!("No cards match '{}'.", keywords.join(" "));
                return Ok(());
            };

            println!("{}", terminal::render_question(record, use_color));
            println!();
            println!("{}", terminal::render_answer(record, use_color));
            println!();
            println!(
                "{}",
                terminal::styled(
                    &format!("{} matching cards available", draw.eligible_count),
                    terminal::Color::DIM,
                    use_color
                )
            );
        }
    }

    Ok(())
}
