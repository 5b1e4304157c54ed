use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use flashdeck_lib::session::{SessionCard, StudySession};

use crate::app::App;
use crate::render::terminal::{self, Color};

/// What the user typed at a prompt
#[derive(Debug, PartialEq)]
enum Input {
    Next,
    Search(Vec<String>),
    Browse,
    Reset,
    Quit,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Next,
        "q" | "quit" => Input::Quit,
        "r" | "reset" => Input::Reset,
        "/" => Input::Browse,
        _ => match line.strip_prefix('/') {
            Some(words) => Input::Search(words.split_whitespace().map(String::from).collect()),
            None => Input::Next,
        },
    }
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, text: &str, use_color: bool) -> Result<Input> {
    print!("{} ", terminal::styled(text, Color::DIM, use_color));
    io::stdout().flush()?;

    match lines.next() {
        Some(line) => Ok(parse_input(&line.context("Failed to read from stdin")?)),
        None => Ok(Input::Quit),
    }
}

/// Apply a mode change; returns false when the user quits
fn apply(input: Input, session: &mut StudySession) -> bool {
    match input {
        Input::Next => {}
        Input::Search(keywords) => {
            session.start_search(keywords);
        }
        Input::Browse => session.end_search(),
        Input::Reset => session.reset(),
        Input::Quit => return false,
    }
    true
}

fn next_card(app: &App, session: &mut StudySession) -> Result<SessionCard> {
    let card = if session.search_keywords().is_some() {
        session.next_search_card(&app.storage)
    } else {
        session.next_card(&app.storage)
    };
    card.context("Failed to draw a card")
}

pub fn run(app: &App, search: &[String], use_color: bool) -> Result<()> {
    let mut session = StudySession::new();
    if !search.is_empty() {
        session.start_search(search);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let card = next_card(app, &mut session)?;
        let mode = match session.search_keywords() {
            Some(keywords) => format!("search '{}'", keywords.join(" ")),
            None => "deck".to_string(),
        };

        match &card.record {
            Some(record) => {
                println!();
                println!("{}", terminal::render_question(record, use_color));

                let input = prompt(&mut lines, "[Enter] show answer", use_color)?;
                if input != Input::Next {
                    if !apply(input, &mut session) {
                        break;
                    }
                    continue;
                }

                println!("{}", terminal::render_answer(record, use_color));
                println!(
                    "{}",
                    terminal::styled(
                        &format!("{} of {} ({})", card.seen, card.population, mode),
                        Color::GREEN,
                        use_color
                    )
                );
            }
            None if session.search_keywords().is_some() => {
                println!("{}", terminal::styled(&format!("No cards match {}.", mode), Color::YELLOW, use_color));
            }
            None => {
                println!("{}", terminal::styled("The deck is empty.", Color::YELLOW, use_color));
            }
        }

        let input = prompt(
            &mut lines,
            "[Enter] next  /<words> search  / deck  r reset  q quit",
            use_color,
        )?;
        if !apply(input, &mut session) {
            break;
        }
    }

    Ok(())
}
