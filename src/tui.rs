use crate::app::{App, Event};
use crate::config::Config;
use crate::error::Result;
use crate::selection::Cursor;
use crate::units::format_size;
use console::{Alignment, Term, measure_text_width, pad_str, style};
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::warn;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(100);
/// Lines taken by everything except the entry rows.
const CHROME_LINES: usize = 10;

/// Runs the interactive selector until the user quits. Returns the number of
/// bytes freed during the session.
pub fn run(config: &Config) -> Result<u64> {
    let term = Term::stderr();
    let (tx, rx) = mpsc::channel();

    spawn_input(term.clone(), tx.clone());
    spawn_ticker(tx.clone());

    let mut app = App::new(config);
    app.request_scan(&tx)?;

    term.hide_cursor()?;
    let outcome = event_loop(&term, &mut app, &tx, &rx);
    term.show_cursor()?;
    term.clear_screen()?;
    outcome?;

    Ok(app.freed_bytes())
}

fn event_loop(term: &Term, app: &mut App, tx: &Sender<Event>, rx: &Receiver<Event>) -> Result<()> {
    render(term, app)?;

    while let Ok(event) = rx.recv() {
        // ticks only matter while the spinner is showing
        let redraw = !matches!(event, Event::Tick) || app.is_scanning() || app.is_purging();
        app.handle_event(event, tx)?;
        if app.should_quit() {
            break;
        }
        if redraw {
            render(term, app)?;
        }
    }
    Ok(())
}

fn spawn_input(term: Term, sink: Sender<Event>) {
    thread::spawn(move || {
        loop {
            match term.read_key() {
                Ok(key) => {
                    if sink.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "stopped reading keys");
                    let _ = sink.send(Event::InputClosed);
                    break;
                }
            }
        }
    });
}

fn spawn_ticker(sink: Sender<Event>) {
    thread::spawn(move || {
        loop {
            thread::sleep(TICK);
            if sink.send(Event::Tick).is_err() {
                break;
            }
        }
    });
}

/// Window of entry rows to draw so the cursor stays visible.
fn visible_range(cursor: Cursor, len: usize, height: usize) -> Range<usize> {
    let height = height.max(1);
    if len <= height {
        return 0..len;
    }
    let index = match cursor {
        Cursor::SelectAll => 0,
        Cursor::Entry(i) => i,
    };
    let start = index.saturating_sub(height - 1).min(len - height);
    start..start + height
}

fn render(term: &Term, app: &App) -> Result<()> {
    let store = app.store();
    let mut output = String::new();

    output.push_str(&format!(
        "{} {}\n\n",
        style("Select cache entries to delete in").bold(),
        style(app.root().display()).cyan()
    ));

    let spinner = SPINNER[app.ticks() % SPINNER.len()];

    if app.is_scanning() && store.is_empty() {
        output.push_str(&format!("{} Scanning...\n", style(spinner).cyan()));
    } else if store.is_empty() {
        output.push_str(&format!("{}\n", style("Empty cache").yellow()));
    } else {
        output.push_str(&format!(
            "Total: {} of {} ({} of {} entries)\n\n",
            style(format_size(store.selected_total())).green().bold(),
            format_size(store.grand_total()),
            store.selected_count(),
            store.len()
        ));

        let checkbox = if store.all_selected() {
            style("[x]").green()
        } else {
            style("[ ]").dim()
        };
        let line = format!("{} Select all", checkbox);
        if store.cursor() == Cursor::SelectAll {
            output.push_str(&format!("> {}\n\n", style(line).reverse()));
        } else {
            output.push_str(&format!("  {}\n\n", line));
        }

        let (rows, _) = term.size();
        let height = (rows as usize).saturating_sub(CHROME_LINES);
        let range = visible_range(store.cursor(), store.len(), height);
        let name_width = store
            .entries()
            .iter()
            .map(|e| measure_text_width(&e.name))
            .max()
            .unwrap_or(0)
            + 1;

        for (i, entry) in store.entries()[range.clone()].iter().enumerate() {
            let index = range.start + i;
            let checkbox = if entry.selected {
                style("[x]").green()
            } else {
                style("[ ]").dim()
            };
            let name = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            let line = format!(
                "{} {}  {:>10}",
                checkbox,
                pad_str(&name, name_width, Alignment::Left, None),
                format_size(entry.size_bytes)
            );

            if store.cursor() == Cursor::Entry(index) {
                output.push_str(&format!("> {}\n", style(line).reverse()));
            } else {
                output.push_str(&format!("  {}\n", line));
            }
        }
        if range.len() < store.len() {
            output.push_str(&format!(
                "{}\n",
                style(format!("  ({}-{} of {})", range.start + 1, range.end, store.len())).dim()
            ));
        }
    }

    output.push('\n');
    if app.is_purging() {
        output.push_str(&format!("{} Deleting...\n", style(spinner).red()));
    } else if app.is_scanning() && !store.is_empty() {
        output.push_str(&format!("{} Rescanning...\n", style(spinner).cyan()));
    }
    if let Some(err) = app.last_error() {
        output.push_str(&format!("{} {}\n", style("error:").red().bold(), err));
    }
    if let Some(status) = app.status() {
        output.push_str(&format!("{}\n", style(status).yellow()));
    }

    output.push_str(&format!(
        "\n{} navigate  {} toggle  {} toggle all  {} delete  {} rescan  {} quit\n",
        style("↑↓").cyan(),
        style("Space").cyan(),
        style("a").cyan(),
        style("Enter").cyan(),
        style("r").cyan(),
        style("q").cyan()
    ));

    term.clear_screen()?;
    term.write_str(&output)?;

    Ok(())
}
