use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use cityweather_core::{ClockStyle, Config, Input, Widget, provider_from_config};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tokio::{runtime::Handle, sync::Mutex};

use crate::{
    logging::{LogLevel, setup_logging},
    suggest::{CitySuggester, candidate_labels},
    view::{ViewOptions, details_label, render_candidates, render_session},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Look up current weather by city name")]
pub struct Cli {
    /// Verbosity of diagnostics written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// OpenWeather API key; overrides the configured one.
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and display preferences.
    Configure,

    /// List the cities matching a query.
    Search {
        /// Free-text city name.
        query: String,
    },

    /// Show current weather for the best (or chosen) match of a query.
    Show {
        /// Free-text city name.
        query: String,

        /// 1-based index into the matches; defaults to the first.
        #[arg(long)]
        pick: Option<usize>,

        /// Include feels-like temperature, humidity and wind.
        #[arg(long)]
        details: bool,
    },

    /// Search, pick and browse interactively (default).
    Interactive,
}

/// What to do once a card is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardAction {
    ToggleDetails { expanded: bool },
    NewSearch,
    Quit,
}

impl fmt::Display for CardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardAction::ToggleDetails { expanded } => f.write_str(details_label(*expanded)),
            CardAction::NewSearch => f.write_str("New search"),
            CardAction::Quit => f.write_str("Quit"),
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        setup_logging(self.log_level)?;

        let command = self.command.unwrap_or(Command::Interactive);
        if command == Command::Configure {
            return configure();
        }

        let config = Config::load()?;
        let provider = Arc::new(provider_from_config(&config, self.api_key.as_deref())?);
        let opts = ViewOptions {
            clock: config.display.clock,
            icons_base: config.endpoints.icons.clone(),
        };
        let mut widget = Widget::new(provider.clone(), provider);

        match command {
            Command::Search { query } => search(&mut widget, query).await,
            Command::Show { query, pick, details } => {
                show(&mut widget, query, pick, details, &opts).await
            }
            Command::Interactive | Command::Configure => interactive(widget, &opts).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let current = ClockStyle::all()
        .iter()
        .position(|c| *c == config.display.clock)
        .unwrap_or_default();
    let clock = Select::new("Clock style:", ClockStyle::all().to_vec())
        .with_starting_cursor(current)
        .prompt()
        .context("Failed to read clock style")?;

    config.set_api_key(api_key);
    config.display.clock = clock;
    let path = config.save()?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn search(widget: &mut Widget, query: String) -> anyhow::Result<()> {
    widget.handle(Input::QueryChanged(query));
    widget.settle().await;

    let candidates = widget.session().candidates();
    if candidates.is_empty() {
        println!("No matching cities.");
    } else {
        print!("{}", render_candidates(candidates));
    }

    Ok(())
}

async fn show(
    widget: &mut Widget,
    query: String,
    pick: Option<usize>,
    details: bool,
    opts: &ViewOptions,
) -> anyhow::Result<()> {
    widget.handle(Input::QueryChanged(query.clone()));
    widget.settle().await;

    let found = widget.session().candidates().len();
    if found == 0 {
        bail!("No city matches '{query}'.");
    }

    match pick {
        Some(n) if n == 0 || n > found => {
            bail!("--pick {n} is out of range; '{query}' matched {found} cities.")
        }
        Some(n) => widget.handle(Input::Select(n - 1)),
        None => widget.handle(Input::Confirm),
    }
    widget.settle().await;

    if let Some(error) = widget.session().error() {
        bail!("{error}");
    }
    if details {
        widget.handle(Input::ToggleDetails);
    }

    print!("{}", render_session(widget.session(), &Local::now(), opts));
    Ok(())
}

async fn interactive(widget: Widget, opts: &ViewOptions) -> anyhow::Result<()> {
    let widget = Arc::new(Mutex::new(widget));
    let suggester = CitySuggester::new(widget.clone(), Handle::current());

    loop {
        let initial = widget.lock().await.session().query().to_string();
        // The suggester locks the widget on every keystroke; no guard may be
        // held while the prompt is open.
        let Some(text) = Text::new("Enter city")
            .with_initial_value(&initial)
            .with_autocomplete(suggester.clone())
            .prompt_skippable()?
        else {
            return Ok(());
        };

        let mut widget = widget.lock().await;
        let labels = candidate_labels(&widget);
        match labels.iter().position(|label| *label == text) {
            Some(index) => widget.handle(Input::Select(index)),
            None => {
                if widget.session().query() != text || labels.is_empty() {
                    widget.handle(Input::QueryChanged(text));
                    widget.settle().await;
                }
                if widget.session().candidates().is_empty() {
                    if !widget.session().query().trim().is_empty() {
                        println!("No matching cities.");
                    }
                    continue;
                }
                widget.handle(Input::Confirm);
            }
        }
        widget.settle().await;

        loop {
            // Re-rendered each pass so the local time stays current.
            print!("{}", render_session(widget.session(), &Local::now(), opts));
            if widget.session().snapshot().is_none() {
                break;
            }

            let expanded = widget.session().details_expanded();
            let actions = vec![
                CardAction::ToggleDetails { expanded },
                CardAction::NewSearch,
                CardAction::Quit,
            ];
            match Select::new("Next:", actions).prompt_skippable()? {
                Some(CardAction::ToggleDetails { .. }) => widget.handle(Input::ToggleDetails),
                Some(CardAction::NewSearch) => break,
                Some(CardAction::Quit) | None => return Ok(()),
            }
        }
    }
}
