use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod form;
mod inputter;
mod loader;
mod model;
mod record;
mod table;
mod ui;

use controller::Controller;
use domain::{Config, MenagerieError, TableSpec};
use model::{Model, Status};
use ui::TableUI;

/// Browse, sort and edit tables of animals loaded from JSON fixtures.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding bigCats.json, dogs.json and bigFish.json
    #[arg(default_value = "data")]
    data_dir: String,

    /// JSON file with table definitions replacing the built-in ones
    #[arg(long)]
    layout: Option<String>,

    /// Milliseconds to wait for a key event before redrawing
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Log file, the terminal is used by the UI
    #[arg(long, default_value = "menagerie.log")]
    log_file: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), MenagerieError> {
    init_logging(&expand_path(&args.log_file)?)?;
    let config = build_config(&args)?;
    info!("Starting menagerie with {:?}", config.data_dir);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &config);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, config: &Config) -> Result<(), MenagerieError> {
    let mut model = Model::init(config);
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<Config, MenagerieError> {
    let mut config = Config::default()
        .data_dir(expand_path(&args.data_dir)?)
        .event_poll_time(args.event_poll_time);
    if let Some(layout) = &args.layout {
        config = config.tables(TableSpec::load_layout(&expand_path(layout)?)?);
    }
    Ok(config)
}

fn expand_path(path: &str) -> Result<PathBuf, MenagerieError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| MenagerieError::InvalidPath(e.to_string()))
}

fn init_logging(path: &Path) -> Result<(), MenagerieError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
