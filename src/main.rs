use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bikeshare_dash::data::loader::load_file;
use bikeshare_dash::{AppState, Mode};
use chrono::NaiveDate;
use clap::{Parser, ValueHint};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bike-rental dashboard: one recompute pass as JSON", long_about = None)]
struct Cli {
    /// Rental table (.csv, .json or .parquet)
    #[arg(value_hint = ValueHint::FilePath)]
    data: PathBuf,

    /// Analysis to compute
    #[arg(short, long, value_enum, default_value_t = Mode::Distribution)]
    mode: Mode,

    /// First day to include (YYYY-MM-DD); defaults to the first day in the data
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD); defaults to the last day in the data
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Output path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Fatal on any load error: never run on a partial table.
    let dataset = load_file(&cli.data)?;

    let mut state = AppState {
        mode: cli.mode,
        ..AppState::default()
    };
    state.set_dataset(dataset);
    state.set_partial_range(cli.start, cli.end)?;

    let view = match (&state.view, &state.status_message) {
        (Some(view), _) => view,
        (None, Some(msg)) => anyhow::bail!("{msg}"),
        (None, None) => anyhow::bail!("no view computed"),
    };

    let out: Box<dyn Write> = if cli.output.as_os_str() == "-" {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&cli.output)
            .with_context(|| format!("creating {}", cli.output.display()))?;
        Box::new(file)
    };
    let mut out = BufWriter::new(out);

    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, view)?;
    } else {
        serde_json::to_writer(&mut out, view)?;
    }
    writeln!(out)?;
    out.flush().context("writing output")?;

    log::info!("{}: {} records in view", view.title, view.rows);
    Ok(())
}
