use clap::Parser;
use munro_core::error::MunroError;
use munro_core::filter::filter;
use munro_core::load_csv;
use munro_core::types::Munro;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "munro-extract", about = "Convert a munrotab CSV to JSON")]
struct Cli {
    /// Input CSV file (DoBIH munrotab export)
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Drop rows without usable coordinates
    #[arg(long)]
    valid_only: bool,

    /// Keep only rows whose name or SMC section contains TERM
    #[arg(long, value_name = "TERM")]
    search: Option<String>,
}

fn run(cli: Cli) -> Result<(), MunroError> {
    let all = load_csv(&cli.input)?;

    let mut munros: Vec<&Munro> = match &cli.search {
        Some(term) => filter(&all, term),
        None => all.iter().collect(),
    };
    if cli.valid_only {
        munros.retain(|m| m.has_valid_position());
    }
    log::info!("writing {} of {} hills", munros.len(), all.len());

    let json = if cli.pretty {
        serde_json::to_string_pretty(&munros)?
    } else {
        serde_json::to_string(&munros)?
    };

    if let Some(output_path) = cli.output {
        std::fs::write(&output_path, &json)?;
        eprintln!("Written to {}", output_path.display());
    } else {
        println!("{json}");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
