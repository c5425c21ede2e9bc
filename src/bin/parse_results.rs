//! Parse simulator logs of every scheduler configuration and write the result tables
use clap::Parser;
use cli_table::{Cell, Table, print_stdout};
use log::info;
use memsim_results::{
    ConfigAggregate, LogExtractor, discover_configs, generate_reports, get_tqdm_style, write_json,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration directories to collect, default to every directory under root path
    configs: Vec<String>,

    /// Folder holding the configuration directories, reports are written here
    #[arg(short, long, default_value = ".")]
    root_path: PathBuf,

    /// Also dump all parsed results to this json file
    #[arg(short, long)]
    json_path: Option<PathBuf>,

    /// Do not print the summary table
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config_names = discover_configs(&args.root_path, &args.configs)?;
    info!(
        "Found {} configurations under {}",
        config_names.len(),
        args.root_path.display()
    );

    let extractor = LogExtractor::new()?;
    let pbar = indicatif::ProgressBar::new(config_names.len() as u64);
    pbar.set_style(get_tqdm_style()?);

    let configs = generate_reports(&extractor, &args.root_path, &config_names, &pbar)?;

    if let Some(json_path) = &args.json_path {
        write_json(json_path, &configs)?;
        println!("Parsed results written to {}", json_path.display());
    }

    if !args.quiet {
        let mut sorted: Vec<&ConfigAggregate> = configs.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        let mut table = vec![];
        for config in sorted {
            table.push(vec![
                config.name.clone().cell(),
                config.total_cycles.cell(),
                format!("{:.4}", config.avg_max_slowdown).cell(),
                format!("{:.4e}", config.pfp).cell(),
                format!("{:.4}", config.total_edp).cell(),
            ]);
        }
        let table = table.table().title(vec![
            "Scheduler".cell(),
            "Total Num Cycles".cell(),
            "Avg. Max Slowdown".cell(),
            "PFP".cell(),
            "Total EDP (J.s)".cell(),
        ]);
        print_stdout(table)?;
    }

    Ok(())
}
