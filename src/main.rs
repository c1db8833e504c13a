use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use winget_pilot::console::ConsoleSink;
use winget_pilot::package_manager::{self, InstallBatch, SearchResult};
use winget_pilot::{dispatch, events, Config, InstallPipeline, Package, PackageManager};

#[derive(Parser, Debug)]
#[command(name = "winget-pilot", version, about = "Search and batch-install packages through winget")]
struct Cli {
    /// 配置文件路径（默认 ~/.config/winget-pilot/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search packages
    Search {
        query: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the description of a package id
    Show { id: String },
    /// Search, then install the picked results one after another
    Install {
        query: String,
        /// 1-based index into the search results (repeatable)
        #[arg(long = "pick", value_name = "N", required_unless_present = "all")]
        picks: Vec<usize>,
        /// Install every search result
        #[arg(long, conflicts_with = "picks")]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref()).context("加载配置失败")?;
    let pm = PackageManager::new(&config);
    log::debug!("using {:?}", pm);

    match cli.command {
        Commands::Search { query, json } => {
            let results = search(&pm, query, !json).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
        Commands::Show { id } => {
            let (tx, rx) = events::channel();
            package_manager::spawn_description(pm, id, tx);
            let mut sink = ConsoleSink::new(io::stdout());
            dispatch(rx, &mut sink).await;
        }
        Commands::Install { query, picks, all } => {
            let results = search(&pm, query, true).await?;
            let selected = select(results, &picks, all)?;

            let pipeline = InstallPipeline::from_config(&config);
            let (tx, rx) = events::channel();
            let handle = package_manager::spawn_install(pipeline, InstallBatch::new(selected), tx)?;

            let mut sink = ConsoleSink::new(io::stdout());
            dispatch(rx, &mut sink).await;
            let batch = tokio::task::spawn_blocking(move || handle.join())
                .await?
                .map_err(|_| anyhow::anyhow!("安装线程异常退出"))?;

            if batch.summary().failed > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn search(pm: &PackageManager, query: String, print: bool) -> Result<SearchResult> {
    if query.trim().is_empty() {
        bail!("Enter a search query.");
    }
    let (tx, rx) = events::channel();
    package_manager::spawn_search(pm.clone(), query, tx);

    // 不打印列表时（--json）状态信息改写到 stderr，保持 stdout 干净
    let mut sink = if print {
        ConsoleSink::new(Box::new(io::stdout()) as Box<dyn Write>)
    } else {
        ConsoleSink::new(Box::new(io::stderr()) as Box<dyn Write>).quiet_results()
    };
    dispatch(rx, &mut sink).await;
    Ok(sink.take_results())
}

fn select(results: SearchResult, picks: &[usize], all: bool) -> Result<Vec<Package>> {
    if all {
        return Ok(results);
    }
    let mut selected: Vec<Package> = Vec::with_capacity(picks.len());
    let mut seen = HashSet::new();
    for &n in picks {
        match n.checked_sub(1).and_then(|i| results.get(i)) {
            // 同一个 (id, source) 只安装一次
            Some(pkg) => {
                if seen.insert(pkg.key()) {
                    selected.push(pkg.clone());
                }
            }
            None => bail!("--pick {} is out of range (1..={})", n, results.len()),
        }
    }
    if selected.is_empty() {
        bail!("Please select one or more applications to install.");
    }
    Ok(selected)
}
