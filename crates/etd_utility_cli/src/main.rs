//! Command-line preview of the loader configuration block.
//!
//! # Responsibility
//! - Load application settings and an optional translation catalog.
//! - Print the `requirejs.config` block a page would receive.

use clap::Parser;
use etd_utility::{
    default_log_level, init_logging, AppConfig, CatalogTranslator, TranslateOptions,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "etd-utility", version, about = "Preview the client loader configuration")]
struct Args {
    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Adds a cache-busting token to every module URL.
    #[arg(long)]
    debug: bool,

    /// Absolute directory for rotating log files.
    #[arg(long)]
    log_dir: Option<String>,

    /// JSON translation catalog (`{"KEY": "text"}`).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Module to register, as `id=path`. Repeatable.
    #[arg(long = "module", value_name = "ID=PATH")]
    modules: Vec<String>,

    /// Catalog key exported to the client. Repeatable.
    #[arg(long = "string", value_name = "KEY")]
    strings: Vec<String>,

    /// Script run once the DOM is ready. Repeatable.
    #[arg(long = "on-ready", value_name = "SCRIPT")]
    on_ready: Vec<String>,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)?;
    }

    let config = match args.config.as_deref() {
        Some(path) => AppConfig::load(path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };
    let translator = match args.catalog.as_deref() {
        Some(path) => {
            CatalogTranslator::load(config.locale.clone(), path).map_err(|err| err.to_string())?
        }
        None => CatalogTranslator::new(config.locale.clone()),
    };

    let mut loader = config.loader();
    for module in &args.modules {
        let (id, path) = module
            .split_once('=')
            .ok_or_else(|| format!("module `{module}` must be written id=path"))?;
        loader.register_module(id.trim(), path.trim(), None);
    }
    for script in &args.on_ready {
        loader.schedule_on_ready(script, false, "");
    }
    for key in &args.strings {
        loader.register_string(&translator, Some(key), &[], TranslateOptions::for_client());
    }

    let base_url = args.base_url.as_deref().unwrap_or(&config.base_url);
    let debug = args.debug || config.debug;
    info!(
        "event=cli_render module=cli status=ok modules={} strings={} debug={}",
        args.modules.len(),
        args.strings.len(),
        debug
    );

    println!("// etd_utility {}", etd_utility::core_version());
    print!("{}", loader.render(base_url, debug));
    Ok(())
}
