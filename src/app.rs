// Declare modules
pub mod cli;
pub mod config;
pub mod detector;
pub mod formatter;
pub mod logger;
pub mod models;
pub mod plugin;
pub mod scanner;
pub mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use self::cli::{Cli, Command, ConfigAction, Filter};
use self::config::{default_settings_path, load_settings, save_settings, shared, SharedSettings};
use self::plugin::TaskLogPlugin;
use self::scanner::VaultScanner;
use self::store::VaultStore;

/// Loads settings, builds the plugin over the vault and runs one command.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();

    // 2. Locate vault and settings
    let vault_root = match args.vault {
        Some(dir) => dir,
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let settings_path = match args.config {
        Some(path) => path,
        None => default_settings_path()?,
    };

    // 3. Load settings and wire components
    let settings = shared(load_settings(&settings_path)?);
    let store = Rc::new(VaultStore::new(vault_root));
    let mut plugin = TaskLogPlugin::new(store.clone(), settings.clone());
    let root = store.root();

    // 4. Dispatch
    match args.command {
        Command::Log { file } => log_current(&plugin, file.as_deref()),
        Command::Sweep { filter } => sweep(&mut plugin, root, &filter),
        Command::Watch {
            filter,
            interval_ms,
            max_polls,
        } => watch(&mut plugin, root, &filter, interval_ms, max_polls),
        Command::Show => {
            print!("{}", plugin.logger().get_content());
            Ok(())
        }
        Command::Clear => {
            plugin.logger().clear()?;
            println!("Cleared {}", plugin.logger().log_file_path());
            Ok(())
        }
        Command::Config { action } => configure(action, &settings, &settings_path),
    }
}

fn log_current(plugin: &TaskLogPlugin, file: Option<&str>) -> Result<()> {
    match plugin.log_document(file) {
        Ok(outcome) => {
            println!("{}", outcome.notice());
            Ok(())
        }
        Err(err) => {
            log::error!("Error logging current file tasks: {:#}", err);
            eprintln!("Error logging tasks");
            Err(err)
        }
    }
}

fn sweep(plugin: &mut TaskLogPlugin, root: &Path, filter: &Filter) -> Result<()> {
    let mut feed = scanner_for(root, filter)?;
    plugin.setup(&mut feed);

    let mut logged = 0;
    for path in feed.sweep() {
        logged += plugin.handle_change(&path);
    }

    plugin.teardown(&mut feed);
    println!("Logged {} completed task(s)", logged);
    Ok(())
}

fn watch(
    plugin: &mut TaskLogPlugin,
    root: &Path,
    filter: &Filter,
    interval_ms: u64,
    max_polls: Option<u64>,
) -> Result<()> {
    let mut feed = scanner_for(root, filter)?;
    plugin.setup(&mut feed);
    feed.baseline();
    log::info!("Watching {:?} every {} ms", root, interval_ms);

    let mut polls = 0;
    while feed.is_active() {
        if max_polls.is_some_and(|max| polls >= max) {
            plugin.teardown(&mut feed);
            break;
        }
        thread::sleep(Duration::from_millis(interval_ms));
        for path in feed.poll() {
            plugin.handle_change(&path);
        }
        polls += 1;
    }
    Ok(())
}

fn configure(action: Option<ConfigAction>, settings: &SharedSettings, path: &Path) -> Result<()> {
    if let Some(ConfigAction::Set { key, value }) = action {
        settings.borrow_mut().apply(&key, &value)?;
        save_settings(path, &settings.borrow())?;
    }

    let rendered =
        toml::to_string_pretty(&*settings.borrow()).context("Failed to serialize settings")?;
    print!("{}", rendered);
    Ok(())
}

fn scanner_for(root: &Path, filter: &Filter) -> Result<VaultScanner> {
    VaultScanner::new(root.to_path_buf(), &filter.include, &filter.exclude)
}
