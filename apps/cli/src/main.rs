#![deny(warnings)]

//! Headless CLI for inspecting and updating camo progress.

use anyhow::{anyhow, bail, Context, Result};
use camo_store::{ProgressStore, Scope, Startup};
use persistence::{FileStorage, Storage};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: camo [--catalog PATH] [--data-dir DIR] [--game ID] [--mode ID] \
[--reset-on-corrupt] [summary | weapons CATEGORY | toggle CATEGORY WEAPON CAMO \
| max-level CATEGORY WEAPON]";

#[derive(Debug, PartialEq, Eq, Default)]
enum Command {
    #[default]
    Summary,
    Weapons {
        category: String,
    },
    Toggle {
        category: String,
        weapon: String,
        completion: String,
    },
    MaxLevel {
        category: String,
        weapon: String,
    },
}

#[derive(Debug, Default)]
struct Args {
    catalog: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    game: Option<String>,
    mode: Option<String>,
    reset_on_corrupt: bool,
    command: Command,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--catalog" => parsed.catalog = Some(value("--catalog")?.into()),
            "--data-dir" => parsed.data_dir = Some(value("--data-dir")?.into()),
            "--game" => parsed.game = Some(value("--game")?),
            "--mode" => parsed.mode = Some(value("--mode")?),
            "--reset-on-corrupt" => parsed.reset_on_corrupt = true,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut rest = positional.into_iter();
    let mut need = |what: &str| rest.next().ok_or_else(|| anyhow!("missing {what}\n{USAGE}"));
    parsed.command = match need("command").ok().as_deref() {
        None | Some("summary") => Command::Summary,
        Some("weapons") => Command::Weapons {
            category: need("CATEGORY")?,
        },
        Some("toggle") => Command::Toggle {
            category: need("CATEGORY")?,
            weapon: need("WEAPON")?,
            completion: need("CAMO")?,
        },
        Some("max-level") => Command::MaxLevel {
            category: need("CATEGORY")?,
            weapon: need("WEAPON")?,
        },
        Some(other) => bail!("unknown command {other}\n{USAGE}"),
    };
    Ok(parsed)
}

fn mark(done: bool) -> &'static str {
    if done {
        "x"
    } else {
        " "
    }
}

fn print_summary<S: Storage>(store: &ProgressStore<S>, out: &mut impl Write) -> Result<()> {
    let total = store.total_fully_completed_count()?;
    let max = store.max_level_count(Scope::All)?;
    writeln!(
        out,
        "complete: {}/{} ({:.1}%) | max level: {}/{}",
        total.completed,
        total.total,
        total.percent(),
        max.completed,
        max.total
    )?;
    for camo in store.completion_categories() {
        let count = store.completion_count(Scope::All, &camo.id)?;
        writeln!(
            out,
            "  {:<16} {:<8} {}/{}",
            camo.id, camo.display_color, count.completed, count.total
        )?;
    }
    for category in store.category_ids()? {
        let done = store.fully_completed_count(Scope::Category(category))?;
        let max = store.max_level_count(Scope::Category(category))?;
        writeln!(
            out,
            "  {:<16} complete {}/{} | max level {}/{}",
            category, done.completed, done.total, max.completed, max.total
        )?;
    }
    Ok(())
}

fn print_weapons<S: Storage>(
    store: &ProgressStore<S>,
    category: &str,
    out: &mut impl Write,
) -> Result<()> {
    let mode = &store.selected_mode().id;
    for weapon in store.weapons_of_category(category)? {
        let stored = weapon.mode(mode);
        let flags = store
            .completion_categories()
            .iter()
            .map(|camo| {
                let done = stored
                    .and_then(|flags| flags.get(&camo.id))
                    .copied()
                    .unwrap_or(false);
                format!("[{}] {}", mark(done), camo.id)
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            "  {:<20} [{}] max {}{}",
            weapon.name,
            mark(weapon.max_level_reached),
            flags,
            if store.weapon_fully_completed(weapon) {
                "  (complete)"
            } else {
                ""
            }
        )?;
    }
    Ok(())
}

fn run<S: Storage>(args: &Args, storage: S, out: &mut impl Write) -> Result<()> {
    let catalog_path = args
        .catalog
        .clone()
        .unwrap_or_else(|| PathBuf::from("assets/catalog.yaml"));
    let catalog = camo_catalog::load(&catalog_path)
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;

    let mut store = if args.reset_on_corrupt {
        ProgressStore::open_or_reset(catalog, storage)?
    } else {
        ProgressStore::open(catalog, storage)
            .context("opening saved progress (pass --reset-on-corrupt to start over)")?
    };
    match store.startup() {
        Startup::FirstRun => info!("started fresh progress"),
        Startup::Restored => {}
        Startup::Migrated(report) => info!(
            from = report.from_version,
            to = report.to_version,
            "progress migrated"
        ),
        Startup::Reset { reason } => writeln!(out, "saved progress was reset: {reason}")?,
    }

    if let Some(game) = &args.game {
        store.select_game(game)?;
    }
    if let Some(mode) = &args.mode {
        store.select_mode(mode)?;
    }
    writeln!(
        out,
        "{} / {} | catalog v{}",
        store.selected_game().id,
        store.selected_mode().id,
        store.catalog().version
    )?;

    match &args.command {
        Command::Summary => print_summary(&store, out)?,
        Command::Weapons { category } => print_weapons(&store, category, out)?,
        Command::Toggle {
            category,
            weapon,
            completion,
        } => {
            let value = store.toggle_completion_flag(category, weapon, completion)?;
            writeln!(out, "{weapon} {completion}: {}", if value { "done" } else { "not done" })?;
        }
        Command::MaxLevel { category, weapon } => {
            let value = store.toggle_max_level(category, weapon)?;
            writeln!(out, "{weapon} max level: {}", if value { "done" } else { "not done" })?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(
        catalog = ?args.catalog,
        data_dir = ?args.data_dir,
        command = ?args.command,
        "starting CLI"
    );

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("saves"));
    let storage = FileStorage::new(data_dir);
    let stdout = std::io::stdout();
    run(&args, storage, &mut stdout.lock())
}
