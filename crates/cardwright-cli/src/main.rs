//! Headless Cardwright shell.
//!
//! Usage: `cardwright <store-dir> <script.json> [--config editor.json]`
//!
//! Opens (or creates) a design in a file-backed store, replays the script's
//! editor commands and saves the result. `RUST_LOG` controls log output.

mod script;

use cardwright_core::storage::{DesignSession, FileBackend, NewDesign};
use cardwright_core::{Editor, EditorConfig, InteractionController};
use clap::Parser;
use script::{ReplayStats, Script};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Replay an editor script against a design store.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "cardwright", version, about = "Headless Cardwright editor shell")]
struct Args {
    /// Directory holding the design files
    #[arg(value_name = "STORE_DIR")]
    store: PathBuf,
    /// JSON script of editor commands
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,
    /// Editor config (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// What the run printed on stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    design_id: String,
    layers: usize,
    zoom: f64,
    history_entries: usize,
    #[serde(flatten)]
    stats: ReplayStats,
}

fn run(args: Args) -> Result<Summary, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };
    let script = Script::from_file(&args.script)?;
    let backend = Arc::new(FileBackend::new(args.store.clone())?);
    log::info!("Using design store at {}", backend.base_path().display());

    pollster::block_on(async {
        let mut editor = Editor::new(config.clone());
        let mut session = match &script.design {
            Some(id) => {
                let mut session = DesignSession::new(backend.clone(), id.clone(), &config);
                session.load(&mut editor).await?;
                session
            }
            None => {
                let design = NewDesign {
                    template_id: script.template.id.clone(),
                    event_id: None,
                    name: script.name.clone(),
                };
                let (session, record) =
                    DesignSession::create(backend.clone(), design, &config).await?;
                log::info!("Created design {} from template {}", record.id, record.template_id);
                session
            }
        };

        let mut controller = InteractionController::for_template(&script.template);
        let stats = script::replay(&mut editor, &mut controller, &script.commands);
        session.save(&mut editor).await?;
        session.close();

        Ok::<_, Box<dyn std::error::Error>>(Summary {
            design_id: session.design_id().to_string(),
            layers: editor.layers().len(),
            zoom: editor.document().zoom(),
            history_entries: editor.history().len(),
            stats,
        })
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let summary = run(args)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
