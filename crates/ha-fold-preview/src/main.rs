//! Fold row preview
//!
//! Loads a fold row configuration from YAML and, optionally, a `get_states`
//! dump (JSON array of entity states), then walks the row through one
//! open/close cycle with the in-process host, logging each render.
//!
//! ```text
//! fold-preview dashboards/fold.yaml states.json
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ha_core::{Hass, HassEntity};
use ha_fold_row::memory::MemoryHost;
use ha_fold_row::{define_fold_row, ElementRegistry, FoldEntityRow, Placement, FOLD_ROW_ELEMENT};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Height each child row takes up in the preview layout
const ROW_HEIGHT_PX: f64 = 40.0;

const USAGE: &str = "usage: fold-preview <row.yaml> [states.json]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let config_path = args.next().context(USAGE)?;
    let states_path = args.next();

    let path = Path::new(&config_path);
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file = path.file_name().context(USAGE)?;
    let raw = ha_config::load_row_config(config_dir, file)
        .with_context(|| format!("loading {}", config_path))?;

    let registry = ElementRegistry::new();
    define_fold_row(&registry);

    let host = MemoryHost::new();
    let row = registry
        .create(FOLD_ROW_ELEMENT, host.fold_host())
        .context("fold row element is not defined")?;
    row.set_config(&raw)?;

    if let Placement::Detached { .. } = row.connected().await {
        warn!("Previewing a fold row outside of a card");
    }

    if let Some(states_path) = states_path {
        let hass = load_states(Path::new(&states_path))?;
        info!(entities = hass.entity_count(), "Loaded states");
        row.set_hass(Arc::new(hass)).await;
    }

    require_states(&row)?;
    report("configured", &row);

    let rows = row.load_rows().await?;
    host.set_content_height(rows.len() as f64 * ROW_HEIGHT_PX);

    for step in ["first toggle", "second toggle"] {
        row.toggle().await?;
        report(step, &row);
        row.transition_end();
        report("transition end", &row);
    }

    Ok(())
}

/// Group-sourced child rows can only be resolved from a states dump
fn require_states(row: &FoldEntityRow) -> Result<()> {
    let needs_hass = row
        .config()
        .is_some_and(|config| config.item_source().needs_hass());
    if needs_hass && row.hass().is_none() {
        bail!("child rows come from a group entity, pass a states file\n{}", USAGE);
    }
    Ok(())
}

fn load_states(path: &Path) -> Result<Hass> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let states: Vec<HassEntity> = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Hass::from_states(states))
}

fn report(step: &str, row: &FoldEntityRow) {
    let Some(view) = row.render() else {
        warn!(step, "Nothing to render");
        return;
    };

    info!(
        step,
        phase = ?row.phase(),
        expanded = view.container.aria_expanded,
        height = %view.container.height,
        overflow = %view.container.overflow,
        mounted = view.rows.len(),
        "Rendered fold row"
    );
    for child in &view.rows {
        info!(
            step,
            entity = child.config().entity().unwrap_or("-"),
            "  child row"
        );
    }
}
