use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use herald_core::Store;
use herald_models::ContentKind;

use crate::commands::load_context;
use crate::output::Output;

pub async fn run_status(out: &Output) -> Result<()> {
    let ctx = load_context()?;
    let db_path = ctx.database_path();
    if !db_path.exists() {
        out.warn(format!(
            "No ledger database at {} yet; run 'herald serve' or 'herald baseline' first",
            db_path.display()
        ));
        return Ok(());
    }
    let store = Store::connect(&db_path)
        .await
        .map_err(|e| eyre!("Failed to open ledger database: {}", e))?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Ledger", "Rows"]);
    for kind in [
        ContentKind::Movie,
        ContentKind::Album,
        ContentKind::Book,
        ContentKind::MusicVideo,
    ] {
        table.add_row(vec![
            format!("{} announced", kind.wire_name()),
            store.announced_count(kind).await?.to_string(),
        ]);
    }
    table.add_row(vec![
        "Content quality".to_string(),
        store.content_quality_count().await?.to_string(),
    ]);
    table.add_row(vec![
        "File history".to_string(),
        store.media_quality_count().await?.to_string(),
    ]);
    table.add_row(vec![
        "Season progress".to_string(),
        store.season_progress_count().await?.to_string(),
    ]);
    table.add_row(vec![
        "Suppression markers".to_string(),
        store.quality_update_marker_count().await?.to_string(),
    ]);

    out.println(table.to_string());
    store.close().await;
    Ok(())
}
