use anyhow::Result;
use opentechcalendar_core::Importer;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::tui::import_spinner;

/// Import each group in turn. A failing group doesn't stop the others.
pub async fn run(importer: &Importer) -> Result<()> {
    let group_ids = importer.list_importable_group_ids()?;
    let mut failed_groups = Vec::new();

    for (i, group_id) in group_ids.iter().enumerate() {
        let spinner = import_spinner(group_id, Some((i + 1, group_ids.len())))?;
        let result = importer.import_group(group_id).await;
        spinner.finish_and_clear();

        match result {
            Ok(report) => {
                println!("{}", report.render());
                if !report.is_success() {
                    failed_groups.push(group_id.clone());
                }
            }
            Err(e) => {
                println!("{}", group_id.bold());
                println!("   {}", e.to_string().red());
                failed_groups.push(group_id.clone());
            }
        }

        // Add spacing between groups (but not after the last one)
        if i < group_ids.len() - 1 {
            println!();
        }
    }

    if !failed_groups.is_empty() {
        anyhow::bail!(
            "{} of {} groups had problems: {}",
            failed_groups.len(),
            group_ids.len(),
            failed_groups.join(", ")
        );
    }

    Ok(())
}
