use anyhow::Result;
use opentechcalendar_core::Importer;

use crate::render::Render;
use crate::utils::tui::import_spinner;

pub async fn run(importer: &Importer, group_id: &str) -> Result<()> {
    let spinner = import_spinner(group_id, None)?;
    let result = importer.import_group(group_id).await;
    spinner.finish_and_clear();

    let report = result?;
    println!("{}", report.render());

    if !report.is_success() {
        anyhow::bail!(
            "{} event(s) in group '{}' could not be imported",
            report.failures.len(),
            group_id
        );
    }

    Ok(())
}
