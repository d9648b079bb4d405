use anyhow::Result;
use opentechcalendar_core::Importer;

pub fn run(importer: &Importer) -> Result<()> {
    for group_id in importer.list_importable_group_ids()? {
        println!("{}", group_id);
    }

    Ok(())
}
