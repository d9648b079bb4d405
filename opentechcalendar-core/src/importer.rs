//! Group import: fetch → normalize → filter → write.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::fetch::Fetcher;
use crate::filter::Decision;
use crate::group::Group;
use crate::normalize::Normalizer;
use crate::repository::GroupRepository;
use crate::store::EventStore;

/// An event that could not be imported.
#[derive(Debug)]
pub struct EventFailure {
    /// `None` when the event was too malformed to have an id.
    pub event_id: Option<String>,
    pub error: ImportError,
}

/// What happened during one group import.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub group_id: String,
    /// Ids of written events, in source order.
    pub written: Vec<String>,
    /// Events turned down by the group's rules (past, excluded, not included).
    pub rejected: usize,
    /// Source entries that weren't events we import at all.
    pub skipped: usize,
    pub failures: Vec<EventFailure>,
}

impl ImportReport {
    fn new(group_id: &str) -> Self {
        ImportReport {
            group_id: group_id.to_string(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Importer {
    groups: GroupRepository,
    fetcher: Fetcher,
    store: EventStore,
}

impl Importer {
    pub fn new(config: &ImportConfig) -> ImportResult<Self> {
        Ok(Importer {
            groups: GroupRepository::open(&config.sqlite_database_filename)?,
            fetcher: Fetcher::from_config(config)?,
            store: EventStore::new(&config.data_directory),
        })
    }

    pub fn from_parts(groups: GroupRepository, fetcher: Fetcher, store: EventStore) -> Self {
        Importer {
            groups,
            fetcher,
            store,
        }
    }

    pub fn list_importable_group_ids(&self) -> ImportResult<Vec<String>> {
        self.groups.importable_group_ids()
    }

    /// Check one event against the group's keyword rules as currently stored.
    pub fn should_import(
        &self,
        group: &Group,
        title: &str,
        description: &str,
        end_at: DateTime<FixedOffset>,
    ) -> ImportResult<bool> {
        let rules = self.groups.keyword_rules(&group.id)?;
        Ok(rules.should_import(title, description, end_at, Utc::now()))
    }

    /// Import every event of one group.
    ///
    /// Lookup, fetch and document-level parse failures abort the group. A
    /// malformed event or a failed write is recorded in the report and the
    /// remaining events are still processed.
    pub async fn import_group(&self, group_id: &str) -> ImportResult<ImportReport> {
        let group = self.groups.group(group_id)?;
        let mut report = ImportReport::new(&group.id);

        let Some(import_type) = &group.import_type else {
            info!(group = %group.id, "Group has no import type, nothing to do");
            return Ok(report);
        };
        let Some(normalizer) = Normalizer::for_import_type(import_type) else {
            warn!(group = %group.id, %import_type, "Unsupported import type, skipping group");
            return Ok(report);
        };

        info!(group = %group.id, %import_type, url = %group.import_url, "Importing group");

        let rules = self.groups.keyword_rules(&group.id)?;
        let payload = self.fetcher.fetch(&group.import_url).await?;
        let batch = normalizer.normalize(&payload, &group)?;
        report.skipped = batch.skipped;

        for result in batch.events {
            let event = match result {
                Ok(event) => event,
                Err(error) => {
                    warn!(group = %group.id, %error, "Skipping malformed event");
                    report.failures.push(EventFailure {
                        event_id: None,
                        error,
                    });
                    continue;
                }
            };

            let decision = rules.decide(&event.title, &event.description, event.end_at, Utc::now());
            if decision != Decision::Accept {
                debug!(group = %group.id, event = %event.id, ?decision, "Not importing event");
                report.rejected += 1;
                continue;
            }

            match self.store.write(&event) {
                Ok(path) => {
                    debug!(group = %group.id, path = %path.display(), "Wrote event");
                    report.written.push(event.id);
                }
                Err(error) => {
                    warn!(group = %group.id, event = %event.id, %error, "Could not write event");
                    report.failures.push(EventFailure {
                        event_id: Some(event.id),
                        error,
                    });
                }
            }
        }

        info!(
            group = %group.id,
            written = report.written.len(),
            rejected = report.rejected,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Finished group"
        );

        Ok(report)
    }
}
