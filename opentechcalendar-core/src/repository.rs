//! Read-only access to group configuration in the SQLite data store.
//!
//! The database is built from the calendar's data repository by other
//! tooling; we only ever query it.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use crate::error::{ImportError, ImportResult};
use crate::filter::KeywordRules;
use crate::group::{Group, ImportType, Policy};

const IMPORTABLE_GROUP_IDS: &str = "SELECT id FROM record_group \
     WHERE field_import_type != '' AND field_import_type IS NOT NULL \
     ORDER BY id ASC";

const GROUP_BY_ID: &str = "SELECT id, field_import_type, field_import_url, field_url, \
     field_timezone, field_place, field_country, field_code_of_conduct_url, field_in_person, \
     field_community_participation_at_event, \
     field_community_participation_at_event_audience_text, \
     field_community_participation_at_event_audience_audio \
     FROM record_group WHERE id = ?1";

const INCLUDE_KEYWORDS: &str =
    "SELECT value FROM record_group___field_import_include WHERE record_id = ?1";

const EXCLUDE_KEYWORDS: &str =
    "SELECT value FROM record_group___field_import_exclude WHERE record_id = ?1";

pub struct GroupRepository {
    conn: Connection,
}

impl GroupRepository {
    /// Open the database read-only.
    pub fn open(path: &Path) -> ImportResult<Self> {
        if !path.exists() {
            return Err(ImportError::Config(format!(
                "SQLite database {} does not exist",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        GroupRepository { conn }
    }

    /// Ids of groups with an import type set, ascending.
    pub fn importable_group_ids(&self) -> ImportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(IMPORTABLE_GROUP_IDS)?;
        let ids = stmt
            .query_map(params![], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    pub fn group(&self, group_id: &str) -> ImportResult<Group> {
        self.conn
            .query_row(GROUP_BY_ID, params![group_id], group_from_row)
            .optional()?
            .ok_or_else(|| ImportError::GroupNotFound(group_id.to_string()))
    }

    pub fn include_keywords(&self, group_id: &str) -> ImportResult<Vec<String>> {
        self.keywords(INCLUDE_KEYWORDS, group_id)
    }

    pub fn exclude_keywords(&self, group_id: &str) -> ImportResult<Vec<String>> {
        self.keywords(EXCLUDE_KEYWORDS, group_id)
    }

    pub fn keyword_rules(&self, group_id: &str) -> ImportResult<KeywordRules> {
        Ok(KeywordRules::new(
            self.include_keywords(group_id)?,
            self.exclude_keywords(group_id)?,
        ))
    }

    fn keywords(&self, sql: &str, group_id: &str) -> ImportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map(params![group_id], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values.into_iter().flatten().collect())
    }
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    let import_type: Option<String> = row.get("field_import_type")?;
    let policy = |column: &str| -> rusqlite::Result<Policy> {
        let value: Option<String> = row.get(column)?;
        Ok(Policy::from_field(value.as_deref()))
    };

    Ok(Group {
        id: row.get("id")?,
        import_type: ImportType::from_field(import_type.as_deref()),
        import_url: row.get::<_, Option<String>>("field_import_url")?.unwrap_or_default(),
        url: row.get("field_url")?,
        timezone: row.get("field_timezone")?,
        place: row.get("field_place")?,
        country: row.get("field_country")?,
        code_of_conduct_url: row.get("field_code_of_conduct_url")?,
        in_person: policy("field_in_person")?,
        community_participation_at_event: policy("field_community_participation_at_event")?,
        community_participation_at_event_audience_text: policy(
            "field_community_participation_at_event_audience_text",
        )?,
        community_participation_at_event_audience_audio: policy(
            "field_community_participation_at_event_audience_audio",
        )?,
    })
}
