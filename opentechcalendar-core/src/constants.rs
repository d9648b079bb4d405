/// Sent with every source fetch so organisers can tell who is calling.
pub const DEFAULT_USER_AGENT: &str = "Open Tech Calendar Tools https://opentechcalendar.co.uk/contact";

/// Timezone used when a group doesn't set one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Prefix for environment-variable configuration.
pub const ENV_PREFIX: &str = "OPEN_TECH_CALENDAR_TOOLS";

/// Directory (under the data directory) that holds one subdirectory per group.
pub const EVENT_DIR: &str = "event";
