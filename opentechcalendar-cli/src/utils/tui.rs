use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Spinner on stderr while a group imports, e.g. `[2/7] Importing rust-ldn - 3s`.
///
/// `position` is the group's place in an `importall` run. indicatif hides the
/// spinner when stderr isn't a terminal.
pub fn import_spinner(group_id: &str, position: Option<(usize, usize)>) -> Result<ProgressBar> {
    let message = match position {
        Some((n, total)) => format!("[{n}/{total}] Importing {group_id}"),
        None => format!("Importing {group_id}"),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{msg} {spinner} {elapsed:.dim}")?
            .tick_strings(&["-", "\\", "|", "/"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(TICK_INTERVAL);
    Ok(spinner)
}
