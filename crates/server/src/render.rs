//! HTML view of the log.

use chrono::{DateTime, Local, Utc};
use minijinja::{Environment, context};
use serde::Serialize;
use storage::{EventKind, Severity, StoredRecord};

const TABLE_TEMPLATE: &str = include_str!("../templates/table.html");
const TIME_FORMAT: &str = "%I:%M:%S %p %a %b %d, %Y";

/// One table row as the template sees it.
#[derive(Debug, Serialize)]
struct Row {
    tag: String,
    event: &'static str,
    severity: &'static str,
    time: String,
}

/// Render the log as a table, one row per record, in the order given.
///
/// `describe` supplies the event text and row class. The template name ends in
/// `.html`, so minijinja escapes every interpolated value.
pub fn log_page(
    records: &[StoredRecord],
    describe: fn(EventKind) -> (&'static str, Severity),
) -> Result<String, minijinja::Error> {
    let rows: Vec<Row> = records
        .iter()
        .map(|stored| {
            let (event, severity) = describe(stored.record.kind);
            Row {
                tag: stored.record.tag.to_string(),
                event,
                severity: severity.as_str(),
                time: local_time(stored.record.timestamp),
            }
        })
        .collect();

    let mut env = Environment::new();
    env.add_template("table.html", TABLE_TEMPLATE)?;
    env.get_template("table.html")?.render(context! { rows })
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIME_FORMAT).to_string()
}
