pub mod config;
pub mod project;
pub mod timer;

use serde_json::json;
use zinefocus_core::{Clock, Database, FocusSessionSink, FocusWorkspace, KvStore, ProjectStore};

/// Print what an invocation did and where the timer stands now, as one
/// JSON document on stdout.
pub fn print_report<B, C>(
    workspace: &mut FocusWorkspace<B, C>,
) -> Result<(), Box<dyn std::error::Error>>
where
    B: KvStore + ProjectStore + FocusSessionSink + Clone,
    C: Clock,
{
    let report = json!({
        "events": workspace.take_events(),
        "status": workspace.status(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn open_database() -> Result<Database, Box<dyn std::error::Error>> {
    Ok(Database::open()?)
}
