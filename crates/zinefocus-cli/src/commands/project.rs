//! Project selection and history commands for CLI.

use clap::Subcommand;
use zinefocus_core::{Config, FocusWorkspace, SwitchDecision, SystemClock, Ticker};

use super::{open_database, print_report};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Add {
        /// Project title
        title: String,
    },
    /// List all projects, active first
    List,
    /// Mark a project as finished
    Finish {
        id: String,
    },
    /// Select the project the timer credits
    Select {
        id: String,
    },
    /// Accept a pending switch to another project
    ConfirmSwitch,
    /// Keep the current project and dismiss the pending switch
    CancelSwitch,
    /// List recorded focus sessions
    Sessions {
        /// Only sessions for this project
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run(action: ProjectAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database()?;

    match action {
        ProjectAction::Add { title } => {
            let project = db.create_project(&title)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Finish { id } => {
            let project = db.finish_project(&id)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Select { id } => {
            let mut workspace = FocusWorkspace::open(&db, SystemClock, Ticker::detached(), config);
            let decision = workspace.select_project_by_id(&id);
            print_report(&mut workspace)?;
            if let SwitchDecision::Pending(project) = decision? {
                eprintln!(
                    "Timer is running on another project. Run `project confirm-switch` to credit \"{}\" instead, or `project cancel-switch` to keep going.",
                    project.title
                );
            }
        }
        ProjectAction::ConfirmSwitch => {
            let mut workspace = FocusWorkspace::open(&db, SystemClock, Ticker::detached(), config);
            if workspace.confirm_switch().is_none() {
                eprintln!("no project switch is pending");
            }
            print_report(&mut workspace)?;
        }
        ProjectAction::CancelSwitch => {
            let mut workspace = FocusWorkspace::open(&db, SystemClock, Ticker::detached(), config);
            workspace.cancel_switch();
            print_report(&mut workspace)?;
        }
        ProjectAction::Sessions { project } => {
            let sessions = db.list_focus_sessions(project.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
