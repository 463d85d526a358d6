use clap::Subcommand;
use tracing::info;
use zinefocus_core::{Config, Database, FocusWorkspace, SystemClock, Ticker, TimerState};

use super::{open_database, print_report};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown for the selected project
    Start,
    /// Pause the countdown, keeping the remaining time
    Pause,
    /// Reset to a full, idle countdown
    Reset,
    /// End the session now and record the time spent
    Complete,
    /// Set the session length in minutes (1-120)
    Duration {
        minutes: u32,
    },
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground until it completes or Ctrl-C
    Watch,
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_database()?;
    if let TimerAction::Watch = action {
        return watch(&db, config);
    }

    let mut workspace = FocusWorkspace::open(&db, SystemClock, Ticker::detached(), config);
    let result = match action {
        TimerAction::Start => workspace.start(),
        TimerAction::Pause => {
            workspace.pause();
            Ok(())
        }
        TimerAction::Reset => {
            workspace.reset();
            Ok(())
        }
        TimerAction::Complete => {
            workspace.complete_now();
            Ok(())
        }
        TimerAction::Duration { minutes } => workspace.set_duration(minutes),
        TimerAction::Status | TimerAction::Watch => {
            workspace.tick();
            Ok(())
        }
    };

    // Catch-up work done while opening is reported even if the command failed.
    print_report(&mut workspace)?;
    result?;
    Ok(())
}

fn watch(db: &Database, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (ticker, mut ticks) = Ticker::new(config.timer.tick_interval());
        let mut workspace = FocusWorkspace::open(db, SystemClock, ticker, config);

        if workspace.state() != TimerState::Running {
            print_report(&mut workspace)?;
            return Ok(());
        }

        info!(remaining = %workspace.display(), "watching timer");
        loop {
            tokio::select! {
                tick = ticks.recv() => {
                    if tick.is_none() {
                        break;
                    }
                    workspace.tick();
                    if workspace.state() != TimerState::Running {
                        break;
                    }
                    println!("{}", workspace.display());
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("stopped watching; timer keeps running");
                    break;
                }
            }
        }

        print_report(&mut workspace)?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
