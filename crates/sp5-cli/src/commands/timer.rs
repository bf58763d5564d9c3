use std::error::Error;
use std::time::Duration;

use chrono::Local;
use clap::Subcommand;
use serde::Serialize;
use sp5_core::storage::{self, Database};
use sp5_core::{
    Background, Badge, Clock, Command, Config, Message, Notification, Presenter, RecordStore,
    Response, Snapshot, SystemClock,
};
use tracing::{error, info, warn};

/// How long `watch` sleeps when nothing is scheduled, so alarms written by
/// other invocations are picked up.
const IDLE_POLL: Duration = Duration::from_secs(30);
const MIN_SLEEP: Duration = Duration::from_millis(50);

#[derive(Subcommand)]
pub enum TimerAction {
    /// Write the default record, discarding the current one
    Install,
    /// Start work, pause, or resume (the main button)
    Toggle,
    /// Stop everything and zero today's counter
    EndDay,
    /// Reset the counter if the calendar day changed
    CheckDate,
    /// End the current break early
    SkipBreak,
    /// End the current phase early; a skipped work session still counts
    SkipCycle,
    /// Count one work session by hand
    AddSp,
    /// Send a raw command name
    Send {
        /// Command name, e.g. "main_action"
        command: String,
    },
    /// Print the current state as JSON
    Status,
    /// Stay running and fire wake-ups on time
    Watch,
}

type CliBackground = Background<Database, Database, TerminalPresenter, SystemClock>;

/// Shows notifications and badge changes as they happen when `live`;
/// otherwise keeps the notifications for the JSON report.
pub struct TerminalPresenter {
    live: bool,
    notifications: Vec<Notification>,
    badge: Badge,
}

impl TerminalPresenter {
    fn new(live: bool) -> Self {
        Self {
            live,
            notifications: Vec::new(),
            badge: Badge::empty(),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn notify(&mut self, notification: &Notification) -> sp5_core::error::Result<()> {
        if self.live {
            println!(
                "[{}] {}: {}",
                Local::now().format("%H:%M"),
                notification.title,
                notification.message
            );
        } else {
            self.notifications.push(notification.clone());
        }
        Ok(())
    }

    fn set_badge(&mut self, badge: &Badge) -> sp5_core::error::Result<()> {
        if self.live && badge.text != self.badge.text {
            let text = if badge.text.is_empty() { "-" } else { &badge.text };
            println!("[{}] badge {text}", Local::now().format("%H:%M"));
        }
        self.badge = badge.clone();
        Ok(())
    }
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    response: &'a Response,
    notifications: &'a [Notification],
    /// `null` when the stored state cannot be read.
    snapshot: Option<Snapshot>,
}

fn open_background(live: bool) -> Result<CliBackground, Box<dyn Error>> {
    let config = Config::load_or_default();
    let path = storage::data_dir()?.join("sp5.db");
    Ok(Background::new(
        Database::open_at(&path)?,
        Database::open_at(&path)?,
        TerminalPresenter::new(live),
        SystemClock,
        config.settings(),
    ))
}

/// Install on first use and catch up on missed wake-ups.
fn start(background: &mut CliBackground) -> sp5_core::error::Result<()> {
    if background.store().load()?.is_none() {
        background.on_install()?;
    }
    background.on_startup()?;
    let fired = background.fire_due_alarms()?;
    if fired > 0 {
        info!(fired, "fired overdue wake-ups");
    }
    Ok(())
}

fn print_report(background: &CliBackground, response: &Response) -> Result<(), Box<dyn Error>> {
    let snapshot = match background.snapshot() {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(error = %e, "no snapshot for the report");
            None
        }
    };
    let report = Report {
        response,
        notifications: &background.presenter().notifications,
        snapshot,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Turn a driver failure into the error response.
fn respond(result: sp5_core::error::Result<()>) -> Response {
    match result {
        Ok(()) => Response::Ok,
        Err(e) => {
            error!(error = %e, "timer command failed");
            Response::error(&e)
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn Error>> {
    let message: Option<Message> = match action {
        TimerAction::Watch => return watch(),
        // Overwrites whatever is stored, so no startup pass first.
        TimerAction::Install => None,
        TimerAction::Toggle => Some(Command::MainAction.into()),
        TimerAction::EndDay => Some(Command::EndDay.into()),
        TimerAction::CheckDate | TimerAction::Status => Some(Command::CheckDate.into()),
        TimerAction::SkipBreak => Some(Command::SkipBreak.into()),
        TimerAction::SkipCycle => Some(Command::SkipCycle.into()),
        TimerAction::AddSp => Some(Command::AddSp.into()),
        TimerAction::Send { command } => Some(Message::new(command)),
    };

    let mut background = open_background(false)?;
    let response = match message {
        None => respond(background.on_install()),
        Some(message) => match start(&mut background) {
            Ok(()) => background.handle_message(&message),
            Err(e) => respond(Err(e)),
        },
    };
    print_report(&background, &response)?;

    match response {
        Response::Ok => Ok(()),
        Response::Error { message } => Err(message.into()),
    }
}

fn watch() -> Result<(), Box<dyn Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch_loop())
}

async fn watch_loop() -> Result<(), Box<dyn Error>> {
    let mut background = open_background(true)?;
    start(&mut background)?;
    info!("watching for wake-ups");

    loop {
        background.fire_due_alarms()?;
        let wait = match background.next_alarm()? {
            Some(alarm) => {
                let now = background.clock().now_ms();
                Duration::from_millis(alarm.scheduled_at_ms.saturating_sub(now))
            }
            None => IDLE_POLL,
        };

        tokio::select! {
            _ = tokio::time::sleep(wait.clamp(MIN_SLEEP, IDLE_POLL)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("stopped");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp5_core::NotificationKind;

    #[test]
    fn live_presenter_does_not_keep_notifications() {
        let mut live = TerminalPresenter::new(true);
        let mut report = TerminalPresenter::new(false);
        for _ in 0..3 {
            let notification = Notification {
                kind: NotificationKind::BreakEnd,
                title: "Break is over!".into(),
                message: "Ready for the next work cycle?".into(),
            };
            live.notify(&notification).unwrap();
            report.notify(&notification).unwrap();
        }
        assert!(live.notifications.is_empty());
        assert_eq!(report.notifications.len(), 3);
    }
}
