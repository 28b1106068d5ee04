use crate::calendar::CalendarDocument;
use crate::config::{ConfigLoadError, Settings, EXAMPLE_CONFIG};
use crate::email_sender::{MailError, Mailer};
use crate::options::Opt;
use anyhow::Context;
use lettre::Transport;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub const REMINDER_PREFIX: &str = "Reminder: ";

/// How a run ended, short of a transport or calendar error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Number of reminder mails handed to the transport.
    Sent(usize),
    /// The config file was unusable; nothing was sent.
    ConfigError,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Sent(_) => 0,
            Outcome::ConfigError => 1,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

/// Loads the settings at `config_path`, connects through `connect` and sends
/// every planned reminder. A bad config file is reported with the example
/// config and stops the run before any connection is made.
pub fn execute<T, F>(opt: &Opt, config_path: &Path, program: &str, connect: F) -> anyhow::Result<Outcome>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
    F: FnOnce(&Settings) -> Result<Mailer<T>, MailError>,
{
    let settings = match Settings::load(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", config_failure_report(config_path, &e));
            return Ok(Outcome::ConfigError);
        }
    };
    debug!("Loaded settings: {:?}", settings);

    let mailer = connect(&settings)?;
    let sent = run(opt, &settings, &mailer, program)?;
    Ok(Outcome::Sent(sent.len()))
}

pub fn config_failure_report(config_path: &Path, err: &ConfigLoadError) -> String {
    format!(
        "Unable to parse config file: {}\nUnable to read config file {}.\n\nExample config:\n{}",
        err,
        config_path.display(),
        EXAMPLE_CONFIG
    )
}

/// One mail to send: the day offset and the event summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub days: i64,
    pub summary: String,
}

/// The primary reminder, followed by the halfway one when `-r` is given.
pub fn plan(opt: &Opt) -> Vec<PlannedReminder> {
    let mut planned = vec![PlannedReminder {
        days: opt.days,
        summary: opt.message.clone(),
    }];
    if opt.reminder {
        // i64 division truncates toward zero
        planned.push(PlannedReminder {
            days: opt.days / 2,
            summary: format!("{}{}", REMINDER_PREFIX, opt.message),
        });
    }
    planned
}

/// Builds and sends every planned reminder in order. A failure stops the run;
/// mails already sent stay sent. Returns the documents that went out.
pub fn run<T>(
    opt: &Opt,
    settings: &Settings,
    mailer: &Mailer<T>,
    program: &str,
) -> anyhow::Result<Vec<CalendarDocument>>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let mut sent = Vec::new();
    for (index, planned) in plan(opt).iter().enumerate() {
        let document = CalendarDocument::create_events(planned.days, &planned.summary, &settings.from)?;

        if let Some(path) = &opt.ics {
            let path = ics_path(path, index);
            document
                .write_to(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }

        mailer
            .send_document(&document, &opt.message, &settings.from, &opt.to, program)
            .with_context(|| format!("sending reminder '{}'", planned.summary))?;
        sent.push(document);
    }
    Ok(sent)
}

/// `--ics` path for the n-th document: the path itself first, then
/// `<stem>-reminder.<ext>` beside it.
fn ics_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "calendar".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{}-reminder.{}", stem, ext.to_string_lossy()),
        None => format!("{}-reminder", stem),
    };
    base.with_file_name(name)
}
