use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "calendar.cfg";
pub const DEFAULT_DAYS: i64 = 14;

const AFTER_HELP: &str = "\
This program creates an iCal format reminder and mails it to the recipients.

Example:
    make-calendar-reminder -d 14 -m \"WGLC finishes for draft-opsec-foo-bar-01\" -t bob@example.com -r
       Creates an iCal reminder in 14 days to end WGLC.
       Also adds a reminder in 7 days.";

/// Command line options. Parsed once in `main` and passed down explicitly.
#[derive(Debug, Parser, Clone)]
#[command(name = "make-calendar-reminder", version, about = "Mail an iCal reminder", after_help = AFTER_HELP)]
pub struct Opt {
    /// In how many days to create the reminder
    #[arg(short, long, default_value_t = DEFAULT_DAYS, allow_negative_numbers = true)]
    pub days: i64,

    /// Text for the reminder
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    pub message: String,

    /// Email address(es) to send the reminder to, comma separated
    #[arg(short, long, value_parser = NonEmptyStringValueParser::new())]
    pub to: String,

    /// Also send a reminder halfway between now and the event.
    /// NOTE: gMail does not deal with multiple events in one iCal attachment,
    /// so the reminder goes out as a separate mail.
    #[arg(short, long)]
    pub reminder: bool,

    /// INI format config file, relative to the program's directory unless absolute
    #[arg(short, long, value_parser, default_value_os_t = DEFAULT_CONFIG_PATH.into())]
    pub config: PathBuf,

    /// Also write the generated iCal document(s) to this file
    #[arg(long, value_name = "PATH")]
    pub ics: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv also logs each outgoing message)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Opt {
    /// Log filter implied by `-v` flags; `RUST_LOG` still wins when set.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
