use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names accepted by `GYMDESK_LOG_LEVEL`, in the order of their `-v` count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a `-v` count (0-5) or a level name and yields the count.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        if let Ok(count) = level.trim().parse::<u8>() {
            return if count <= 5 {
                Ok(count)
            } else {
                Err(format!("log level {count} is out of range (0-5)"))
            };
        }

        let lowered = level.trim().to_ascii_lowercase();
        LEVEL_NAMES
            .iter()
            .position(|name| *name == lowered)
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| {
                format!(
                    "unknown log level {level}, expected one of {}",
                    LEVEL_NAMES.join(", ")
                )
            })
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more on stderr: -v warn, -vv info, -vvv debug, -vvvv trace")
            .long_help(
                "Log more on stderr. -vv shows refresh cycles, -vvv adds every response and replay. GYMDESK_LOG_LEVEL takes a level name or a count from 0 to 5.",
            )
            .env("GYMDESK_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
