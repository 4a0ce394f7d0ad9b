pub mod client;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_VERIFY: &str = "verify";
pub const CMD_GET: &str = "get";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_LOGOUT: &str = "logout";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("gymdesk")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(verify())
        .subcommand(get())
        .subcommand(Command::new(CMD_WHOAMI).about("Show the cached user record"))
        .subcommand(Command::new(CMD_LOGOUT).about("Forget the cached user record"));

    let command = client::with_args(command);
    logging::with_args(command)
}

fn verify() -> Command {
    Command::new(CMD_VERIFY)
        .about("Verify the session the way a protected page does")
        .arg(
            Arg::new("admin")
                .long("admin")
                .help("Use the admin verification endpoint")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .help("Required user type (repeatable, any match passes)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("hydrate")
                .long("hydrate")
                .help("Cache the user record from the verify response when none is stored")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("denied-route")
                .long("denied-route")
                .help("Route reported when the user lacks the required role")
                .env("GYMDESK_DENIED_ROUTE")
                .default_value(crate::config::DEFAULT_DENIED_ROUTE),
        )
}

fn get() -> Command {
    Command::new(CMD_GET)
        .about("GET a backend path and print the JSON body")
        .arg(
            Arg::new("path")
                .help("Backend path, for example /admin/subscriptions")
                .required(true),
        )
        .arg(
            Arg::new("page")
                .long("page")
                .help("Page number")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .help("Rows per page")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(Arg::new("search").long("search").help("Search term"))
        .arg(
            Arg::new("filter")
                .long("filter")
                .help("Filter as KEY=VALUE (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(Arg::new("sort-by").long("sort-by").help("Sort field"))
        .arg(
            Arg::new("order")
                .long("order")
                .help("Sort order")
                .value_parser(["asc", "desc"])
                .requires("sort-by"),
        )
}
