use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};
use std::path::PathBuf;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn role_values() -> ValueParser {
    ValueParser::from(["admin", "doctor", "patient"])
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("cabinet-session")
        .about("Session and role-based access for the Cabinet Medical portal")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Portal API base URL, example: http://localhost:5000/api")
                .default_value("http://localhost:5000/api")
                .env("CABINET_SESSION_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory holding the persisted session")
                .default_value(".cabinet-session")
                .env("CABINET_SESSION_STATE_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Backend request timeout in seconds")
                .default_value("5")
                .env("CABINET_SESSION_TIMEOUT")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("CABINET_SESSION_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and persist the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .env("CABINET_SESSION_EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("CABINET_SESSION_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and persist the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .required(true),
                )
                .arg(
                    Arg::new("first-name")
                        .long("first-name")
                        .help("Given name")
                        .required(true),
                )
                .arg(
                    Arg::new("last-name")
                        .long("last-name")
                        .help("Family name")
                        .required(true),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Account role")
                        .default_value("patient")
                        .value_parser(role_values()),
                ),
        )
        .subcommand(Command::new("logout").about("Clear the persisted session"))
        .subcommand(Command::new("status").about("Show the persisted session"))
        .subcommand(
            Command::new("refresh").about("Exchange the refresh token for a new access token"),
        )
        .subcommand(
            Command::new("guard")
                .about("Evaluate a navigation request against the current session")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .help("Target path of the navigation")
                        .required(true),
                )
                .arg(
                    Arg::new("require")
                        .long("require")
                        .help("Role required by the target route")
                        .value_parser(role_values()),
                ),
        )
}
