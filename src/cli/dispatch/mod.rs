use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::Role;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Turn parsed arguments into an [`Action`] plus the resolved globals.
///
/// # Errors
///
/// Returns an error if a required argument is missing or a role value
/// cannot be parsed.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut globals = GlobalArgs::new(required_string(matches, "api-url")?);

    if let Some(state_dir) = matches.get_one::<PathBuf>("state-dir") {
        globals.state_dir.clone_from(state_dir);
    }

    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        globals.timeout = *timeout;
    }

    let action = match matches.subcommand() {
        Some(("login", sub)) => Action::Login {
            email: required_string(sub, "email")?,
            password: required_string(sub, "password")?,
        },
        Some(("register", sub)) => Action::Register {
            email: required_string(sub, "email")?,
            password: required_string(sub, "password")?,
            first_name: required_string(sub, "first-name")?,
            last_name: required_string(sub, "last-name")?,
            role: parse_role(sub.get_one::<String>("role"))?,
        },
        Some(("logout", _)) => Action::Logout,
        Some(("status", _)) => Action::Status,
        Some(("refresh", _)) => Action::Refresh,
        Some(("guard", sub)) => Action::Guard {
            path: required_string(sub, "path")?,
            required_role: parse_role(sub.get_one::<String>("require"))?,
        },
        _ => return Err(anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}

fn required_string(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(String::to_string)
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

fn parse_role(value: Option<&String>) -> Result<Option<Role>> {
    value
        .map(|role| role.parse::<Role>().map_err(|e| anyhow!(e)))
        .transpose()
}
