use std::{env, env::VarError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server. This is what happens when no arguments are given.
    Serve,
    /// Apply any outstanding database migrations and exit.
    Migrate,
    /// Print help and exit.
    Help,
}

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> Command {
    let args = env::args().skip(1).collect::<Vec<String>>();
    let command = parse_command(&args);
    if command == Command::Help {
        display_readme();
        display_envs();
    }
    command
}

fn parse_command(args: &[String]) -> Command {
    match args {
        [] => Command::Serve,
        [arg] if arg == "migrate" => Command::Migrate,
        _ => Command::Help,
    }
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "UPG_HOST",
        "UPG_PORT",
        "UPG_DATABASE_URL",
        "UPG_PAYEE_VPA",
        "UPG_PAYEE_NAME",
        "UPG_UPI_SCHEME",
        "UPG_INTENT_PACKAGE",
        "UPG_PAYMENT_BRIDGE",
        "UPG_PAYMENT_GATEWAY_URL",
        "UPG_BRIDGE_TIMEOUT_SECS",
        "UPG_ACCESS_TOKEN_TTL_HOURS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
