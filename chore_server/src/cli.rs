use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are left out on purpose. Only list variables that are safe to print.
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "CHORE_HOST",
        "CHORE_PORT",
        "PORT",
        "CHORE_DATA_DIR",
        "CHORE_ALLOWED_ORIGINS",
        "CHORE_ENVIRONMENT",
        "CHORE_ROYALTY_RATE",
        "CHORE_WEBHOOK_ROYALTY_RATE",
        "CHORE_CHECKOUT_SUCCESS_URL",
        "CHORE_CHECKOUT_CANCEL_URL",
        "CHORE_STRIPE_CURRENCY",
        "CHORE_WEBHOOK_TOLERANCE_SECS",
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
