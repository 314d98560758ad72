//! Startup banner

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;

/// Print the startup banner with endpoint URLs
pub fn print_banner(config: &AppConfig) {
    let host = config.server.host.as_str();
    let port = config.server.port;
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };
    let base = format!("http://{}:{}", display_host, port);

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    const W: usize = 12;
    println!("  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}/api/issues", "Issue API:", base);
    println!("  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}/api/log", "Logger API:", base);
    println!("  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}/health/ready", "Health:", base);

    if config.auth.key.is_none() {
        println!(
            "  \x1b[31m➜  {:<W$} no API key configured, issue routes reject every request\x1b[0m",
            "Auth:"
        );
    }
    if config.logs.auth_code.is_none() {
        println!(
            "  \x1b[31m➜  {:<W$} no auth code configured, log submissions are rejected\x1b[0m",
            "Logs:"
        );
    }
    if host == "127.0.0.1" || host == "localhost" {
        println!("  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m", "Network:");
    }
    println!(
        "  \x1b[90m➜  {:<W$} {}\x1b[0m",
        "Log files:",
        config.logs.root_dir().display()
    );
    println!();
}
