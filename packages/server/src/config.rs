//! Process configuration.
//!
//! Values come from command-line flags or, failing that, the environment
//! (`PORT`, `HEARTBEAT`, `HOST`). `PORT` and `HEARTBEAT` are required; clap
//! exits before anything is bound when either is missing or malformed.

use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hibiki-server")]
#[command(about = "WebSocket fan-out relay with heartbeat liveness", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT")]
    pub port: u16,

    /// Heartbeat interval in milliseconds
    #[arg(long, env = "HEARTBEAT", value_parser = parse_heartbeat)]
    pub heartbeat: Duration,
}

/// Parse a heartbeat interval given in milliseconds. Zero is rejected.
pub fn parse_heartbeat(value: &str) -> Result<Duration, String> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of milliseconds", value))?;
    if millis == 0 {
        return Err("heartbeat interval must be greater than zero".to_string());
    }
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        ServerConfig::command().debug_assert();
    }

    #[test]
    fn test_port_and_heartbeat_are_required() {
        let command = ServerConfig::command();
        let required: Vec<_> = command
            .get_arguments()
            .filter(|arg| arg.is_required_set())
            .map(|arg| arg.get_id().as_str().to_string())
            .collect();

        assert!(required.contains(&"port".to_string()));
        assert!(required.contains(&"heartbeat".to_string()));
        assert!(!required.contains(&"host".to_string()));
    }

    #[test]
    fn test_parse_from_flags() {
        let config = ServerConfig::try_parse_from([
            "hibiki-server",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--heartbeat",
            "30000",
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.heartbeat, Duration::from_millis(30000));
    }

    #[test]
    fn test_parse_heartbeat() {
        assert_eq!(parse_heartbeat("1500"), Ok(Duration::from_millis(1500)));
        assert!(parse_heartbeat("0").is_err());
        assert!(parse_heartbeat("-5").is_err());
        assert!(parse_heartbeat("30s").is_err());
    }
}
