//! Client CLI configuration: `[--host H] [--port P] [FILE]`. Parsed by
//! hand, same as `pinball-relay`'s `RelayConfig`.

pub const DEFAULT_PORT: u16 = 10987;
pub const DEFAULT_BOARD_FILE: &str = "boards/default.fb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `None` means standalone: no relay connection is attempted.
    pub host: Option<String>,
    pub port: u16,
    pub file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig { host: None, port: DEFAULT_PORT, file: DEFAULT_BOARD_FILE.to_string() }
    }
}

impl ClientConfig {
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<ClientConfig, String> {
        let mut config = ClientConfig::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--host" => {
                    config.host = Some(iter.next().ok_or("--host requires a value")?);
                }
                "--port" => {
                    let value = iter.next().ok_or("--port requires a value")?;
                    config.port = value.parse().map_err(|_| format!("invalid port: {value}"))?;
                }
                other if other.starts_with("--") => {
                    return Err(format!("unrecognized flag: {other}"));
                }
                other => {
                    config.file = other.to_string();
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be nonzero".to_string());
        }
        if self.file.is_empty() {
            return Err("board file path must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_standalone() {
        let config = ClientConfig::default();
        assert!(config.host.is_none());
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn parses_host_port_and_file() {
        let config = ClientConfig::from_args(vec![
            "--host".to_string(),
            "relay.example".to_string(),
            "--port".to_string(),
            "9000".to_string(),
            "boards/mine.fb".to_string(),
        ])
        .unwrap();
        assert_eq!(config.host.as_deref(), Some("relay.example"));
        assert_eq!(config.port, 9000);
        assert_eq!(config.file, "boards/mine.fb");
    }

    #[test]
    fn unrecognized_flag_is_an_error() {
        assert!(ClientConfig::from_args(vec!["--bogus".to_string()]).is_err());
    }

    #[test]
    fn missing_host_value_is_an_error() {
        assert!(ClientConfig::from_args(vec!["--host".to_string()]).is_err());
    }
}
