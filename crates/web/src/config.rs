use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    pub max_connections: u32,
    pub score_cache_enabled: bool,
    pub listen_for_changes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            max_connections: match std::env::var("DATABASE_MAX_CONNECTIONS") {
                Ok(value) => value
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
                Err(_) => 10,
            },
            score_cache_enabled: parse_flag(std::env::var("SCORE_CACHE_ENABLED").ok(), true)
                .context("SCORE_CACHE_ENABLED must be true or false")?,
            listen_for_changes: parse_flag(std::env::var("LISTEN_FOR_CHANGES").ok(), true)
                .context("LISTEN_FOR_CHANGES must be true or false")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_fall_back_to_default() {
        assert!(parse_flag(None, true).unwrap());
        assert!(!parse_flag(None, false).unwrap());
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag(Some("TRUE".to_string()), false).unwrap());
        assert!(parse_flag(Some(" on ".to_string()), false).unwrap());
        assert!(!parse_flag(Some("0".to_string()), true).unwrap());
        assert!(parse_flag(Some("maybe".to_string()), true).is_err());
    }
}
