use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context as _;
use url::Url;

const ENV_TOKEN: &str = "TG_BOT_TOKEN";
const ENV_POLL_TIMEOUT: &str = "POLL_TIMEOUT";
const ENV_LISTEN: &str = "LISTEN_IP";
const ENV_WEBHOOK: &str = "WEBHOOK";
const ENV_WEBHOOK_PORT: &str = "PORT";
const ENV_CERT: &str = "CERT";
const ENV_DEBUG: &str = "DEBUG";
const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT";

const DEFAULT_POLL_TIMEOUT: u64 = 30;
const DEFAULT_WEBHOOK_PORT: u16 = 8000;
const DEFAULT_HTTP_TIMEOUT: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Polling {
        timeout: Duration,
    },
    Webhook {
        url: Url,
        listen_addr: SocketAddr,
        certificate: Option<PathBuf>,
    },
}

#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub debug: bool,
    pub http_timeout: Duration,
    pub mode: Mode,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; malformed numbers fall back to
    /// their defaults, a missing token or a broken webhook setup is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let token = var(ENV_TOKEN).with_context(|| {
            format!("`{ENV_TOKEN}` is not found in environment - specify it in `.env` file or pass it while launching")
        })?;

        let debug = var(ENV_DEBUG).is_some_and(|v| parse_bool(&v));

        let http_timeout = Duration::from_secs(
            var(ENV_HTTP_TIMEOUT)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT),
        );

        let mode = match var(ENV_WEBHOOK) {
            None => Mode::Polling {
                timeout: Duration::from_secs(
                    var(ENV_POLL_TIMEOUT)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(DEFAULT_POLL_TIMEOUT),
                ),
            },
            Some(webhook) => {
                let port = var(ENV_WEBHOOK_PORT)
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(DEFAULT_WEBHOOK_PORT);

                let url = webhook
                    .replace("{PORT}", &port.to_string())
                    .replace("{TOKEN}", &token);
                let url = Url::parse(&url)
                    .with_context(|| format!("`{ENV_WEBHOOK}` is not a valid URL"))?;

                let ip = match var(ENV_LISTEN) {
                    Some(ip) => ip
                        .parse::<IpAddr>()
                        .with_context(|| format!("`{ENV_LISTEN}` is not a valid IP address"))?,
                    None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                };

                Mode::Webhook {
                    url,
                    listen_addr: SocketAddr::new(ip, port),
                    certificate: var(ENV_CERT).map(PathBuf::from),
                }
            }
        };

        Ok(BotConfig {
            token,
            debug,
            http_timeout,
            mode,
        })
    }
}

/// Loads `.env` from the working directory, falling back to the directory above the
/// executable. Returns the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    let fallback = std::env::current_exe()
        .ok()
        .and_then(|exe| Some(exe.parent()?.parent()?.join(".env")))?;

    dotenvy::from_path(&fallback).ok().map(|_| fallback)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value,
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "y" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<BotConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = config(&[]).err().unwrap();

        assert!(err.to_string().contains(ENV_TOKEN));
        assert!(config(&[(ENV_TOKEN, "  ")]).is_err());
    }

    #[test]
    fn defaults_to_polling() {
        let cfg = config(&[(ENV_TOKEN, "123:abc")]).unwrap();

        assert_eq!(cfg.token, "123:abc");
        assert!(!cfg.debug);
        assert_eq!(cfg.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT));
        assert_eq!(
            cfg.mode,
            Mode::Polling {
                timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT)
            }
        );
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let cfg = config(&[
            (ENV_TOKEN, "t"),
            (ENV_POLL_TIMEOUT, "soon"),
            (ENV_HTTP_TIMEOUT, "-1"),
        ])
        .unwrap();

        assert_eq!(
            cfg.mode,
            Mode::Polling {
                timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT)
            }
        );
        assert_eq!(cfg.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT));
    }

    #[test]
    fn custom_poll_timeout() {
        let cfg = config(&[(ENV_TOKEN, "t"), (ENV_POLL_TIMEOUT, "60")]).unwrap();

        assert_eq!(
            cfg.mode,
            Mode::Polling {
                timeout: Duration::from_secs(60)
            }
        );
    }

    #[test]
    fn debug_flag() {
        for value in ["1", "true", "TRUE", "t"] {
            assert!(config(&[(ENV_TOKEN, "t"), (ENV_DEBUG, value)]).unwrap().debug);
        }

        for value in ["0", "false", "nope"] {
            assert!(!config(&[(ENV_TOKEN, "t"), (ENV_DEBUG, value)]).unwrap().debug);
        }
    }

    #[test]
    fn webhook_substitutes_placeholders() {
        let cfg = config(&[
            (ENV_TOKEN, "123:abc"),
            (ENV_WEBHOOK, "https://bot.example.com:{PORT}/{TOKEN}"),
            (ENV_WEBHOOK_PORT, "8443"),
            (ENV_LISTEN, "127.0.0.1"),
            (ENV_CERT, "cert.pem"),
        ])
        .unwrap();

        assert_eq!(
            cfg.mode,
            Mode::Webhook {
                url: Url::parse("https://bot.example.com:8443/123:abc").unwrap(),
                listen_addr: "127.0.0.1:8443".parse().unwrap(),
                certificate: Some(PathBuf::from("cert.pem")),
            }
        );
    }

    #[test]
    fn webhook_defaults() {
        let cfg = config(&[
            (ENV_TOKEN, "t"),
            (ENV_WEBHOOK, "https://bot.example.com/hook"),
            (ENV_WEBHOOK_PORT, "not a port"),
        ])
        .unwrap();

        assert_eq!(
            cfg.mode,
            Mode::Webhook {
                url: Url::parse("https://bot.example.com/hook").unwrap(),
                listen_addr: SocketAddr::new(
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    DEFAULT_WEBHOOK_PORT
                ),
                certificate: None,
            }
        );
    }

    #[test]
    fn invalid_webhook_setup_is_an_error() {
        assert!(config(&[(ENV_TOKEN, "t"), (ENV_WEBHOOK, "not a url")]).is_err());
        assert!(config(&[
            (ENV_TOKEN, "t"),
            (ENV_WEBHOOK, "https://bot.example.com/hook"),
            (ENV_LISTEN, "localhost:80"),
        ])
        .is_err());
    }
}
