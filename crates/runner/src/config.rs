#![forbid(unsafe_code)]

use rp_core::entity::EntityType;
use rp_sync::{DEFAULT_API_BASE, HttpSourceConfig};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_S: u64 = 30;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("{flag} requires {what}")]
    MissingValue {
        flag: &'static str,
        what: &'static str,
    },
    #[error("{name} must be {expected} (got {value:?})")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("unknown entity type {0:?} (expected clients, forms or pricelists)")]
    UnknownEntity(String),
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct RunnerConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) api_base: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) entities: Vec<EntityType>,
    pub(crate) timeout_s: u64,
    pub(crate) max_rounds: Option<u32>,
    pub(crate) max_runtime_s: Option<u64>,
    pub(crate) status_only: bool,
    pub(crate) json: bool,
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("storage_dir", &self.storage_dir)
            .field("api_base", &self.api_base)
            .field("username", &self.username)
            .field("entities", &self.entities)
            .field("timeout_s", &self.timeout_s)
            .field("max_rounds", &self.max_rounds)
            .field("max_runtime_s", &self.max_runtime_s)
            .field("status_only", &self.status_only)
            .field("json", &self.json)
            .finish_non_exhaustive()
    }
}

impl RunnerConfig {
    pub(crate) fn http_source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            api_base: self.api_base.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: Duration::from_secs(self.timeout_s),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    Run(RunnerConfig),
}

pub(crate) fn usage() -> &'static str {
    "rp_runner — pull Repsly clients, forms and pricelists into a local SQLite store\n\n\
USAGE:\n\
  rp_runner --storage-dir DIR [--api-base URL] [--entities LIST]\n\
            [--timeout-s S] [--max-rounds N] [--max-runtime-s S] [--status] [--json]\n\n\
ENVIRONMENT:\n\
  REPSYNC_STORAGE_DIR, REPSYNC_API_BASE, REPSYNC_ENTITIES, REPSYNC_TIMEOUT_S,\n\
  REPSYNC_MAX_ROUNDS, REPSYNC_MAX_RUNTIME_S (flags override these)\n\
  REPSLY_USERNAME, REPSLY_PASSWORD (API credentials, required unless --status)\n\
  RUST_LOG (default: info)\n\n\
NOTES:\n\
  - LIST is comma separated: clients,forms,pricelists (default: all, in that order).\n\
  - Each run resumes from the stored checkpoints and stops once a round makes no progress.\n\
  - --max-runtime-s stops between pages; a page in flight always finishes.\n\
  - --status prints the stored checkpoints and exits.\n\
  - --json prints the status or the run report as one JSON document on stdout.\n"
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_args() -> Result<Command, ConfigError> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    parse_args_from(&args, env_var)
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    expected: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            expected,
            value: value.to_string(),
        })
}

fn parse_entities(value: &str) -> Result<Vec<EntityType>, ConfigError> {
    let mut out = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let entity =
            EntityType::parse(part).ok_or_else(|| ConfigError::UnknownEntity(part.to_string()))?;
        if !out.contains(&entity) {
            out.push(entity);
        }
    }
    if out.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: "entities",
            expected: "a non-empty list",
            value: value.to_string(),
        });
    }
    Ok(out)
}

/// Environment first, then flags. `env` is injected so tests stay hermetic.
fn parse_args_from(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<Command, ConfigError> {
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Command::Help);
    }

    let mut storage_dir: Option<PathBuf> = env("REPSYNC_STORAGE_DIR").map(PathBuf::from);
    let mut api_base: String =
        env("REPSYNC_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let username = env("REPSLY_USERNAME");
    let password = env("REPSLY_PASSWORD");
    let mut entities: Vec<EntityType> = match env("REPSYNC_ENTITIES") {
        Some(v) => parse_entities(&v)?,
        None => EntityType::ALL.to_vec(),
    };
    let mut timeout_s: u64 = match env("REPSYNC_TIMEOUT_S") {
        Some(v) => parse_number("REPSYNC_TIMEOUT_S", "an integer (seconds)", &v)?,
        None => DEFAULT_TIMEOUT_S,
    };
    let mut max_rounds: Option<u32> = env("REPSYNC_MAX_ROUNDS")
        .map(|v| parse_number("REPSYNC_MAX_ROUNDS", "an integer", &v))
        .transpose()?;
    let mut max_runtime_s: Option<u64> = env("REPSYNC_MAX_RUNTIME_S")
        .map(|v| parse_number("REPSYNC_MAX_RUNTIME_S", "an integer (seconds)", &v))
        .transpose()?;
    let mut status_only = false;
    let mut json = false;

    let mut i = 0usize;
    while i < args.len() {
        let a = args[i].as_str();
        match a {
            "--storage-dir" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--storage-dir",
                    what: "DIR",
                })?;
                storage_dir = Some(PathBuf::from(v));
            }
            "--api-base" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--api-base",
                    what: "URL",
                })?;
                api_base = v.trim().to_string();
            }
            "--entities" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--entities",
                    what: "LIST",
                })?;
                entities = parse_entities(v)?;
            }
            "--timeout-s" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--timeout-s",
                    what: "S",
                })?;
                timeout_s = parse_number("--timeout-s", "an integer (seconds)", v)?;
            }
            "--max-rounds" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--max-rounds",
                    what: "N",
                })?;
                max_rounds = Some(parse_number("--max-rounds", "an integer", v)?);
            }
            "--max-runtime-s" => {
                i += 1;
                let v = args.get(i).ok_or(ConfigError::MissingValue {
                    flag: "--max-runtime-s",
                    what: "S",
                })?;
                max_runtime_s = Some(parse_number("--max-runtime-s", "an integer (seconds)", v)?);
            }
            "--status" => {
                status_only = true;
            }
            "--json" => {
                json = true;
            }
            other => return Err(ConfigError::UnknownArgument(other.to_string())),
        }
        i += 1;
    }

    let storage_dir = storage_dir.ok_or(ConfigError::Missing("--storage-dir / REPSYNC_STORAGE_DIR"))?;
    if timeout_s == 0 {
        return Err(ConfigError::InvalidValue {
            name: "timeout",
            expected: "greater than 0",
            value: timeout_s.to_string(),
        });
    }

    // Status reads the local store only; credentials matter for a real run.
    let (username, password) = if status_only {
        (username.unwrap_or_default(), password.unwrap_or_default())
    } else {
        (
            username.ok_or(ConfigError::Missing("REPSLY_USERNAME"))?,
            password.ok_or(ConfigError::Missing("REPSLY_PASSWORD"))?,
        )
    };

    Ok(Command::Run(RunnerConfig {
        storage_dir,
        api_base,
        username,
        password,
        entities,
        timeout_s,
        max_rounds,
        max_runtime_s,
        status_only,
        json,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn credentials() -> Vec<(&'static str, &'static str)> {
        vec![("REPSLY_USERNAME", "user"), ("REPSLY_PASSWORD", "secret")]
    }

    fn run_config(command: Command) -> RunnerConfig {
        match command {
            Command::Run(cfg) => cfg,
            Command::Help => panic!("expected a run config"),
        }
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let mut env = credentials();
        env.push(("REPSYNC_STORAGE_DIR", "/tmp/repsync"));
        let cfg = run_config(parse_args_from(&[], env_from(&env)).expect("parse"));

        assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/repsync"));
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.entities, EntityType::ALL.to_vec());
        assert_eq!(cfg.timeout_s, 30);
        assert_eq!(cfg.max_rounds, None);
        assert_eq!(cfg.max_runtime_s, None);
        assert!(!cfg.status_only);
        assert!(!cfg.json);
    }

    #[test]
    fn flags_override_environment() {
        let mut env = credentials();
        env.push(("REPSYNC_STORAGE_DIR", "/tmp/from-env"));
        env.push(("REPSYNC_ENTITIES", "clients"));
        env.push(("REPSYNC_TIMEOUT_S", "5"));
        let cfg = run_config(
            parse_args_from(
                &args(&[
                    "--storage-dir",
                    "/tmp/from-flag",
                    "--entities",
                    "pricelists, Forms,pricelists",
                    "--timeout-s",
                    "12",
                    "--max-rounds",
                    "3",
                    "--max-runtime-s",
                    "600",
                ]),
                env_from(&env),
            )
            .expect("parse"),
        );

        assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/from-flag"));
        assert_eq!(cfg.entities, vec![EntityType::Pricelists, EntityType::Forms]);
        assert_eq!(cfg.timeout_s, 12);
        assert_eq!(cfg.max_rounds, Some(3));
        assert_eq!(cfg.max_runtime_s, Some(600));
    }

    #[test]
    fn invalid_values_are_reported() {
        let env = credentials();
        let err = parse_args_from(
            &args(&["--storage-dir", "/tmp/x", "--entities", "visits"]),
            env_from(&env),
        )
        .expect_err("unknown entity");
        assert_eq!(err, ConfigError::UnknownEntity("visits".to_string()));

        let err = parse_args_from(
            &args(&["--storage-dir", "/tmp/x", "--timeout-s", "soon"]),
            env_from(&env),
        )
        .expect_err("bad timeout");
        assert!(matches!(err, ConfigError::InvalidValue { name: "--timeout-s", .. }));

        let err = parse_args_from(&args(&["--storage-dir"]), env_from(&env))
            .expect_err("missing value");
        assert!(matches!(err, ConfigError::MissingValue { .. }));

        let err = parse_args_from(&args(&["--storage-dir", "/tmp/x", "--verbose"]), env_from(&env))
            .expect_err("unknown flag");
        assert_eq!(err, ConfigError::UnknownArgument("--verbose".to_string()));
    }

    #[test]
    fn credentials_are_required_except_for_status() {
        let err = parse_args_from(&args(&["--storage-dir", "/tmp/x"]), env_from(&[]))
            .expect_err("no credentials");
        assert_eq!(err, ConfigError::Missing("REPSLY_USERNAME"));

        let cfg = run_config(
            parse_args_from(
                &args(&["--storage-dir", "/tmp/x", "--status", "--json"]),
                env_from(&[]),
            )
            .expect("status needs no credentials"),
        );
        assert!(cfg.status_only);
        assert!(cfg.json);
    }

    #[test]
    fn storage_dir_is_required() {
        let err = parse_args_from(&[], env_from(&credentials())).expect_err("no storage dir");
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn help_wins_over_everything_else() {
        let command =
            parse_args_from(&args(&["--bogus", "--help"]), env_from(&[])).expect("help");
        assert_eq!(command, Command::Help);
    }

    #[test]
    fn debug_output_hides_the_password() {
        let mut env = credentials();
        env.push(("REPSYNC_STORAGE_DIR", "/tmp/x"));
        let cfg = run_config(parse_args_from(&[], env_from(&env)).expect("parse"));
        assert!(!format!("{cfg:?}").contains("secret"));
    }
}
