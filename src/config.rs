use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const STORE_FILE: &str = "writingTimeData.json";
pub const CONFIG_FILE: &str = "config.toml";
pub const STATE_DIR_ENV: &str = "WRITING_TIME_STATE_DIR";
pub const STORE_ENV: &str = "WRITING_TIME_STORE";
const APP_DIR: &str = "writing_time";

#[derive(Debug)]
pub enum ConfigError {
	Io(std::io::Error),
	TomlDecode(toml::de::Error),
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigError::Io(err) => write!(f, "failed to read config: {err}"),
			ConfigError::TomlDecode(err) => write!(f, "failed to parse config: {err}"),
		}
	}
}

impl std::error::Error for ConfigError {}

/// Optional `config.toml` in the state directory.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
	store_path: Option<PathBuf>,
	export_dir: Option<PathBuf>,
	log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
	pub state_dir: PathBuf,
	pub store_path: PathBuf,
	pub export_dir: PathBuf,
	pub log_level: Option<String>,
}

impl Settings {
	/// Flag, then environment, then config file, then the state directory default.
	pub fn resolve(cli_store: Option<PathBuf>) -> Result<Self, ConfigError> {
		let state_dir = state_dir();
		let env_store = env::var_os(STORE_ENV)
			.map(PathBuf::from)
			.filter(|path| !path.as_os_str().is_empty());
		Self::resolve_in(state_dir, cli_store, env_store)
	}

	fn resolve_in(
		state_dir: PathBuf,
		cli_store: Option<PathBuf>,
		env_store: Option<PathBuf>,
	) -> Result<Self, ConfigError> {
		let file = read_file_settings(&state_dir.join(CONFIG_FILE))?;

		let store_path = cli_store
			.or(env_store)
			.or(file.store_path)
			.map(absolutize)
			.unwrap_or_else(|| state_dir.join(STORE_FILE));
		let export_dir = file
			.export_dir
			.map(absolutize)
			.unwrap_or_else(|| absolutize(PathBuf::from(".")));

		Ok(Self {
			state_dir,
			store_path,
			export_dir,
			log_level: file.log_level,
		})
	}

	pub fn log_dir(&self) -> PathBuf {
		self.state_dir.join("logs")
	}
}

fn read_file_settings(path: &Path) -> Result<FileSettings, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(FileSettings::default()),
		Err(err) => return Err(ConfigError::Io(err)),
	};
	toml::from_str(&raw).map_err(ConfigError::TomlDecode)
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(STATE_DIR_ENV) {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join(APP_DIR);
	}

	PathBuf::from(format!(".{APP_DIR}"))
}

pub fn absolutize(path: PathBuf) -> PathBuf {
	if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use super::{CONFIG_FILE, ConfigError, STORE_FILE, Settings};

	#[test]
	fn defaults_to_state_dir_store() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = Settings::resolve_in(dir.path().to_path_buf(), None, None).expect("resolve");
		assert_eq!(settings.store_path, dir.path().join(STORE_FILE));
		assert_eq!(settings.log_dir(), dir.path().join("logs"));
		assert!(settings.export_dir.is_absolute());
		assert!(settings.log_level.is_none());
	}

	#[test]
	fn flag_beats_env_beats_file() {
		let dir = tempfile::tempdir().expect("tempdir");
		fs::write(
			dir.path().join(CONFIG_FILE),
			"store_path = \"/data/file.json\"\nexport_dir = \"/data/exports\"\nlog_level = \"debug\"\n",
		)
		.expect("write config");
		let state_dir = dir.path().to_path_buf();

		let from_file = Settings::resolve_in(state_dir.clone(), None, None).expect("resolve");
		assert_eq!(from_file.store_path, PathBuf::from("/data/file.json"));
		assert_eq!(from_file.export_dir, PathBuf::from("/data/exports"));
		assert_eq!(from_file.log_level.as_deref(), Some("debug"));

		let from_env = Settings::resolve_in(
			state_dir.clone(),
			None,
			Some(PathBuf::from("/env/store.json")),
		)
		.expect("resolve");
		assert_eq!(from_env.store_path, PathBuf::from("/env/store.json"));

		let from_flag = Settings::resolve_in(
			state_dir,
			Some(PathBuf::from("/flag/store.json")),
			Some(PathBuf::from("/env/store.json")),
		)
		.expect("resolve");
		assert_eq!(from_flag.store_path, PathBuf::from("/flag/store.json"));
	}

	#[test]
	fn reports_broken_config() {
		let dir = tempfile::tempdir().expect("tempdir");
		fs::write(dir.path().join(CONFIG_FILE), "store_path = [").expect("write config");
		let result = Settings::resolve_in(dir.path().to_path_buf(), None, None);
		assert!(matches!(result, Err(ConfigError::TomlDecode(_))));
	}
}
