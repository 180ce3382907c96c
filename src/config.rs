use crate::error::{Error, Result};
use clap::ArgMatches;
use log::info;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Duration;
use yaml_rust2::{Yaml, YamlLoader};

pub const DEFAULT_PLAYLIST: &str = "Nintendo - Nintendo Entertainment System";
pub const DEFAULT_API_BASE: &str = "https://retroachievements.org";
const DEFAULT_POLL_SECS: u64 = 5;

#[cfg(windows)]
const DEFAULT_EMULATOR: &str = "retroarch.exe";
#[cfg(not(windows))]
const DEFAULT_EMULATOR: &str = "retroarch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub emu_path: PathBuf,
    /// Emulator executable, relative to `emu_path` unless absolute.
    pub emulator: String,
    pub core: String,
    pub playlist: String,
    pub poll_interval: Duration,
    pub achievements: Option<Credentials>,
    pub api_base: String,
}

impl Config {
    /// Defaults, then the YAML file named by `--config-file`, then CLI flags.
    pub fn load(matches: &ArgMatches) -> Result<Self> {
        let from_file = match matches.get_one::<String>("config") {
            Some(path) => {
                let text = read_to_string(path)
                    .map_err(|e| Error::Config(format!("cannot read {path}: {e}")))?;
                Settings::from_yaml(&text)?
            }
            None => Settings::default(),
        };

        from_file.merge(Settings::from_matches(matches)?).finish()
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.emu_path
            .join("playlists")
            .join(format!("{}.lpl", self.playlist))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.emu_path.join("playlists").join("logs")
    }

    pub fn core_path(&self) -> PathBuf {
        self.emu_path.join("cores").join(&self.core)
    }

    pub fn emulator_path(&self) -> PathBuf {
        self.emu_path.join(&self.emulator)
    }
}

/// Partially filled configuration from a single source.
#[derive(Debug, Default)]
struct Settings {
    emu_path: Option<PathBuf>,
    emulator: Option<String>,
    core: Option<String>,
    playlist: Option<String>,
    poll_secs: Option<u64>,
    ra_user: Option<String>,
    ra_api_key: Option<String>,
    api_base: Option<String>,
}

impl Settings {
    fn from_yaml(text: &str) -> Result<Self> {
        let docs = YamlLoader::load_from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        let Some(doc) = docs.first() else {
            return Ok(Self::default());
        };

        let string = |node: &Yaml| node.as_str().map(str::to_string);

        let poll_secs = match &doc["poll_interval"] {
            Yaml::BadValue => None,
            node => Some(
                node.as_i64()
                    .and_then(|secs| u64::try_from(secs).ok())
                    .ok_or_else(|| {
                        Error::Config("poll_interval must be a positive integer".to_string())
                    })?,
            ),
        };

        let ra = &doc["retroachievements"];

        Ok(Self {
            emu_path: string(&doc["emu_path"]).map(PathBuf::from),
            emulator: string(&doc["emulator"]),
            core: string(&doc["core"]),
            playlist: string(&doc["playlist"]),
            poll_secs,
            ra_user: string(&ra["user"]),
            ra_api_key: string(&ra["api_key"]),
            api_base: string(&ra["api_base"]),
        })
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let string = |id: &str| matches.get_one::<String>(id).cloned();

        let ra_api_key = match matches.get_one::<String>("api_key") {
            Some(path) => Some(
                read_to_string(path)
                    .map_err(|e| Error::Config(format!("cannot read API key file {path}: {e}")))?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };

        Ok(Self {
            emu_path: string("emu_path").map(PathBuf::from),
            emulator: None,
            core: string("core"),
            playlist: string("playlist"),
            poll_secs: matches.get_one::<u64>("interval").copied(),
            ra_user: string("ra_user"),
            ra_api_key,
            api_base: None,
        })
    }

    /// Fields set in `over` win.
    fn merge(self, over: Self) -> Self {
        Self {
            emu_path: over.emu_path.or(self.emu_path),
            emulator: over.emulator.or(self.emulator),
            core: over.core.or(self.core),
            playlist: over.playlist.or(self.playlist),
            poll_secs: over.poll_secs.or(self.poll_secs),
            ra_user: over.ra_user.or(self.ra_user),
            ra_api_key: over.ra_api_key.or(self.ra_api_key),
            api_base: over.api_base.or(self.api_base),
        }
    }

    fn finish(self) -> Result<Config> {
        let emu_path = self
            .emu_path
            .ok_or_else(|| Error::Config("emu_path is not set".to_string()))?;
        let core = self
            .core
            .ok_or_else(|| Error::Config("core is not set".to_string()))?;

        let achievements = match (self.ra_user, self.ra_api_key) {
            (Some(user), Some(api_key)) if !user.is_empty() && !api_key.is_empty() => {
                Some(Credentials { user, api_key })
            }
            _ => {
                info!("RetroAchievements user and API key are not provided");
                None
            }
        };

        Ok(Config {
            emu_path,
            emulator: self.emulator.unwrap_or_else(|| DEFAULT_EMULATOR.to_string()),
            core,
            playlist: self.playlist.unwrap_or_else(|| DEFAULT_PLAYLIST.to_string()),
            poll_interval: Duration::from_secs(self.poll_secs.unwrap_or(DEFAULT_POLL_SECS)),
            achievements,
            api_base: self.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}
