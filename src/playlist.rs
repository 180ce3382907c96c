use crate::error::{Error, Result};
use crate::game::normalize;
use log::debug;
use std::path::Path;

/// One `items` element of a RetroArch `.lpl` playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub label: String,
    /// Real path, optionally followed by `#<entry inside archive>`.
    pub path: String,
}

impl PlaylistEntry {
    pub fn game_id(&self) -> String {
        normalize(&self.label)
    }

    /// The path with any `#` disambiguator removed.
    pub fn rom_path(&self) -> &str {
        self.path.split('#').next().unwrap_or_default()
    }

    /// ROM file name without directory, disambiguator or extension.
    /// Used to locate the per-game runtime log.
    pub fn rom_stem(&self) -> Option<&str> {
        let file_name = self.path.rsplit(['\\', '/']).next()?;
        let file_name = file_name.split('#').next()?;

        let stem = match file_name.rsplit_once('.') {
            Some((stem, _ext)) => stem,
            None => file_name,
        };

        (!stem.is_empty()).then_some(stem)
    }
}

#[derive(Debug, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Reads a playlist file. A missing file is an empty playlist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!("Playlist {} not found, treating as empty.", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;

        Self::parse(&text).map_err(|e| match e {
            Error::Playlist(reason) => Error::Playlist(format!("{}: {reason}", path.display())),
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let parsed = json::parse(text).map_err(|e| Error::Playlist(e.to_string()))?;

        let items = &parsed["items"];
        if !items.is_array() {
            return Err(Error::Playlist("missing \"items\" array".to_string()));
        }

        let entries = items
            .members()
            .enumerate()
            .map(|(idx, item)| {
                let (Some(label), Some(path)) = (item["label"].as_str(), item["path"].as_str())
                else {
                    return Err(Error::Playlist(format!(
                        "item {idx} lacks a string \"label\" or \"path\""
                    )));
                };

                Ok(PlaylistEntry {
                    label: label.to_string(),
                    path: path.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    /// First entry whose normalized label equals `game_id`.
    pub fn find(&self, game_id: &str) -> Option<&PlaylistEntry> {
        self.entries.iter().find(|e| e.game_id() == game_id)
    }
}
