use crate::error::Result;
use crate::game::Game;
use crate::playlist::Playlist;
use log::debug;
use std::collections::HashSet;
use std::path::Path;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub added: Vec<Game>,
    pub removed: Vec<Game>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Games whose ROM currently exists on disk, in playlist order.
pub fn scan(playlist_path: &Path) -> Result<Vec<Game>> {
    let playlist = Playlist::load(playlist_path)?;
    Ok(installed_games(&playlist))
}

pub fn installed_games(playlist: &Playlist) -> Vec<Game> {
    let mut seen = HashSet::new();

    playlist
        .entries()
        .iter()
        .filter(|entry| {
            let exists = Path::new(entry.rom_path()).is_file();
            if !exists {
                debug!("Skipping {}: {} does not exist.", entry.label, entry.rom_path());
            }
            exists
        })
        .map(|entry| Game::from_label(&entry.label))
        // two labels may normalize to the same identity; first one wins
        .filter(|game| seen.insert(game.game_id.clone()))
        .collect()
}

/// Brings `cache` in line with `current`, keyed by game identity.
///
/// The diff is computed against a snapshot of the cache before anything is
/// applied. Removed games are dropped in place; added games are appended in
/// scan order.
pub fn reconcile(current: &[Game], cache: &mut Vec<Game>) -> Changes {
    let current_ids: HashSet<&str> = current.iter().map(|g| g.game_id.as_str()).collect();
    let cached_ids: HashSet<&str> = cache.iter().map(|g| g.game_id.as_str()).collect();

    let mut seen = HashSet::new();
    let added: Vec<Game> = current
        .iter()
        .filter(|g| !cached_ids.contains(g.game_id.as_str()))
        .filter(|g| seen.insert(g.game_id.as_str()))
        .cloned()
        .collect();

    let removed: Vec<Game> = cache
        .iter()
        .filter(|g| !current_ids.contains(g.game_id.as_str()))
        .cloned()
        .collect();

    cache.retain(|g| !removed.contains(g));
    cache.extend(added.iter().cloned());

    Changes { added, removed }
}
