//! The boundary between the connector and the launcher that hosts it.
//!
//! The host calls into a [`Plugin`] on its own schedule and receives change
//! notifications through a [`Host`].

use crate::error::Result;
use crate::game::{Achievement, Game, GameTime, LocalGame};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub user_id: String,
    pub user_name: String,
}

/// Notifications pushed to the host between its own calls.
pub trait Host {
    fn add_game(&mut self, game: &Game);
    fn remove_game(&mut self, game_id: &str);
    fn update_local_game_status(&mut self, local_game: &LocalGame);
    fn update_game_time(&mut self, game_time: &GameTime);
}

pub trait Plugin {
    fn authenticate(&mut self) -> Authentication;

    fn get_owned_games(&mut self) -> Result<Vec<Game>>;

    fn get_local_games(&mut self) -> Result<Vec<LocalGame>>;

    /// ROMs need no installation step.
    fn install_game(&mut self, _game_id: &str) {}

    fn uninstall_game(&mut self, _game_id: &str) {}

    fn launch_game(&mut self, game_id: &str) -> Result<()>;

    fn get_game_time(&self, game_id: &str) -> GameTime;

    /// Periodic poll. Must not block on the emulator process.
    fn tick(&mut self) -> Result<()>;

    fn get_unlocked_achievements(&self, game_id: &str) -> Result<Vec<Achievement>>;

    fn shutdown(&mut self) {}
}
