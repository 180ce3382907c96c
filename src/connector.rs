use crate::achievements::{fingerprint, AchievementBackend, RetroAchievementsClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::game::{Achievement, Game, GameTime, LocalGame, LocalGameState};
use crate::library;
use crate::playlist::Playlist;
use crate::playtime;
use crate::plugin::{Authentication, Host, Plugin};
use log::{debug, info, warn};
use std::path::Path;
use std::process::{Child, Command};

/// The emulator instance started by `launch_game`.
struct RunningProcess {
    child: Child,
    game_id: String,
}

pub struct Connector<H: Host> {
    config: Config,
    host: H,
    // Used to report additions and removals between polls
    game_cache: Vec<Game>,
    running: Option<RunningProcess>,
    achievements: Option<Box<dyn AchievementBackend>>,
}

impl<H: Host> Connector<H> {
    pub fn new(config: Config, host: H) -> Self {
        let achievements = config.achievements.as_ref().map(|credentials| {
            Box::new(RetroAchievementsClient::new(credentials, &config.api_base))
                as Box<dyn AchievementBackend>
        });

        Self::with_backend(config, host, achievements)
    }

    pub fn with_backend(
        config: Config,
        host: H,
        achievements: Option<Box<dyn AchievementBackend>>,
    ) -> Self {
        Self {
            config,
            host,
            game_cache: Vec::new(),
            running: None,
            achievements,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn playlist(&self) -> Result<Playlist> {
        Playlist::load(&self.config.playlist_path())
    }

    fn state_of(&self, game_id: &str) -> LocalGameState {
        match &self.running {
            Some(running) if running.game_id == game_id => LocalGameState::Running,
            _ => LocalGameState::Installed,
        }
    }

    /// One reconciliation pass against the playlist on disk.
    pub fn update_game_cache(&mut self) -> Result<()> {
        let current = library::scan(&self.config.playlist_path())?;
        let changes = library::reconcile(&current, &mut self.game_cache);

        for game in &changes.added {
            info!("Game added: {game}");
            self.host.add_game(game);
        }
        for game in &changes.removed {
            info!("Game removed: {game}");
            self.host.remove_game(&game.game_id);
        }

        Ok(())
    }

    /// Polls the running emulator without waiting on it.
    pub fn observe(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        match running.child.try_wait() {
            Ok(None) => return,
            Ok(Some(status)) => debug!("{} exited with {status}", running.game_id),
            Err(e) => warn!("Lost track of {}: {e}", running.game_id),
        }

        let Some(RunningProcess { game_id, .. }) = self.running.take() else {
            return;
        };

        info!("Game stopped: {game_id}");
        self.host
            .update_local_game_status(&LocalGame::new(&game_id, LocalGameState::Installed));

        // an unreadable playlist must not overwrite the host's recorded playtime with zero
        match self.import_game_time(&game_id) {
            Ok(game_time) => self.host.update_game_time(&game_time),
            Err(e) => warn!("Skipping game time update for {game_id}: {e}"),
        }
    }

    fn import_game_time(&self, game_id: &str) -> Result<GameTime> {
        let playlist = self.playlist()?;

        Ok(match playlist
            .find(game_id)
            .and_then(|entry| playtime::log_path(&self.config.logs_dir(), entry))
        {
            Some(log_file) => playtime::read_game_time(game_id, &log_file),
            None => GameTime::never_played(game_id),
        })
    }

    pub fn fingerprint_game(&self, game_id: &str) -> Result<Option<String>> {
        let playlist = self.playlist()?;

        Ok(playlist
            .find(game_id)
            .and_then(|entry| fingerprint(Path::new(entry.rom_path()))))
    }
}

impl<H: Host> Plugin for Connector<H> {
    fn authenticate(&mut self) -> Authentication {
        let user_id = match &self.config.achievements {
            Some(credentials) => credentials.user.clone(),
            None => "RAUser".to_string(),
        };

        Authentication {
            user_id,
            user_name: "Retroarch".to_string(),
        }
    }

    fn get_owned_games(&mut self) -> Result<Vec<Game>> {
        self.update_game_cache()?;
        Ok(self.game_cache.clone())
    }

    fn get_local_games(&mut self) -> Result<Vec<LocalGame>> {
        if self.game_cache.is_empty() {
            self.update_game_cache()?;
        }

        Ok(self
            .game_cache
            .iter()
            .map(|game| LocalGame::new(&game.game_id, self.state_of(&game.game_id)))
            .collect())
    }

    fn launch_game(&mut self, game_id: &str) -> Result<()> {
        // a finished emulator must not block the next launch
        self.observe();

        if let Some(running) = &self.running {
            return Err(Error::AlreadyRunning(running.game_id.clone()));
        }

        let playlist = self.playlist()?;
        let entry = playlist
            .find(game_id)
            .ok_or_else(|| Error::GameNotFound(game_id.to_string()))?;

        self.host
            .update_local_game_status(&LocalGame::new(game_id, LocalGameState::Running));

        let spawned = Command::new(self.config.emulator_path())
            .arg("-L")
            .arg(self.config.core_path())
            .arg(&entry.path)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.host
                    .update_local_game_status(&LocalGame::new(game_id, LocalGameState::Installed));
                return Err(e.into());
            }
        };

        info!("Game started: {game_id} (pid {})", child.id());
        self.running = Some(RunningProcess {
            child,
            game_id: game_id.to_string(),
        });

        Ok(())
    }

    fn get_game_time(&self, game_id: &str) -> GameTime {
        self.import_game_time(game_id).unwrap_or_else(|e| {
            warn!("Cannot import game time for {game_id}: {e}");
            GameTime::never_played(game_id)
        })
    }

    fn tick(&mut self) -> Result<()> {
        self.observe();
        self.update_game_cache()
    }

    fn get_unlocked_achievements(&self, game_id: &str) -> Result<Vec<Achievement>> {
        let (Some(_), Some(backend)) = (&self.config.achievements, &self.achievements) else {
            return Ok(Vec::new());
        };

        let Some(hash) = self.fingerprint_game(game_id)? else {
            debug!("No fingerprint for {game_id}");
            return Ok(Vec::new());
        };

        let Some(remote_id) = backend.resolve_remote_id(&hash)? else {
            debug!("No RetroAchievements game for {game_id} ({hash})");
            return Ok(Vec::new());
        };

        debug!("Got RetroAchievements id {remote_id} for {game_id}");
        backend.fetch_achievements(remote_id)
    }
}
