// !! Critical knowledge !!
//
// RetroArch only rewrites a game's runtime log when the content is closed,
// and only if "Save runtime log (aggregate)" is enabled under Settings > Saving.
// Playtime therefore refreshes once per emulator session, never mid-game.

use log::{error, info, warn, LevelFilter};
use retrolink::cli;
use retrolink::config::Config;
use retrolink::connector::Connector;
use retrolink::game::{Game, GameTime, LocalGame};
use retrolink::plugin::{Host, Plugin};
use simplelog::{format_description, ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::{process, thread};

/// Stands in for the launcher: every notification becomes a log line.
struct LogHost;

impl Host for LogHost {
    fn add_game(&mut self, game: &Game) {
        info!("Library: + {game}");
    }

    fn remove_game(&mut self, game_id: &str) {
        info!("Library: - {game_id}");
    }

    fn update_local_game_status(&mut self, local_game: &LocalGame) {
        info!("Status: {} is {:?}", local_game.game_id, local_game.state);
    }

    fn update_game_time(&mut self, game_time: &GameTime) {
        let last_played = game_time
            .last_played
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map_or_else(|| "never".to_string(), |dt| dt.to_rfc3339());

        info!(
            "Playtime: {}. Total: {} min. Last played: {last_played}.",
            game_time.game_id, game_time.time_played
        );
    }
}

fn main() {
    let matches = cli::build_command().get_matches();

    let level = matches
        .get_one::<String>("log_level")
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let log_config = ConfigBuilder::new()
        .set_time_format_custom(format_description!("[hour]:[minute]:[second]"))
        .build();

    if TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto).is_err() {
        eprintln!("ERROR: failed to initialize logging.");
    }

    let config = match Config::load(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let poll_interval = config.poll_interval;
    let mut connector = Connector::new(config, LogHost);

    if let Some(game_id) = matches.get_one::<String>("achievements") {
        process::exit(print_achievements(&connector, game_id));
    }

    let auth = connector.authenticate();
    info!("Connector ready for {} ({})", auth.user_name, auth.user_id);

    match connector.get_owned_games() {
        Ok(games) => info!("{} games found.", games.len()),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }

    if let Some(game_id) = matches.get_one::<String>("launch") {
        if let Err(e) = connector.launch_game(game_id) {
            warn!("Launch failed: {e}");
        }
    }

    loop {
        thread::sleep(poll_interval);

        // A broken playlist is fatal for this pass only; the file may be mid-write.
        if let Err(e) = connector.tick() {
            error!("{e}");
        }
    }
}

fn print_achievements(connector: &Connector<LogHost>, game_id: &str) -> i32 {
    match connector.get_unlocked_achievements(game_id) {
        Ok(earned) if earned.is_empty() => {
            info!("No earned achievements for {game_id}.");
            0
        }
        Ok(earned) => {
            for cheevo in earned {
                let when = chrono::DateTime::from_timestamp(cheevo.unlock_time, 0)
                    .map_or_else(|| cheevo.unlock_time.to_string(), |dt| dt.to_rfc3339());
                println!("{:>8}  {when}  {}", cheevo.id, cheevo.title);
            }
            0
        }
        Err(e) => {
            error!("{e}");
            1
        }
    }
}
