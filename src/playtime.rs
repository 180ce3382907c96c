// RetroArch writes one aggregate runtime log per content file when
// "Save runtime log (aggregate)" is enabled under Settings > Saving.

use crate::game::GameTime;
use crate::playlist::PlaylistEntry;
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::path::{Path, PathBuf};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LOG_EXTENSION: &str = "lrtl";

/// Parses `YYYY-MM-DD HH:MM:SS` as UTC into epoch seconds.
pub fn parse_utc_timestamp(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Parses `HH:MM:SS` into whole minutes. Seconds are discarded.
pub fn parse_runtime_minutes(text: &str) -> Option<u32> {
    let mut fields = text.trim().splitn(3, ':');
    let hours: u32 = fields.next()?.parse().ok()?;
    let minutes: u32 = fields.next()?.parse().ok()?;
    let seconds: u32 = fields.next()?.parse().ok()?;

    if minutes > 59 || seconds > 59 {
        return None;
    }

    hours.checked_mul(60)?.checked_add(minutes)
}

pub fn log_path(logs_dir: &Path, entry: &PlaylistEntry) -> Option<PathBuf> {
    let stem = entry.rom_stem()?;
    Some(logs_dir.join(format!("{stem}.{LOG_EXTENSION}")))
}

/// Reads a runtime log. Anything missing or unreadable counts as never played.
pub fn read_game_time(game_id: &str, log_file: &Path) -> GameTime {
    if !log_file.is_file() {
        debug!("No runtime log for {game_id} at {}.", log_file.display());
        return GameTime::never_played(game_id);
    }

    let parsed = match std::fs::read_to_string(log_file)
        .map_err(|e| e.to_string())
        .and_then(|text| json::parse(&text).map_err(|e| e.to_string()))
    {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring runtime log {}: {e}", log_file.display());
            return GameTime::never_played(game_id);
        }
    };

    let last_played = parsed["last_played"].as_str().and_then(parse_utc_timestamp);
    let time_played = parsed["runtime"]
        .as_str()
        .and_then(parse_runtime_minutes)
        .unwrap_or(0);

    GameTime {
        game_id: game_id.to_string(),
        time_played,
        last_played,
    }
}
