//! RetroArch library connector: playlist-backed game discovery, playtime
//! import from runtime logs, and RetroAchievements lookups.

pub mod achievements;
pub mod cli;
pub mod config;
pub mod connector;
pub mod error;
pub mod game;
pub mod library;
pub mod playlist;
pub mod playtime;
pub mod plugin;
