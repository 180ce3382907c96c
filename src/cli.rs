use clap::{command, value_parser, Arg, Command, ValueHint};

pub fn build_command() -> Command {
    command!().args([
        Arg::new("config")
            .short('c')
            .long("config-file")
            .alias("config")
            .required(false)
            .value_hint(ValueHint::FilePath)
            .value_name("PATH")
            .help("Path to the YAML config file."),
        Arg::new("emu_path")
            .short('e')
            .long("emu-path")
            .required(false)
            .value_hint(ValueHint::DirPath)
            .value_name("DIR")
            .help("RetroArch installation directory."),
        Arg::new("core")
            .long("core")
            .required(false)
            .value_name("FILE")
            .help("Core file name inside <emu-path>/cores, e.g. nestopia_libretro.dll."),
        Arg::new("playlist")
            .short('p')
            .long("playlist")
            .required(false)
            .value_name("NAME")
            .help("Playlist name without the .lpl extension."),
        Arg::new("interval")
            .short('i')
            .long("interval")
            .required(false)
            .value_parser(value_parser!(u64))
            .value_name("SECS")
            .help("Seconds between library polls."),
        Arg::new("ra_user")
            .short('u')
            .long("ra-user")
            .alias("user")
            .required(false)
            .value_name("USER")
            .help("RetroAchievements user name."),
        Arg::new("api_key")
            .short('k')
            .long("api-key")
            .alias("key")
            .required(false)
            .value_hint(ValueHint::FilePath)
            .value_name("PATH")
            .help("Path to a file containing a RetroAchievements API key."),
        Arg::new("log_level")
            .long("log-level")
            .required(false)
            .default_value("info")
            .value_name("LEVEL")
            .help("One of off, error, warn, info, debug, trace."),
        Arg::new("launch")
            .long("launch")
            .required(false)
            .value_name("GAME")
            .help("Launch this game once the library is loaded."),
        Arg::new("achievements")
            .long("achievements")
            .conflicts_with("launch")
            .required(false)
            .value_name("GAME")
            .help("Print the earned achievements of this game and exit."),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn launch_conflicts_with_achievements() {
        let result = build_command().try_get_matches_from([
            "retrolink",
            "--launch",
            "A",
            "--achievements",
            "A",
        ]);

        assert!(result.is_err());
    }
}
