#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseType {
    SinglePurchase,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub game_id: String,
    pub title: String,
    pub license: LicenseType,
}

impl Game {
    /// Builds a game from a raw playlist label. Identity is the normalized label.
    pub fn from_label(label: &str) -> Self {
        let name = normalize(label);

        Self {
            game_id: name.clone(),
            title: name,
            license: LicenseType::SinglePurchase,
        }
    }
}

impl PartialEq<Self> for Game {
    fn eq(&self, other: &Self) -> bool {
        other.game_id == self.game_id
    }
}

impl Eq for Game {}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalGameState {
    Installed,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGame {
    pub game_id: String,
    pub state: LocalGameState,
}

impl LocalGame {
    pub fn new(game_id: &str, state: LocalGameState) -> Self {
        Self {
            game_id: game_id.to_string(),
            state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTime {
    pub game_id: String,
    /// Total minutes played.
    pub time_played: u32,
    /// Epoch seconds, UTC.
    pub last_played: Option<i64>,
}

impl GameTime {
    pub fn never_played(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            time_played: 0,
            last_played: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: u32,
    pub title: String,
    pub unlock_time: i64,
}

/// Strips region/version decorations such as `" (USA)"` and drops apostrophes.
pub fn normalize(label: &str) -> String {
    // Apostrophes go first: removing them after the cut could expose a new " (".
    let mut name = label.replace('\'', "");

    if let Some(idx) = name.find(" (") {
        name.truncate(idx);
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_parenthesized_suffix() {
        assert_eq!(normalize("Super Game (USA)"), "Super Game");
        assert_eq!(normalize("Zelda (USA) (Rev 1)"), "Zelda");
        assert_eq!(normalize("Plain Name"), "Plain Name");
    }

    #[test]
    fn normalize_removes_apostrophes() {
        assert_eq!(normalize("Kirby's Adventure (Europe)"), "Kirbys Adventure");
        assert_eq!(normalize("Mike Tyson's Punch-Out!!"), "Mike Tysons Punch-Out!!");
    }

    #[test]
    fn normalize_is_idempotent() {
        for label in [
            "Super Game (USA)",
            "Kirby's Adventure (Europe) (Rev A)",
            "Tetris",
            "Name(NoSpace)",
            "' (",
            "a '(b)",
        ] {
            let once = normalize(label);
            assert_eq!(normalize(&once), once, "label: {label}");
        }
    }

    #[test]
    fn games_compare_by_identity() {
        let a = Game::from_label("Super Game (USA)");
        let b = Game::from_label("Super Game (Europe)");
        let c = Game::from_label("Other Game");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.license, LicenseType::SinglePurchase);
    }
}
