use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::game::Achievement;
use crate::playtime::parse_utc_timestamp;
use json::JsonValue;
use log::{debug, error};
use md5::{Digest, Md5};
use reqwest::Url;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

/// iNES header length. RetroAchievements hashes NES content without it.
const HEADER_LEN: u64 = 0x10;

/// The two remote lookups needed to list a game's unlocked achievements.
pub trait AchievementBackend {
    /// Maps a ROM fingerprint to the service's game id. `None` if unknown.
    fn resolve_remote_id(&self, fingerprint: &str) -> Result<Option<u32>>;

    /// Earned achievements of the configured user for `remote_id`.
    fn fetch_achievements(&self, remote_id: u32) -> Result<Vec<Achievement>>;
}

/// MD5 of the ROM file past its header, as lowercase hex.
pub fn fingerprint(rom_path: &Path) -> Option<String> {
    let hash = || -> std::io::Result<String> {
        let mut file = File::open(rom_path)?;
        file.seek(SeekFrom::Start(HEADER_LEN))?;

        let mut hasher = Md5::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    };

    match hash() {
        Ok(digest) => Some(digest),
        Err(e) => {
            debug!("Cannot fingerprint {}: {e}", rom_path.display());
            None
        }
    }
}

pub fn parse_game_id(doc: &JsonValue) -> Option<u32> {
    doc["GameID"].as_u32()
}

/// Earned achievements from a `API_GetGameInfoAndUserProgress` document.
/// `None` if the document does not have the expected shape.
pub fn parse_earned_achievements(doc: &JsonValue) -> Option<Vec<Achievement>> {
    let cheevos = &doc["Achievements"];

    // games without any achievements come back as an empty JSON array
    if cheevos.is_array() && cheevos.is_empty() {
        return Some(Vec::new());
    }
    if !cheevos.is_object() {
        return None;
    }

    cheevos
        .entries()
        .filter(|(_, cheevo)| cheevo.has_key("DateEarned"))
        .map(|(key, cheevo)| {
            let id = cheevo["ID"]
                .as_u32()
                .or_else(|| cheevo["ID"].as_str()?.parse().ok())
                .or_else(|| key.parse().ok())?;

            Some(Achievement {
                id,
                title: cheevo["Title"].as_str()?.to_string(),
                unlock_time: parse_utc_timestamp(cheevo["DateEarned"].as_str()?)?,
            })
        })
        .collect()
}

/// Query string with the API key masked, for log lines and errors.
fn redacted(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "y" { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();

    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

pub struct RetroAchievementsClient {
    http: reqwest::blocking::Client,
    base_url: String,
    user: String,
    api_key: String,
}

impl RetroAchievementsClient {
    pub fn new(credentials: &Credentials, base_url: &str) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user: credentials.user.clone(),
            api_key: credentials.api_key.clone(),
        }
    }

    /// Sends one GET and parses the body as JSON.
    /// Returns the document along with the (redacted) URL that produced it.
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<(JsonValue, String)> {
        let request = self
            .http
            .get(format!("{}/{path}", self.base_url))
            .query(query)
            .build()?;
        let url = redacted(request.url());

        debug!("GET {url}");

        // The service labels its JSON as text/html, so the body is parsed by hand.
        let body = self.http.execute(request)?.error_for_status()?.text()?;

        match json::parse(&body) {
            Ok(doc) => Ok((doc, url)),
            Err(e) => {
                error!("Invalid response data for:\n{url}\n{e}");
                Err(Error::UnknownBackendResponse { url })
            }
        }
    }
}

impl AchievementBackend for RetroAchievementsClient {
    fn resolve_remote_id(&self, fingerprint: &str) -> Result<Option<u32>> {
        let (doc, url) = self.get("dorequest.php", &[("r", "gameid"), ("m", fingerprint)])?;

        match parse_game_id(&doc) {
            Some(0) => Ok(None),
            Some(id) => Ok(Some(id)),
            None => {
                error!("Invalid response data for:\n{url}");
                Err(Error::UnknownBackendResponse { url })
            }
        }
    }

    fn fetch_achievements(&self, remote_id: u32) -> Result<Vec<Achievement>> {
        let game = remote_id.to_string();
        let (doc, url) = self.get(
            "API/API_GetGameInfoAndUserProgress.php",
            &[
                ("z", self.user.as_str()),
                ("y", self.api_key.as_str()),
                ("u", self.user.as_str()),
                ("g", game.as_str()),
            ],
        )?;

        parse_earned_achievements(&doc).ok_or_else(|| {
            error!("Invalid response data for:\n{url}");
            Error::UnknownBackendResponse { url }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answers exactly one HTTP request. Joining yields the request line.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header.trim().is_empty() {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            request_line.trim_end().to_string()
        });

        (base_url, handle)
    }

    fn client(base_url: &str) -> RetroAchievementsClient {
        let credentials = Credentials {
            user: "me".to_string(),
            api_key: "secret".to_string(),
        };
        RetroAchievementsClient::new(&credentials, base_url)
    }

    #[test]
    fn fingerprint_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let rom = dir.path().join("game.nes");

        let mut bytes = b"NES\x1a".to_vec();
        bytes.resize(16, 0xff);
        bytes.extend_from_slice(b"abc");
        std::fs::write(&rom, bytes).unwrap();

        // md5("abc")
        assert_eq!(
            fingerprint(&rom).as_deref(),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );
    }

    #[test]
    fn fingerprint_of_missing_rom_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(fingerprint(&dir.path().join("gone.nes")), None);
    }

    #[test]
    fn game_id_is_read_from_response() {
        let doc = json::parse(r#"{"Success": true, "GameID": 1448}"#).unwrap();
        assert_eq!(parse_game_id(&doc), Some(1448));

        let doc = json::parse(r#"{"Success": false}"#).unwrap();
        assert_eq!(parse_game_id(&doc), None);
    }

    #[test]
    fn only_earned_achievements_are_kept() {
        let doc = json::parse(
            r#"{
                "ID": 1448,
                "Title": "Super Game",
                "Achievements": {
                    "101": { "ID": 101, "Title": "First Steps", "DateEarned": "2021-03-04 05:06:07" },
                    "102": { "ID": 102, "Title": "Locked Away" },
                    "103": { "ID": 103, "Title": "Speedrunner", "DateEarned": "2022-11-30 23:59:59" }
                }
            }"#,
        )
        .unwrap();

        let earned = parse_earned_achievements(&doc).unwrap();

        assert_eq!(
            earned,
            [
                Achievement {
                    id: 101,
                    title: "First Steps".to_string(),
                    unlock_time: 1_614_834_367,
                },
                Achievement {
                    id: 103,
                    title: "Speedrunner".to_string(),
                    unlock_time: 1_669_852_799,
                },
            ]
        );
    }

    #[test]
    fn empty_achievement_list_is_accepted() {
        let doc = json::parse(r#"{"ID": 5, "Achievements": []}"#).unwrap();
        assert_eq!(parse_earned_achievements(&doc), Some(Vec::new()));
    }

    #[test]
    fn unexpected_shapes_are_rejected() {
        let missing = json::parse(r#"{"ID": 5}"#).unwrap();
        assert_eq!(parse_earned_achievements(&missing), None);

        let bad_date = json::parse(
            r#"{"Achievements": {"1": {"ID": 1, "Title": "x", "DateEarned": "yesterday"}}}"#,
        )
        .unwrap();
        assert_eq!(parse_earned_achievements(&bad_date), None);
    }

    #[test]
    fn api_key_is_masked_in_urls() {
        let url = Url::parse("https://example.org/API/x.php?z=me&y=secret&u=me&g=1").unwrap();
        let shown = redacted(&url);

        assert!(!shown.contains("secret"));
        assert!(shown.contains("z=me"));
        assert!(shown.contains("g=1"));
    }

    #[test]
    fn client_resolves_hash_to_game_id() {
        let (base_url, server) = serve_once("200 OK", r#"{"Success": true, "GameID": 1448}"#);

        let id = client(&base_url).resolve_remote_id("abc").unwrap();

        assert_eq!(id, Some(1448));
        assert_eq!(server.join().unwrap(), "GET /dorequest.php?r=gameid&m=abc HTTP/1.1");
    }

    #[test]
    fn client_treats_game_id_zero_as_unknown() {
        let (base_url, server) = serve_once("200 OK", r#"{"Success": true, "GameID": 0}"#);

        assert_eq!(client(&base_url).resolve_remote_id("abc").unwrap(), None);
        server.join().unwrap();
    }

    #[test]
    fn client_fetches_earned_achievements() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"ID": 7, "Achievements": {
                "1": {"ID": 1, "Title": "One", "DateEarned": "2021-03-04 05:06:07"},
                "2": {"ID": 2, "Title": "Two"},
                "3": {"ID": 3, "Title": "Three", "DateEarned": "2022-11-30 23:59:59"}
            }}"#,
        );

        let earned = client(&base_url).fetch_achievements(7).unwrap();

        let ids: Vec<u32> = earned.iter().map(|a| a.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(
            server.join().unwrap(),
            "GET /API/API_GetGameInfoAndUserProgress.php?z=me&y=secret&u=me&g=7 HTTP/1.1"
        );
    }

    #[test]
    fn html_body_is_an_unknown_backend_response() {
        let (base_url, server) = serve_once("200 OK", "<html>Service Unavailable</html>");

        let result = client(&base_url).fetch_achievements(7);
        server.join().unwrap();

        match result {
            Err(Error::UnknownBackendResponse { url }) => {
                assert!(url.contains("y=***"), "{url}");
                assert!(url.contains("g=7"), "{url}");
                assert!(!url.contains("secret"), "{url}");
            }
            other => panic!("expected UnknownBackendResponse, got {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_an_unknown_backend_response() {
        let (base_url, server) = serve_once("200 OK", r#"{"Success": false}"#);

        let result = client(&base_url).resolve_remote_id("abc");
        server.join().unwrap();

        assert!(matches!(result, Err(Error::UnknownBackendResponse { .. })));
    }

    #[test]
    fn server_error_is_a_backend_error() {
        let (base_url, server) = serve_once("500 Internal Server Error", "oops");

        let result = client(&base_url).resolve_remote_id("abc");
        server.join().unwrap();

        assert!(matches!(result, Err(Error::Backend(_))));
    }
}
