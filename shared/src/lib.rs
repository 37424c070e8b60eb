//! Text wire protocol shared by the game server and its clients.
//!
//! Every datagram is a single line of text. Clients send requests
//! (`PLAY <name>`, `SPECTATE`, `KEY <k>`) and the server answers with the
//! messages modelled by [`Message`], whose `Display` output is exactly what
//! goes on the wire.

use std::fmt;
use thiserror::Error;

/// Open floor.
pub const FLOOR: u8 = b'.';
/// Tunnel floor, redrawn as `#` when vacated.
pub const TUNNEL: u8 = b'#';
/// A pile of gold nuggets.
pub const GOLD: u8 = b'*';
/// Wall corner.
pub const CORNER: u8 = b'+';
/// Vertical wall.
pub const WALL_VERTICAL: u8 = b'|';
/// Horizontal wall.
pub const WALL_HORIZONTAL: u8 = b'-';
/// Solid rock outside the rooms.
pub const VOID: u8 = b' ';
/// How a player sees its own cell.
pub const SELF: u8 = b'@';

/// Number of distinct player ids (`A` through `Z`).
pub const MAX_PLAYER_IDS: usize = 26;

/// Returns true for the symbols that stop both movement and sight.
pub fn is_blocking(symbol: u8) -> bool {
    matches!(
        symbol,
        CORNER | WALL_VERTICAL | WALL_HORIZONTAL | VOID
    )
}

/// Returns true for symbols a map file may contain.
pub fn is_map_symbol(symbol: u8) -> bool {
    matches!(symbol, FLOOR | TUNNEL | GOLD) || is_blocking(symbol)
}

/// Returns true if the symbol is a player id letter.
pub fn is_player_symbol(symbol: u8) -> bool {
    symbol.is_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty request")]
    Empty,
    #[error("unknown request `{0}`")]
    UnknownRequest(String),
    #[error("player name is missing")]
    MissingName,
    #[error("malformed key `{0}`")]
    MalformedKey(String),
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Play { name: String },
    Spectate,
    Key(char),
}

impl Request {
    /// Decodes one request line.
    ///
    /// Player names are cut to `max_name_length` characters and any
    /// character that is neither graphic nor blank is replaced with `_`.
    pub fn parse(text: &str, max_name_length: usize) -> Result<Self, ProtocolError> {
        if text.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (word, rest) = match text.split_once(' ') {
            Some((word, rest)) => (word, Some(rest)),
            None => (text, None),
        };

        match word {
            "PLAY" => {
                let name = sanitize_name(rest.unwrap_or(""), max_name_length)
                    .ok_or(ProtocolError::MissingName)?;
                Ok(Request::Play { name })
            }
            "SPECTATE" => Ok(Request::Spectate),
            "KEY" => {
                let arg = rest.unwrap_or("");
                let mut chars = arg.chars();
                match (chars.next(), chars.next()) {
                    (Some(key), None) if key.is_ascii_alphabetic() => Ok(Request::Key(key)),
                    _ => Err(ProtocolError::MalformedKey(arg.to_string())),
                }
            }
            other => Err(ProtocolError::UnknownRequest(other.to_string())),
        }
    }
}

/// Cleans a raw player name, returning `None` when its first `max_len`
/// characters are nothing but whitespace.
pub fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let kept: Vec<char> = raw.chars().take(max_len).collect();
    if kept.iter().all(|c| c.is_whitespace()) {
        return None;
    }

    let name = kept
        .into_iter()
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' || c == '\t' {
                c
            } else {
                '_'
            }
        })
        .collect();

    Some(name)
}

/// Why a client is being sent away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuitReason {
    SpectatorReplaced,
    ThanksForWatching,
    ThanksForPlaying,
    GameFull,
    MissingName,
    GameOver(Vec<ScoreLine>),
}

/// One row of the final leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLine {
    pub id: char,
    pub gold: u32,
    pub name: String,
}

impl fmt::Display for QuitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuitReason::SpectatorReplaced => {
                write!(f, "You have been replaced by a new spectator.")
            }
            QuitReason::ThanksForWatching => write!(f, "Thanks for watching!"),
            QuitReason::ThanksForPlaying => write!(f, "Thanks for playing!"),
            QuitReason::GameFull => write!(f, "Game is full: no more players can join."),
            QuitReason::MissingName => write!(f, "Sorry - you must provide player's name."),
            QuitReason::GameOver(scores) => {
                write!(f, "GAME OVER:")?;
                for line in scores {
                    write!(f, "\n{}       {:>3} {}", line.id, line.gold, line.name)?;
                }
                Ok(())
            }
        }
    }
}

/// Messages sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ok { id: char },
    Grid { rows: usize, columns: usize },
    Gold { collected: u32, purse: u32, remaining: u32 },
    Display { map: String },
    Quit(QuitReason),
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Ok { id } => write!(f, "OK {}", id),
            Message::Grid { rows, columns } => write!(f, "GRID {} {}", rows, columns),
            Message::Gold {
                collected,
                purse,
                remaining,
            } => write!(f, "GOLD {} {} {}", collected, purse, remaining),
            Message::Display { map } => write!(f, "DISPLAY\n{}", map),
            Message::Quit(reason) => write!(f, "QUIT {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play() {
        let request = Request::parse("PLAY Alice", 50).unwrap();
        assert_eq!(
            request,
            Request::Play {
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn test_parse_play_keeps_inner_spaces() {
        let request = Request::parse("PLAY Mary Ann", 50).unwrap();
        assert_eq!(
            request,
            Request::Play {
                name: "Mary Ann".to_string()
            }
        );
    }

    #[test]
    fn test_parse_play_missing_name() {
        assert_eq!(Request::parse("PLAY", 50), Err(ProtocolError::MissingName));
        assert_eq!(Request::parse("PLAY    ", 50), Err(ProtocolError::MissingName));
    }

    #[test]
    fn test_parse_play_blank_after_truncation() {
        let text = format!("PLAY {}bob", " ".repeat(60));
        assert_eq!(Request::parse(&text, 50), Err(ProtocolError::MissingName));
        assert_eq!(sanitize_name("   bob", 3), None);
        assert_eq!(sanitize_name("  bob", 3), Some("  b".to_string()));
    }

    #[test]
    fn test_parse_play_truncates_and_sanitizes() {
        let request = Request::parse("PLAY ab\u{7}cdef", 4).unwrap();
        assert_eq!(
            request,
            Request::Play {
                name: "ab_c".to_string()
            }
        );
    }

    #[test]
    fn test_parse_spectate() {
        assert_eq!(Request::parse("SPECTATE", 50), Ok(Request::Spectate));
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(Request::parse("KEY h", 50), Ok(Request::Key('h')));
        assert_eq!(Request::parse("KEY L", 50), Ok(Request::Key('L')));
    }

    #[test]
    fn test_parse_malformed_key() {
        assert!(matches!(
            Request::parse("KEY", 50),
            Err(ProtocolError::MalformedKey(_))
        ));
        assert!(matches!(
            Request::parse("KEY hj", 50),
            Err(ProtocolError::MalformedKey(_))
        ));
        assert!(matches!(
            Request::parse("KEY 7", 50),
            Err(ProtocolError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert_eq!(Request::parse("", 50), Err(ProtocolError::Empty));
        assert_eq!(
            Request::parse("DANCE now", 50),
            Err(ProtocolError::UnknownRequest("DANCE".to_string()))
        );
    }

    #[test]
    fn test_message_formatting() {
        assert_eq!(Message::Ok { id: 'A' }.to_string(), "OK A");
        assert_eq!(
            Message::Grid {
                rows: 21,
                columns: 79
            }
            .to_string(),
            "GRID 21 79"
        );
        assert_eq!(
            Message::Gold {
                collected: 12,
                purse: 40,
                remaining: 210
            }
            .to_string(),
            "GOLD 12 40 210"
        );
        assert_eq!(
            Message::Display {
                map: "+-+\n|.|\n+-+".to_string()
            }
            .to_string(),
            "DISPLAY\n+-+\n|.|\n+-+"
        );
    }

    #[test]
    fn test_quit_reasons() {
        assert_eq!(
            Message::Quit(QuitReason::GameFull).to_string(),
            "QUIT Game is full: no more players can join."
        );
        assert_eq!(
            Message::Quit(QuitReason::MissingName).to_string(),
            "QUIT Sorry - you must provide player's name."
        );
        assert_eq!(
            Message::Quit(QuitReason::SpectatorReplaced).to_string(),
            "QUIT You have been replaced by a new spectator."
        );
    }

    #[test]
    fn test_game_over_leaderboard() {
        let scores = vec![
            ScoreLine {
                id: 'A',
                gold: 120,
                name: "Alice".to_string(),
            },
            ScoreLine {
                id: 'B',
                gold: 5,
                name: "Bob".to_string(),
            },
        ];

        assert_eq!(
            Message::Quit(QuitReason::GameOver(scores)).to_string(),
            "QUIT GAME OVER:\nA       120 Alice\nB         5 Bob"
        );
    }

    #[test]
    fn test_symbol_classes() {
        for symbol in [CORNER, WALL_VERTICAL, WALL_HORIZONTAL, VOID] {
            assert!(is_blocking(symbol));
        }
        for symbol in [FLOOR, TUNNEL, GOLD, b'A'] {
            assert!(!is_blocking(symbol));
        }
        assert!(is_player_symbol(b'Z'));
        assert!(!is_player_symbol(SELF));
        assert!(is_map_symbol(TUNNEL));
        assert!(!is_map_symbol(b'A'));
    }
}
