//! Line-based console transport.
//!
//! Each stdin line stands in for one chat message:
//!
//! ```text
//! <channel_id> <player_id> <player_name> !command [args...]
//! ```
//!
//! Names are single tokens in this framing. Pick targets are pool numbers
//! or `@<player_id>` references; `!last` takes an optional game name, an
//! optional numeric back index, and an optional second word as a player
//! name filter.

use compact_str::CompactString;
use pickup_core::command::Command;
use pickup_core::draft::PickToken;
use pickup_core::pickup::ReadyReaction;
use pickup_core::player::{Player, PlayerId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected: <channel> <player_id> <name> !command")]
    BadFrame,
    #[error("unknown command {0}")]
    UnknownCommand(CompactString),
    #[error("{0}")]
    BadArguments(&'static str),
}

/// One parsed line, ready for the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleInput {
    pub channel: u64,
    pub issuer: Player,
    pub command: Command,
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    let mut words = line.split_whitespace();
    let channel: u64 = words
        .next()
        .and_then(|w| w.parse().ok())
        .ok_or(ParseError::BadFrame)?;
    let player_id: u64 = words
        .next()
        .and_then(|w| w.parse().ok())
        .ok_or(ParseError::BadFrame)?;
    let name = words.next().ok_or(ParseError::BadFrame)?;
    let verb = words.next().ok_or(ParseError::BadFrame)?;
    let args: Vec<&str> = words.collect();

    let command = parse_command(verb, &args)?;
    Ok(ConsoleInput {
        channel,
        issuer: Player::new(player_id, name),
        command,
    })
}

fn parse_command(verb: &str, args: &[&str]) -> Result<Command, ParseError> {
    match verb {
        "!enable" => Ok(Command::Enable),
        "!add" => {
            let name = args
                .first()
                .ok_or(ParseError::BadArguments("usage: !add <name> <players> [captains]"))?;
            let size: usize = args
                .get(1)
                .and_then(|w| w.parse().ok())
                .ok_or(ParseError::BadArguments("player count must be a number"))?;
            let captains: usize = match args.get(2) {
                Some(w) => w
                    .parse()
                    .map_err(|_| ParseError::BadArguments("captain count must be a number"))?,
                None => 2,
            };
            Ok(Command::AddGame {
                name: (*name).into(),
                size,
                captains,
            })
        }
        "!set" => match args {
            [game, key, value] => Ok(Command::SetOption {
                game: (*game).into(),
                key: (*key).into(),
                value: (*value).into(),
            }),
            _ => Err(ParseError::BadArguments("usage: !set <game> <key> <value>")),
        },
        "!j" | "!join" => match args {
            [game] => Ok(Command::Join { game: (*game).into() }),
            _ => Err(ParseError::BadArguments("usage: !j <game>")),
        },
        "!l" | "!leave" | "!lva" => match args {
            [game] => Ok(Command::Leave { game: (*game).into() }),
            _ => Err(ParseError::BadArguments("usage: !l <game>")),
        },
        "!p" | "!pick" => {
            let tokens = args.iter().map(|w| parse_pick_token(w)).collect();
            Ok(Command::Pick { tokens })
        }
        "!ready" => Ok(Command::ReadyReact {
            reaction: ReadyReaction::Confirm,
        }),
        "!abort" => Ok(Command::ReadyReact {
            reaction: ReadyReaction::Abort,
        }),
        "!who" => Ok(Command::Who),
        "!last" => {
            let mut game: Option<CompactString> = None;
            let mut back_index = 0usize;
            let mut player_name: Option<CompactString> = None;
            for word in args {
                if let Ok(n) = word.parse::<usize>() {
                    back_index = n;
                } else if game.is_none() {
                    game = Some((*word).into());
                } else if player_name.is_none() {
                    player_name = Some((*word).into());
                } else {
                    return Err(ParseError::BadArguments(
                        "usage: !last [game] [back_index] [player]",
                    ));
                }
            }
            Ok(Command::Last {
                game,
                back_index,
                player_name,
            })
        }
        other => Err(ParseError::UnknownCommand(other.into())),
    }
}

/// `@<id>` is a direct reference; anything numeric is a pool position.
/// Other words stay in the token list as unresolved so the draft can skip
/// them, matching how unresolvable mentions behave.
fn parse_pick_token(word: &str) -> PickToken {
    if let Some(id) = word.strip_prefix('@').and_then(|w| w.parse().ok()) {
        return PickToken::Player(PlayerId(id));
    }
    match word.parse::<u32>() {
        Ok(n) => PickToken::Position(n),
        Err(_) => PickToken::Unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> Command {
        parse_line(line).unwrap().command
    }

    #[test]
    fn test_frame_parsing() {
        let input = parse_line("100 7 ana !j elim").unwrap();
        assert_eq!(input.channel, 100);
        assert_eq!(input.issuer.id, PlayerId(7));
        assert_eq!(input.issuer.name, "ana");
        assert_eq!(input.command, Command::Join { game: "elim".into() });
    }

    #[test]
    fn test_bad_frames() {
        assert_eq!(parse_line("").unwrap_err(), ParseError::BadFrame);
        assert_eq!(parse_line("x 7 ana !who").unwrap_err(), ParseError::BadFrame);
        assert_eq!(parse_line("100 7 ana").unwrap_err(), ParseError::BadFrame);
    }

    #[test]
    fn test_add_and_set() {
        assert_eq!(
            cmd("100 1 ana !add elim 8"),
            Command::AddGame {
                name: "elim".into(),
                size: 8,
                captains: 2
            }
        );
        assert_eq!(
            cmd("100 1 ana !add ctf 10 2"),
            Command::AddGame {
                name: "ctf".into(),
                size: 10,
                captains: 2
            }
        );
        assert_eq!(
            cmd("100 1 ana !set elim require_ready 60s"),
            Command::SetOption {
                game: "elim".into(),
                key: "require_ready".into(),
                value: "60s".into()
            }
        );
    }

    #[test]
    fn test_pick_tokens() {
        assert_eq!(
            cmd("100 1 ana !p 3 @42 2"),
            Command::Pick {
                tokens: vec![
                    PickToken::Position(3),
                    PickToken::Player(PlayerId(42)),
                    PickToken::Position(2),
                ]
            }
        );
        // Unresolvable words become skippable tokens rather than errors.
        assert_eq!(
            cmd("100 1 ana !p bob"),
            Command::Pick {
                tokens: vec![PickToken::Unresolved]
            }
        );
    }

    #[test]
    fn test_ready_reactions() {
        assert_eq!(
            cmd("100 1 ana !ready"),
            Command::ReadyReact {
                reaction: ReadyReaction::Confirm
            }
        );
        assert_eq!(
            cmd("100 1 ana !abort"),
            Command::ReadyReact {
                reaction: ReadyReaction::Abort
            }
        );
    }

    #[test]
    fn test_last_argument_shapes() {
        assert_eq!(
            cmd("100 1 ana !last"),
            Command::Last {
                game: None,
                back_index: 0,
                player_name: None
            }
        );
        assert_eq!(
            cmd("100 1 ana !last elim 2"),
            Command::Last {
                game: Some("elim".into()),
                back_index: 2,
                player_name: None
            }
        );
        assert_eq!(
            cmd("100 1 ana !last elim bob"),
            Command::Last {
                game: Some("elim".into()),
                back_index: 0,
                player_name: Some("bob".into())
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_line("100 1 ana !frobnicate").unwrap_err(),
            ParseError::UnknownCommand("!frobnicate".into())
        );
    }
}
