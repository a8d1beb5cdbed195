//! Line commands read from stdin.
//!
//! ```text
//! down <key>   press a key
//! up <key>     release a key
//! tap <key>    press and release
//! image        ask the server for an image
//! quit         stop and exit
//! ```

use crate::error::RemotePadError;

use remote_core::connection::ConnectionHandle;
use remote_core::error::ConnectionError;

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    KeyDown(char),
    KeyUp(char),
    Tap(char),
    RequestImage,
    Quit,
}

impl InputCommand {
    /// Parse one line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RemotePadError::Input`] for unknown commands, missing or extra
    /// arguments, and keys longer than one character.
    pub fn parse(line: &str) -> Result<Option<Self>, RemotePadError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "down" => InputCommand::KeyDown(parse_key(verb, words.next())?),
            "up" => InputCommand::KeyUp(parse_key(verb, words.next())?),
            "tap" => InputCommand::Tap(parse_key(verb, words.next())?),
            "image" => InputCommand::RequestImage,
            "quit" | "exit" => InputCommand::Quit,
            other => {
                return Err(RemotePadError::input(format!(
                    "unknown command '{other}' (expected down, up, tap, image or quit)"
                )));
            }
        };

        if let Some(extra) = words.next() {
            return Err(RemotePadError::input(format!(
                "unexpected argument '{extra}' after '{verb}'"
            )));
        }

        Ok(Some(command))
    }

    /// Forward the command to the connection. `Quit` is left to the caller.
    pub fn apply(self, connection: &ConnectionHandle) -> Result<(), ConnectionError> {
        match self {
            InputCommand::KeyDown(key) => connection.send_key_down(key),
            InputCommand::KeyUp(key) => connection.send_key_up(key),
            InputCommand::Tap(key) => {
                connection.send_key_down(key)?;
                connection.send_key_up(key)
            }
            InputCommand::RequestImage => connection.request_image(),
            InputCommand::Quit => Ok(()),
        }
    }
}

impl FromStr for InputCommand {
    type Err = RemotePadError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        InputCommand::parse(line)?.ok_or_else(|| RemotePadError::input("empty command"))
    }
}

fn parse_key(verb: &str, word: Option<&str>) -> Result<char, RemotePadError> {
    let Some(word) = word else {
        return Err(RemotePadError::input(format!("'{verb}' needs a key")));
    };

    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key),
        _ => Err(RemotePadError::input(format!(
            "key must be a single character, got '{word}'"
        ))),
    }
}
