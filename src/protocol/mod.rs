use std::str::FromStr;

use thiserror::Error;

pub mod codec;
pub mod replies;

pub use self::codec::{LineCodec, Outgoing};
pub use self::replies::Numeric;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("missing command")]
    MissingCommand,
}

/// One server line split into the `:prefix COMMAND params :trailing` shape.
///
/// The trailing parameter, when present, is stored as the last element of
/// `params` with `has_trailing` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub has_trailing: bool,
}

impl Message {
    /// Nickname part of the prefix (`nick` in `nick!user@host`).
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split(['!', '@']).next().unwrap_or(p))
    }

    pub fn trailing(&self) -> Option<&str> {
        if self.has_trailing {
            self.params.last().map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();

        // IRCv3 message tags carry nothing the checks look at
        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r.trim_start()).unwrap_or("");
        }
        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (p, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
            prefix = Some(p.to_string());
            rest = r.trim_start();
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ParseError::MissingCommand);
        }

        let mut params = Vec::new();
        let mut has_trailing = false;
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                has_trailing = true;
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Ok(Message {
            prefix,
            command: command.to_string(),
            params,
            has_trailing,
        })
    }
}

/// Lines observed during one collection window, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyBatch {
    lines: Vec<String>,
}

impl ReplyBatch {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Lines joined for diagnostics.
    pub fn dump(&self) -> String {
        if self.lines.is_empty() {
            "<nothing>".to_string()
        } else {
            self.lines.join(" | ")
        }
    }
}

impl From<Vec<String>> for ReplyBatch {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}
