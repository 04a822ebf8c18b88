//! Typed description of one expected server line.
//!
//! A [`ReplyPattern`] names the prefix, command and parameters a line must
//! carry. Parameters are compared token by token in position; anything the
//! pattern does not mention (extra middle parameters, surrounding
//! whitespace, message tags) is tolerated.

use std::fmt;

use crate::protocol::{Message, Numeric};

/// Who a line must come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixMatch {
    /// Prefix optional and unchecked
    Any,
    /// Some prefix must be present (the server name is not checked)
    Server,
    /// Prefix must belong to this nickname (`nick` or `nick!user@host`)
    Nick(String),
    /// Prefix must be the full `nick!user@host` mask of this nickname
    Mask(String),
}

impl PrefixMatch {
    fn matches(&self, msg: &Message) -> bool {
        match self {
            PrefixMatch::Any => true,
            PrefixMatch::Server => msg.prefix.as_deref().is_some_and(|p| !p.is_empty()),
            PrefixMatch::Nick(nick) => msg.source_nick() == Some(nick.as_str()),
            PrefixMatch::Mask(nick) => {
                let Some(prefix) = msg.prefix.as_deref() else {
                    return false;
                };
                let Some((n, rest)) = prefix.split_once('!') else {
                    return false;
                };
                let Some((user, host)) = rest.split_once('@') else {
                    return false;
                };
                n == nick && !user.is_empty() && !host.is_empty()
            }
        }
    }
}

/// Expectation for one middle parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamMatch {
    Any,
    Exact(String),
    /// Servers may echo a truncated or a full identifier; both start alike.
    StartsWith(String),
}

impl ParamMatch {
    fn matches(&self, param: &str) -> bool {
        match self {
            ParamMatch::Any => true,
            ParamMatch::Exact(expected) => param == expected,
            ParamMatch::StartsWith(expected) => param.starts_with(expected.as_str()),
        }
    }
}

/// Expectation for the trailing (last) parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    Any,
    Exact(String),
    StartsWith(String),
    Contains(String),
    /// A whitespace separated word, ignoring `@`/`+` membership prefixes
    Word(String),
}

impl TextMatch {
    fn matches(&self, text: &str) -> bool {
        let text = text.trim_end();
        match self {
            TextMatch::Any => true,
            TextMatch::Exact(expected) => text == expected.trim_end(),
            TextMatch::StartsWith(expected) => text.starts_with(expected.as_str()),
            TextMatch::Contains(expected) => text.contains(expected.as_str()),
            TextMatch::Word(word) => text
                .split_whitespace()
                .any(|w| w.trim_start_matches(['@', '+']) == word),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPattern {
    label: String,
    prefix: PrefixMatch,
    command: String,
    params: Vec<ParamMatch>,
    trailing: Option<TextMatch>,
}

impl ReplyPattern {
    /// A numeric reply from the server.
    pub fn numeric(numeric: Numeric) -> Self {
        Self {
            label: numeric.to_string(),
            prefix: PrefixMatch::Server,
            command: numeric.code().to_string(),
            params: Vec::new(),
            trailing: None,
        }
    }

    /// A named command such as `JOIN` or `PRIVMSG`.
    pub fn command(command: &str) -> Self {
        Self {
            label: command.to_uppercase(),
            prefix: PrefixMatch::Any,
            command: command.to_string(),
            params: Vec::new(),
            trailing: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn from_prefix(mut self, prefix: PrefixMatch) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn from_nick(self, nick: &str) -> Self {
        self.from_prefix(PrefixMatch::Nick(nick.to_string()))
    }

    pub fn from_mask(self, nick: &str) -> Self {
        self.from_prefix(PrefixMatch::Mask(nick.to_string()))
    }

    pub fn param(mut self, param: ParamMatch) -> Self {
        self.params.push(param);
        self
    }

    pub fn exact(self, value: &str) -> Self {
        self.param(ParamMatch::Exact(value.to_string()))
    }

    pub fn starts_with(self, value: &str) -> Self {
        self.param(ParamMatch::StartsWith(value.to_string()))
    }

    pub fn any_param(self) -> Self {
        self.param(ParamMatch::Any)
    }

    pub fn trailing(mut self, text: TextMatch) -> Self {
        self.trailing = Some(text);
        self
    }

    /// Trailing text starting with the numeric's canonical text.
    pub fn canonical_text(self, numeric: Numeric) -> Self {
        match numeric.text() {
            Some(text) => self.trailing(TextMatch::StartsWith(text.to_string())),
            None => self.trailing(TextMatch::Any),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, line: &str) -> bool {
        line.parse::<Message>()
            .map(|msg| self.matches_message(&msg))
            .unwrap_or(false)
    }

    pub fn matches_message(&self, msg: &Message) -> bool {
        if !msg.command.eq_ignore_ascii_case(&self.command) || !self.prefix.matches(msg) {
            return false;
        }

        let positional = match &self.trailing {
            Some(text) => {
                if msg.params.len() <= self.params.len() {
                    return false;
                }
                let (last, rest) = match msg.params.split_last() {
                    Some(split) => split,
                    None => return false,
                };
                if !text.matches(last) {
                    return false;
                }
                rest
            }
            None => &msg.params[..],
        };

        positional.len() >= self.params.len()
            && self
                .params
                .iter()
                .zip(positional)
                .all(|(expected, actual)| expected.matches(actual))
    }
}

impl fmt::Display for ReplyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Several lines that must appear in order and account for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySequence {
    head: Vec<ReplyPattern>,
    repeated: Option<ReplyPattern>,
    tail: Vec<ReplyPattern>,
    /// Lines past the expected ones are ignored
    open_ended: bool,
}

impl ReplySequence {
    /// Exactly these lines, in this order, and nothing else.
    pub fn exact(patterns: Vec<ReplyPattern>) -> Self {
        Self {
            head: patterns,
            repeated: None,
            tail: Vec::new(),
            open_ended: false,
        }
    }

    /// These lines first, in this order; whatever follows is not looked at.
    pub fn prefix(patterns: Vec<ReplyPattern>) -> Self {
        Self {
            open_ended: true,
            ..Self::exact(patterns)
        }
    }

    /// `head`, then zero or more lines matching `repeated`, then `tail`.
    pub fn framed(head: Vec<ReplyPattern>, repeated: ReplyPattern, tail: Vec<ReplyPattern>) -> Self {
        Self {
            head,
            repeated: Some(repeated),
            tail,
            open_ended: false,
        }
    }

    pub fn head(&self) -> &[ReplyPattern] {
        &self.head
    }

    pub fn repeated(&self) -> Option<&ReplyPattern> {
        self.repeated.as_ref()
    }

    pub fn tail(&self) -> &[ReplyPattern] {
        &self.tail
    }

    pub fn is_open_ended(&self) -> bool {
        self.open_ended
    }

    /// Smallest number of lines that can satisfy the sequence.
    pub fn min_len(&self) -> usize {
        self.head.len() + self.tail.len()
    }
}
