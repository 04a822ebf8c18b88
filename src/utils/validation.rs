use once_cell::sync::Lazy;
use regex::Regex;

// Scenario identifiers end up verbatim on the wire, so these only guard
// against values that would break line framing or parameter splitting.

static NICKNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z\[\]\\`_^{|}][a-zA-Z0-9\[\]\\`_^{|}-]{0,29}$").unwrap()
});

static CHANNEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[#&][^\x00\x07\x0a\x0d ,:]{1,49}$").unwrap()
});

static CLIENT_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]{1,32}$").unwrap()
});

pub fn validate_nickname(nick: &str) -> bool {
    if nick.is_empty() || nick.len() > 30 {
        return false;
    }

    NICKNAME_REGEX.is_match(nick)
}

pub fn validate_channel_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 50 {
        return false;
    }

    CHANNEL_REGEX.is_match(name)
}

pub fn validate_client_label(label: &str) -> bool {
    CLIENT_LABEL_REGEX.is_match(label)
}

/// Text that can travel as a trailing parameter.
pub fn validate_message(message: &str) -> bool {
    !message.chars().any(|c| matches!(c, '\x00' | '\r' | '\n'))
}
