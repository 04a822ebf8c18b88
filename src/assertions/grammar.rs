//! Expected reply shapes for the commands the tester exercises.
//!
//! `nick` is always the nickname the server should address the reply to,
//! which is `*` for a client that has not registered yet.

use super::{ReplyPattern, ReplySequence, TextMatch};
use crate::protocol::Numeric;
use crate::utils::truncate;

/// Identifiers longer than this may come back truncated in error replies.
pub const ECHO_PREFIX_LEN: usize = 9;

fn numeric(code: Numeric, nick: &str) -> ReplyPattern {
    ReplyPattern::numeric(code).exact(nick)
}

/// 375, any number of 372, then 376.
pub fn motd(nick: &str) -> ReplySequence {
    ReplySequence::framed(
        vec![numeric(Numeric::MotdStart, nick).trailing(TextMatch::Contains(
            Numeric::MotdStart.text().unwrap_or_default().to_string(),
        ))],
        numeric(Numeric::Motd, nick).trailing(TextMatch::StartsWith("-".to_string())),
        vec![numeric(Numeric::EndOfMotd, nick).canonical_text(Numeric::EndOfMotd)],
    )
}

pub fn join_echo(from: &str, channel: &str) -> ReplyPattern {
    ReplyPattern::command("JOIN").from_nick(from).exact(channel)
}

/// The joiner's own echo, then the names list.
pub fn join(nick: &str, channel: &str) -> ReplySequence {
    ReplySequence::exact(vec![
        join_echo(nick, channel).labelled("JOIN echo"),
        numeric(Numeric::NamReply, nick)
            .exact("=")
            .exact(channel)
            .trailing(TextMatch::Word(nick.to_string())),
        numeric(Numeric::EndOfNames, nick)
            .exact(channel)
            .canonical_text(Numeric::EndOfNames),
    ])
}

/// One 352 line for the asking client, then 315. Anything after that is
/// not part of the reply.
pub fn who(nick: &str, mask: &str, username: &str) -> ReplySequence {
    ReplySequence::prefix(vec![
        numeric(Numeric::WhoReply, nick)
            .exact(mask)
            .exact(username)
            .any_param()
            .any_param()
            .exact(nick)
            .exact("H")
            .trailing(TextMatch::StartsWith("0".to_string())),
        numeric(Numeric::EndOfWho, nick)
            .exact(mask)
            .canonical_text(Numeric::EndOfWho),
    ])
}

/// 321, one 322 for `channel` with `users` members, then 323, as the
/// first three lines.
pub fn list(nick: &str, channel: &str, users: u32) -> ReplySequence {
    ReplySequence::prefix(vec![
        numeric(Numeric::ListStart, nick)
            .exact("Channel")
            .canonical_text(Numeric::ListStart),
        numeric(Numeric::List, nick)
            .exact(channel)
            .exact(&users.to_string()),
        numeric(Numeric::ListEnd, nick).canonical_text(Numeric::ListEnd),
    ])
}

pub fn privmsg(from: &str, to: &str, text: &str) -> ReplyPattern {
    ReplyPattern::command("PRIVMSG")
        .from_nick(from)
        .exact(to)
        .trailing(TextMatch::Exact(text.to_string()))
        .labelled(format!("PRIVMSG to {to}"))
}

/// A part is announced to every member as a QUIT from the full mask.
pub fn part_echo(nick: &str) -> ReplyPattern {
    ReplyPattern::command("QUIT")
        .from_mask(nick)
        .trailing(TextMatch::Any)
        .labelled(format!("QUIT from {nick}"))
}

pub fn erroneous_nick(nick: &str, attempted: &str) -> ReplyPattern {
    numeric(Numeric::ErroneousNickname, nick)
        .starts_with(&truncate(attempted, ECHO_PREFIX_LEN))
        .canonical_text(Numeric::ErroneousNickname)
}

pub fn nick_in_use(nick: &str, attempted: &str) -> ReplyPattern {
    numeric(Numeric::NicknameInUse, nick)
        .exact(attempted)
        .canonical_text(Numeric::NicknameInUse)
}

pub fn no_nick_given(nick: &str) -> ReplyPattern {
    numeric(Numeric::NoNicknameGiven, nick).canonical_text(Numeric::NoNicknameGiven)
}

pub fn need_more_params(nick: &str, command: &str) -> ReplyPattern {
    numeric(Numeric::NeedMoreParams, nick)
        .exact(command)
        .canonical_text(Numeric::NeedMoreParams)
}

pub fn already_registered(nick: &str) -> ReplyPattern {
    numeric(Numeric::AlreadyRegistered, nick).canonical_text(Numeric::AlreadyRegistered)
}

pub fn no_such_channel(nick: &str, channel: &str) -> ReplyPattern {
    numeric(Numeric::NoSuchChannel, nick)
        .starts_with(&truncate(channel, ECHO_PREFIX_LEN))
        .canonical_text(Numeric::NoSuchChannel)
}

pub fn not_on_channel(nick: &str, channel: &str) -> ReplyPattern {
    numeric(Numeric::NotOnChannel, nick)
        .exact(channel)
        .canonical_text(Numeric::NotOnChannel)
}

pub fn no_recipient(nick: &str) -> ReplyPattern {
    numeric(Numeric::NoRecipient, nick).canonical_text(Numeric::NoRecipient)
}

pub fn no_text_to_send(nick: &str) -> ReplyPattern {
    numeric(Numeric::NoTextToSend, nick).canonical_text(Numeric::NoTextToSend)
}

/// One 401 per unknown target, in the order the targets were given.
pub fn no_such_targets(nick: &str, targets: &[String]) -> ReplySequence {
    ReplySequence::exact(
        targets
            .iter()
            .map(|target| {
                numeric(Numeric::NoSuchNick, nick)
                    .exact(target)
                    .canonical_text(Numeric::NoSuchNick)
                    .labelled(format!("{} for {target}", Numeric::NoSuchNick))
            })
            .collect(),
    )
}
