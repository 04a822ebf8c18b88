//! Reply assertions.
//!
//! Every function here is a pure predicate over a [`ReplyBatch`]: it never
//! touches a connection, and a batch that is shorter than expected is a
//! failed [`Verdict`], never an error.

use crate::protocol::ReplyBatch;

pub mod grammar;
pub mod pattern;

pub use self::pattern::{ParamMatch, PrefixMatch, ReplyPattern, ReplySequence, TextMatch};

/// Outcome of one assertion, with a line of explanation either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(String),
    Fail(String),
}

impl Verdict {
    pub fn pass(explanation: impl Into<String>) -> Self {
        Verdict::Pass(explanation.into())
    }

    pub fn fail(explanation: impl Into<String>) -> Self {
        Verdict::Fail(explanation.into())
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass(_))
    }

    pub fn explanation(&self) -> &str {
        match self {
            Verdict::Pass(e) | Verdict::Fail(e) => e,
        }
    }

    /// Replaces a failure's explanation, keeping passes untouched.
    pub fn or_explain(self, explanation: impl FnOnce(&str) -> String) -> Self {
        match self {
            Verdict::Fail(e) => Verdict::Fail(explanation(&e)),
            pass => pass,
        }
    }
}

/// Nothing arrived during the window.
pub fn silence(batch: &ReplyBatch) -> Verdict {
    if batch.is_empty() {
        Verdict::pass("no reply, as expected")
    } else {
        Verdict::fail(format!(
            "expected silence, got {} line(s): {}",
            batch.len(),
            batch.dump()
        ))
    }
}

/// Exactly one line in the batch matches `pattern`; other lines are ignored.
pub fn single(batch: &ReplyBatch, pattern: &ReplyPattern) -> Verdict {
    match batch.iter().filter(|line| pattern.matches(line)).count() {
        1 => Verdict::pass(format!("{pattern} correct")),
        0 => Verdict::fail(format!("{pattern} incorrect: {}", batch.dump())),
        n => Verdict::fail(format!(
            "{pattern} incorrect: {n} matching lines, expected one: {}",
            batch.dump()
        )),
    }
}

/// Lines match the sequence position by position. Only an open-ended
/// sequence tolerates lines left over.
pub fn sequence(batch: &ReplyBatch, expected: &ReplySequence) -> Verdict {
    let lines = batch.lines();
    let head = expected.head();
    let tail = expected.tail();

    let fixed_len_ok = if expected.repeated().is_some() || expected.is_open_ended() {
        lines.len() >= expected.min_len()
    } else {
        lines.len() == expected.min_len()
    };

    for (i, pattern) in head.iter().enumerate() {
        match lines.get(i) {
            Some(line) if pattern.matches(line) => {}
            Some(line) => return Verdict::fail(format!("{pattern} incorrect: {line}")),
            None => return Verdict::fail(format!("{pattern} missing: {}", batch.dump())),
        }
    }

    if !fixed_len_ok {
        return Verdict::fail(format!(
            "expected {} line(s), got {}: {}",
            expected.min_len(),
            lines.len(),
            batch.dump()
        ));
    }

    if expected.is_open_ended() {
        let labels: Vec<&str> = head.iter().map(ReplyPattern::label).collect();
        return Verdict::pass(format!("{} correct", labels.join(", ")));
    }

    let tail_start = lines.len() - tail.len();
    if let Some(repeated) = expected.repeated() {
        for line in &lines[head.len()..tail_start] {
            if !repeated.matches(line) {
                return Verdict::fail(format!("{repeated} incorrect: {line}"));
            }
        }
    }

    for (pattern, line) in tail.iter().zip(&lines[tail_start..]) {
        if !pattern.matches(line) {
            return Verdict::fail(format!("{pattern} incorrect: {line}"));
        }
    }

    let labels: Vec<&str> = head
        .iter()
        .chain(expected.repeated())
        .chain(tail)
        .map(ReplyPattern::label)
        .collect();
    Verdict::pass(format!("{} correct", labels.join(", ")))
}

/// Exactly two lines, one matching each pattern, in either order.
pub fn unordered_pair(batch: &ReplyBatch, a: &ReplyPattern, b: &ReplyPattern) -> Verdict {
    if batch.len() != 2 {
        return Verdict::fail(format!(
            "expected 2 lines ({a} and {b}), got {}: {}",
            batch.len(),
            batch.dump()
        ));
    }
    let (first, second) = (&batch.lines()[0], &batch.lines()[1]);
    if (a.matches(first) && b.matches(second)) || (a.matches(second) && b.matches(first)) {
        Verdict::pass(format!("{a} and {b} correct"))
    } else {
        Verdict::fail(format!("{a} and {b} incorrect: {}", batch.dump()))
    }
}

/// The batch is exactly one line and it matches `pattern`.
pub fn numeric_error(batch: &ReplyBatch, pattern: &ReplyPattern) -> Verdict {
    match batch.lines() {
        [line] if pattern.matches(line) => Verdict::pass(format!("{pattern} correct")),
        _ => Verdict::fail(format!(
            "should return {pattern} and nothing more, got: {}",
            batch.dump()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Numeric;

    fn batch(lines: &[&str]) -> ReplyBatch {
        ReplyBatch::new(lines.iter().map(|l| l.to_string()).collect())
    }

    fn privmsg(from: &str, to: &str, text: &str) -> ReplyPattern {
        ReplyPattern::command("PRIVMSG")
            .from_nick(from)
            .exact(to)
            .trailing(TextMatch::Exact(text.to_string()))
    }

    fn motd(nick: &str) -> ReplySequence {
        ReplySequence::framed(
            vec![ReplyPattern::numeric(Numeric::MotdStart)
                .exact(nick)
                .trailing(TextMatch::Contains("Message of the day".into()))],
            ReplyPattern::numeric(Numeric::Motd)
                .exact(nick)
                .trailing(TextMatch::StartsWith("-".into())),
            vec![ReplyPattern::numeric(Numeric::EndOfMotd)
                .exact(nick)
                .canonical_text(Numeric::EndOfMotd)],
        )
    }

    fn join(nick: &str, channel: &str) -> ReplySequence {
        ReplySequence::exact(vec![
            ReplyPattern::command("JOIN").from_nick(nick).exact(channel),
            ReplyPattern::numeric(Numeric::NamReply)
                .exact(nick)
                .exact("=")
                .exact(channel)
                .trailing(TextMatch::Word(nick.to_string())),
            ReplyPattern::numeric(Numeric::EndOfNames)
                .exact(nick)
                .exact(channel)
                .canonical_text(Numeric::EndOfNames),
        ])
    }

    #[test]
    fn test_silence() {
        assert!(silence(&batch(&[])).is_pass());
        let verdict = silence(&batch(&[":srv NOTICE * :hi"]));
        assert!(!verdict.is_pass());
        assert!(verdict.explanation().contains("NOTICE"));
    }

    #[test]
    fn test_single_requires_exactly_one_match() {
        let pattern = privmsg("rui2", "rui", "hello");
        assert!(single(&batch(&[":rui2!u@h PRIVMSG rui :hello"]), &pattern).is_pass());
        assert!(single(
            &batch(&[":srv NOTICE rui :noise", ":rui2!u@h PRIVMSG rui :hello"]),
            &pattern
        )
        .is_pass());
        assert!(!single(&batch(&[]), &pattern).is_pass());
        assert!(!single(
            &batch(&[":rui2!u@h PRIVMSG rui :hello", ":rui2!u@h PRIVMSG rui :hello"]),
            &pattern
        )
        .is_pass());
    }

    #[test]
    fn test_join_sequence_in_order() {
        let lines = [
            ":alice!alice@127.0.0.1 JOIN #test",
            ":srv 353 alice = #test :alice",
            ":srv 366 alice #test :End of /NAMES list",
        ];
        let verdict = sequence(&batch(&lines), &join("alice", "#test"));
        assert!(verdict.is_pass(), "{}", verdict.explanation());

        let swapped = [lines[1], lines[0], lines[2]];
        assert!(!sequence(&batch(&swapped), &join("alice", "#test")).is_pass());
    }

    #[test]
    fn test_exact_sequence_rejects_missing_and_extra_lines() {
        let lines = [
            ":alice JOIN #test",
            ":srv 353 alice = #test :alice",
            ":srv 366 alice #test :End of /NAMES list",
        ];
        assert!(!sequence(&batch(&lines[..2]), &join("alice", "#test")).is_pass());

        let mut extra = lines.to_vec();
        extra.push(":srv 332 alice #test :topic");
        assert!(!sequence(&batch(&extra), &join("alice", "#test")).is_pass());
    }

    #[test]
    fn test_prefix_sequence_ignores_what_follows() {
        let expected = ReplySequence::prefix(vec![
            ReplyPattern::numeric(Numeric::ListStart).exact("rui"),
            ReplyPattern::numeric(Numeric::ListEnd).exact("rui"),
        ]);
        let lines = [
            ":srv 321 rui Channel :Users Name",
            ":srv 323 rui :End of /LIST",
            ":srv NOTICE rui :later",
        ];
        assert!(sequence(&batch(&lines), &expected).is_pass());
        assert!(sequence(&batch(&lines[..2]), &expected).is_pass());
        assert!(!sequence(&batch(&lines[..1]), &expected).is_pass());
        assert!(!sequence(&batch(&[lines[1], lines[0]]), &expected).is_pass());
    }

    #[test]
    fn test_motd_sequence_with_body() {
        let mut lines = vec![":srv 375 rui :- srv Message of the day -"];
        assert!(!sequence(&batch(&lines), &motd("rui")).is_pass());

        lines.push(":srv 376 rui :End of /MOTD command");
        assert!(sequence(&batch(&lines), &motd("rui")).is_pass());

        lines.insert(1, ":srv 372 rui :- Welcome");
        lines.insert(2, ":srv 372 rui :- Be nice");
        assert!(sequence(&batch(&lines), &motd("rui")).is_pass());

        lines.insert(2, ":srv 999 rui :- odd one out");
        let verdict = sequence(&batch(&lines), &motd("rui"));
        assert!(!verdict.is_pass());
        assert!(verdict.explanation().contains("RPL_MOTD 372"));
    }

    #[test]
    fn test_motd_sequence_wrong_end() {
        let lines = [
            ":srv 375 rui :- srv Message of the day -",
            ":srv 372 rui :- Welcome",
        ];
        let verdict = sequence(&batch(&lines), &motd("rui"));
        assert!(!verdict.is_pass());
        assert!(verdict.explanation().contains("RPL_ENDOFMOTD 376"));
    }

    #[test]
    fn test_unordered_pair_either_order() {
        let to_nick = privmsg("bob", "alice", "hello");
        let to_chan = privmsg("bob", "#test", "hello");
        let a = ":bob!b@h PRIVMSG alice :hello";
        let b = ":bob!b@h PRIVMSG #test :hello";

        assert!(unordered_pair(&batch(&[a, b]), &to_nick, &to_chan).is_pass());
        assert!(unordered_pair(&batch(&[b, a]), &to_nick, &to_chan).is_pass());
        assert!(!unordered_pair(&batch(&[a, a]), &to_nick, &to_chan).is_pass());
        assert!(!unordered_pair(&batch(&[a]), &to_nick, &to_chan).is_pass());
        assert!(!unordered_pair(&batch(&[a, b, b]), &to_nick, &to_chan).is_pass());
    }

    #[test]
    fn test_numeric_error_is_exact_count() {
        let pattern = ReplyPattern::numeric(Numeric::NoNicknameGiven)
            .exact("rui")
            .canonical_text(Numeric::NoNicknameGiven);
        let line = ":srv 431 rui :No nickname given";

        assert!(numeric_error(&batch(&[line]), &pattern).is_pass());
        assert!(!numeric_error(&batch(&[]), &pattern).is_pass());
        let verdict = numeric_error(&batch(&[line, ":srv NOTICE rui :extra"]), &pattern);
        assert!(!verdict.is_pass());
        assert!(verdict.explanation().contains("ERR_NONICKNAMEGIVEN 431"));
    }

    #[test]
    fn test_or_explain_only_touches_failures() {
        let pass = Verdict::pass("ok").or_explain(|e| format!("wrapped {e}"));
        assert_eq!(pass, Verdict::pass("ok"));
        let fail = Verdict::fail("bad").or_explain(|e| format!("wrapped {e}"));
        assert_eq!(fail.explanation(), "wrapped bad");
    }
}
