//! A small in-process IRC server that answers the way the conformance
//! scenario expects, so end-to-end tests have something real to talk to.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub const SERVER_NAME: &str = "irc.test";
const MAX_MESSAGE: usize = 512;
const HOST: &str = "127.0.0.1";

/// Deliberate deviations, to check that the tester notices them.
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub answer_who: bool,
    /// Greets every connection with an unterminated line this long
    pub oversized_greeting: Option<usize>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            answer_who: true,
            oversized_greeting: None,
        }
    }
}

struct Peer {
    nick: Option<String>,
    user: Option<String>,
    realname: String,
    registered: bool,
    tx: mpsc::UnboundedSender<String>,
}

impl Peer {
    fn target(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    fn mask(&self) -> String {
        format!(
            "{}!{}@{}",
            self.target(),
            self.user.as_deref().unwrap_or("unknown"),
            HOST
        )
    }
}

#[derive(Default)]
struct State {
    next_id: u64,
    peers: HashMap<u64, Peer>,
    channels: BTreeMap<String, Vec<u64>>,
    behavior: Behavior,
}

pub struct FakeServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub async fn start() -> Self {
        Self::start_with(Behavior::default()).await
    }

    pub async fn start_with(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            behavior,
            ..State::default()
        }));

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                serve(stream, Arc::clone(&accept_state));
            }
        });

        Self { addr, state }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    pub fn active_connections(&self) -> usize {
        self.state.lock().peers.len()
    }

    /// Waits up to `limit` for every client to have gone away.
    pub async fn wait_until_idle(&self, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.active_connections() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.active_connections() == 0
    }
}

fn serve(stream: TcpStream, state: Arc<Mutex<State>>) {
    let (mut reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let id = {
        let mut state = state.lock();
        if let Some(len) = state.behavior.oversized_greeting {
            let _ = tx.send("x".repeat(len));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.peers.insert(
            id,
            Peer {
                nick: None,
                user: None,
                realname: String::new(),
                registered: false,
                tx,
            },
        );
        id
    };

    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut framer = LineBuffer::default();
        let mut buf = [0u8; 1024];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    for line in framer.feed(&buf[..n]) {
                        handle(&mut state.lock(), id, &line);
                    }
                }
            }
        }
        state.lock().remove(id);
    });
}

/// Splits on `\n`, dropping any line that grows past the message limit
/// together with the rest of it up to the next newline.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
    discarding: bool,
}

impl LineBuffer {
    fn feed(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in data {
            if byte == b'\n' {
                if !self.discarding {
                    let line = String::from_utf8_lossy(&self.buf);
                    lines.push(line.trim_end_matches('\r').to_string());
                }
                self.discarding = false;
                self.buf.clear();
            } else if !self.discarding {
                self.buf.push(byte);
                if self.buf.len() >= MAX_MESSAGE {
                    self.buf.clear();
                    self.discarding = true;
                }
            }
        }
        lines
    }
}

fn parse(line: &str) -> Option<(String, Vec<String>)> {
    let (head, trailing) = match line.find(" :") {
        Some(i) => (&line[..i], Some(&line[i + 2..])),
        None => (line, None),
    };
    let mut parts = head.split_whitespace();
    let command = parts.next()?.to_uppercase();
    let mut params: Vec<String> = parts.map(str::to_string).collect();
    if let Some(text) = trailing {
        params.push(text.to_string());
    }
    Some((command, params))
}

fn valid_nick(nick: &str) -> bool {
    let mut chars = nick.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let special = |c: char| "-[]\\`^{}".contains(c);
    first_ok
        && nick.len() <= 9
        && chars.all(|c| c.is_ascii_alphanumeric() || special(c))
}

fn valid_channel(name: &str) -> bool {
    (name.starts_with('#') || name.starts_with('&'))
        && name.len() > 1
        && name.len() <= 9
        && !name.contains([' ', ',', '\x07'])
}

impl State {
    fn send(&self, id: u64, line: String) {
        if let Some(peer) = self.peers.get(&id) {
            let _ = peer.tx.send(format!("{line}\r\n"));
        }
    }

    fn numeric(&self, id: u64, code: &str, rest: &str) {
        let target = self.peers.get(&id).map(|p| p.target()).unwrap_or("*");
        self.send(id, format!(":{SERVER_NAME} {code} {target} {rest}"));
    }

    fn mask(&self, id: u64) -> String {
        self.peers.get(&id).map(Peer::mask).unwrap_or_default()
    }

    fn nick_owner(&self, nick: &str) -> Option<u64> {
        self.peers.iter().find_map(|(id, peer)| {
            peer.nick
                .as_deref()
                .filter(|n| n.eq_ignore_ascii_case(nick))
                .map(|_| *id)
        })
    }

    fn remove(&mut self, id: u64) {
        self.peers.remove(&id);
        for members in self.channels.values_mut() {
            members.retain(|m| *m != id);
        }
        self.channels.retain(|_, members| !members.is_empty());
    }

    fn try_register(&mut self, id: u64) {
        let ready = self
            .peers
            .get(&id)
            .is_some_and(|p| !p.registered && p.nick.is_some() && p.user.is_some());
        if !ready {
            return;
        }
        if let Some(peer) = self.peers.get_mut(&id) {
            peer.registered = true;
        }
        self.numeric(id, "375", &format!(":- {SERVER_NAME} Message of the day -"));
        self.numeric(id, "372", ":- Welcome to the test server");
        self.numeric(id, "372", ":- Be nice");
        self.numeric(id, "376", ":End of /MOTD command");
    }
}

fn handle(state: &mut State, id: u64, line: &str) {
    let Some((command, params)) = parse(line) else {
        return;
    };
    let registered = state.peers.get(&id).is_some_and(|p| p.registered);

    match command.as_str() {
        "NICK" => nick(state, id, &params),
        "USER" => user(state, id, &params),
        _ if !registered => state.numeric(id, "451", ":You have not registered"),
        "JOIN" => join(state, id, &params),
        "PART" => part(state, id, &params),
        "PRIVMSG" => privmsg(state, id, &params),
        "WHO" => who(state, id, &params),
        "LIST" => list(state, id),
        other => state.numeric(id, "421", &format!("{other} :Unknown command")),
    }
}

fn nick(state: &mut State, id: u64, params: &[String]) {
    let Some(nick) = params.first() else {
        state.numeric(id, "431", ":No nickname given");
        return;
    };
    if !valid_nick(nick) {
        state.numeric(id, "432", &format!("{nick} :Erroneus nickname"));
        return;
    }
    if state.nick_owner(nick).is_some_and(|owner| owner != id) {
        state.numeric(id, "433", &format!("{nick} :Nickname is already in use"));
        return;
    }
    if let Some(peer) = state.peers.get_mut(&id) {
        peer.nick = Some(nick.clone());
    }
    state.try_register(id);
}

fn user(state: &mut State, id: u64, params: &[String]) {
    if params.len() < 4 {
        state.numeric(id, "461", "USER :Not enough parameters");
        return;
    }
    if state.peers.get(&id).is_some_and(|p| p.registered) {
        state.numeric(id, "462", ":You may not reregister");
        return;
    }
    if let Some(peer) = state.peers.get_mut(&id) {
        peer.user = Some(params[0].clone());
        peer.realname = params[3].clone();
    }
    state.try_register(id);
}

fn join(state: &mut State, id: u64, params: &[String]) {
    let Some(channel) = params.first() else {
        state.numeric(id, "461", "JOIN :Not enough parameters");
        return;
    };
    if !valid_channel(channel) {
        state.numeric(id, "403", &format!("{channel} :No such channel"));
        return;
    }

    let members = state.channels.entry(channel.clone()).or_default();
    if members.contains(&id) {
        return;
    }
    members.push(id);
    let members = members.clone();

    let echo = format!(":{} JOIN {channel}", state.mask(id));
    for member in &members {
        state.send(*member, echo.clone());
    }

    let names: Vec<String> = members
        .iter()
        .filter_map(|m| state.peers.get(m).and_then(|p| p.nick.clone()))
        .collect();
    state.numeric(id, "353", &format!("= {channel} :{}", names.join(" ")));
    state.numeric(id, "366", &format!("{channel} :End of /NAMES list"));
}

fn part(state: &mut State, id: u64, params: &[String]) {
    let Some(channels) = params.first() else {
        state.numeric(id, "461", "PART :Not enough parameters");
        return;
    };

    for channel in channels.split(',') {
        let Some(members) = state.channels.get(channel).cloned() else {
            state.numeric(id, "403", &format!("{channel} :No such channel"));
            continue;
        };
        if !members.contains(&id) {
            state.numeric(id, "442", &format!("{channel} :You're not on that channel"));
            continue;
        }

        let quit = format!(":{} QUIT :Leaving {channel}", state.mask(id));
        for member in &members {
            state.send(*member, quit.clone());
        }
        if let Some(members) = state.channels.get_mut(channel) {
            members.retain(|m| *m != id);
        }
        state.channels.retain(|_, members| !members.is_empty());
    }
}

fn privmsg(state: &mut State, id: u64, params: &[String]) {
    let (targets, text) = match params {
        [] => {
            state.numeric(id, "411", ":No recipient given (PRIVMSG)");
            return;
        }
        [_] => {
            state.numeric(id, "412", ":No text to send");
            return;
        }
        [targets, text, ..] => (targets, text),
    };

    let mask = state.mask(id);
    for target in targets.split(',') {
        let line = format!(":{mask} PRIVMSG {target} :{text}");
        if let Some(members) = state.channels.get(target) {
            for member in members.iter().filter(|m| **m != id) {
                state.send(*member, line.clone());
            }
        } else if let Some(owner) = state.nick_owner(target) {
            state.send(owner, line);
        } else {
            state.numeric(id, "401", &format!("{target} :No such nick/channel"));
        }
    }
}

fn who(state: &mut State, id: u64, params: &[String]) {
    let mask = params.first().map(String::as_str).unwrap_or("*");
    if state.behavior.answer_who {
        let members = state.channels.get(mask).cloned().unwrap_or_default();
        for member in members {
            if let Some(peer) = state.peers.get(&member) {
                let line = format!(
                    "{mask} {} {HOST} {SERVER_NAME} {} H :0 {}",
                    peer.user.as_deref().unwrap_or("unknown"),
                    peer.target(),
                    peer.realname
                );
                state.numeric(id, "352", &line);
            }
        }
    }
    state.numeric(id, "315", &format!("{mask} :End of /WHO list"));
}

fn list(state: &mut State, id: u64) {
    state.numeric(id, "321", "Channel :Users Name");
    for (channel, members) in &state.channels {
        state.numeric(id, "322", &format!("{channel} {} :", members.len()));
    }
    state.numeric(id, "323", ":End of /LIST");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_is_discarded_up_to_newline() {
        let mut framer = LineBuffer::default();
        assert!(framer.feed("0".repeat(512).as_bytes()).is_empty());
        assert_eq!(framer.feed(b"1\nnick a\n"), vec!["nick a".to_string()]);
        assert_eq!(framer.feed(b"ni"), Vec::<String>::new());
        assert_eq!(framer.feed(b"ck a\n"), vec!["nick a".to_string()]);
    }
}
