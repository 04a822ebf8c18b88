//! Scripted actions: send a command, collect one reply window, check it.
//!
//! Every check returns `Ok(Verdict)` whatever the server replied; `Err`
//! only means the connection itself is unusable.

use std::time::Duration;

use tracing::debug;

use super::SimulatedClient;
use crate::assertions::{self, grammar, Verdict};
use crate::error::Result;
use crate::utils::join_targets;

impl SimulatedClient {
    /// Sends `NICK` and remembers the nickname for later expectations.
    pub async fn send_nick(&mut self, nick: &str) -> Result<()> {
        self.send(&format!("NICK {nick}")).await?;
        self.identity.nick = Some(nick.to_string());
        Ok(())
    }

    pub async fn send_user(
        &mut self,
        username: &str,
        hostname: &str,
        servername: &str,
        realname: &str,
    ) -> Result<()> {
        self.send(&format!("USER {username} {hostname} {servername} :{realname}"))
            .await
    }

    pub async fn send_privmsg(&mut self, target: &str, text: &str) -> Result<()> {
        self.send(&format!("PRIVMSG {target} :{text}")).await
    }

    /// Joins without looking at the reply.
    pub async fn raw_join_channel(&mut self, channel: &str, window: Duration) -> Result<()> {
        self.send(&format!("JOIN {channel}")).await?;
        self.ignore_reply(window).await
    }

    /// The MOTD burst that completes registration.
    pub async fn get_motd(&mut self, window: Duration) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::sequence(&batch, &grammar::motd(self.reply_target())))
    }

    pub async fn join_channel(&mut self, channel: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("JOIN {channel}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::sequence(
            &batch,
            &grammar::join(self.reply_target(), channel),
        ))
    }

    /// `username` is the one this client registered with.
    pub async fn who(&mut self, mask: &str, username: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("WHO {mask}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::sequence(
            &batch,
            &grammar::who(self.reply_target(), mask, username),
        ))
    }

    pub async fn list(&mut self, channel: &str, users: u32, window: Duration) -> Result<Verdict> {
        self.send("LIST").await?;
        let batch = self.collect(window).await?;
        Ok(assertions::sequence(
            &batch,
            &grammar::list(self.reply_target(), channel, users),
        ))
    }

    /// A PRIVMSG from `from` to `to` arrived.
    pub async fn check_msg(
        &mut self,
        from: &str,
        to: &str,
        text: &str,
        window: Duration,
    ) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::single(&batch, &grammar::privmsg(from, to, text)))
    }

    /// The same PRIVMSG arrived once for each of two targets, in any order.
    pub async fn check_two_msgs(
        &mut self,
        from: &str,
        to1: &str,
        to2: &str,
        text: &str,
        window: Duration,
    ) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::unordered_pair(
            &batch,
            &grammar::privmsg(from, to1, text),
            &grammar::privmsg(from, to2, text),
        ))
    }

    /// Another client's JOIN was relayed to this one.
    pub async fn check_echo_join(
        &mut self,
        from: &str,
        channel: &str,
        window: Duration,
    ) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::single(&batch, &grammar::join_echo(from, channel)))
    }

    pub async fn part_channel(&mut self, channel: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("PART {channel}")).await?;
        let batch = self.collect(window).await?;
        let nick = self.reply_target().to_string();
        Ok(assertions::single(&batch, &grammar::part_echo(&nick)))
    }

    /// Another client's PART was relayed to this one.
    pub async fn check_part(&mut self, from: &str, window: Duration) -> Result<Verdict> {
        let batch = self.collect(window).await?;
        Ok(assertions::single(&batch, &grammar::part_echo(from)))
    }

    pub async fn invalid_nick(&mut self, nick: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("NICK {nick}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::numeric_error(
            &batch,
            &grammar::erroneous_nick(self.reply_target(), nick),
        )
        .or_explain(|e| format!("NICK {nick} {e}")))
    }

    pub async fn used_nick(&mut self, nick: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("NICK {nick}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::numeric_error(
            &batch,
            &grammar::nick_in_use(self.reply_target(), nick),
        )
        .or_explain(|e| format!("NICK {nick} {e}")))
    }

    pub async fn no_nick(&mut self, window: Duration) -> Result<Verdict> {
        self.send("NICK").await?;
        let batch = self.collect(window).await?;
        Ok(
            assertions::numeric_error(&batch, &grammar::no_nick_given(self.reply_target()))
                .or_explain(|e| format!("NICK <blank> {e}")),
        )
    }

    /// `command` with no parameters at all.
    pub async fn less_params(&mut self, command: &str, window: Duration) -> Result<Verdict> {
        self.send(command).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::numeric_error(
            &batch,
            &grammar::need_more_params(self.reply_target(), command),
        )
        .or_explain(|e| format!("{command} {e}")))
    }

    /// USER after registration has completed.
    pub async fn reset_user(&mut self, window: Duration) -> Result<Verdict> {
        self.send("USER a a a a").await?;
        let batch = self.collect(window).await?;
        Ok(
            assertions::numeric_error(&batch, &grammar::already_registered(self.reply_target()))
                .or_explain(|e| format!("USER after registration {e}")),
        )
    }

    pub async fn invalid_chan(
        &mut self,
        command: &str,
        channel: &str,
        window: Duration,
    ) -> Result<Verdict> {
        self.send(&format!("{command} {channel}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::numeric_error(
            &batch,
            &grammar::no_such_channel(self.reply_target(), channel),
        )
        .or_explain(|e| format!("{command} {channel} {e}")))
    }

    pub async fn not_on_chan(&mut self, channel: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("PART {channel}")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::numeric_error(
            &batch,
            &grammar::not_on_channel(self.reply_target(), channel),
        )
        .or_explain(|e| format!("PART {channel} {e}")))
    }

    pub async fn no_recipient(&mut self, window: Duration) -> Result<Verdict> {
        self.send("PRIVMSG").await?;
        let batch = self.collect(window).await?;
        Ok(
            assertions::numeric_error(&batch, &grammar::no_recipient(self.reply_target()))
                .or_explain(|e| format!("PRIVMSG with no parameters {e}")),
        )
    }

    pub async fn no_text(&mut self, target: &str, window: Duration) -> Result<Verdict> {
        self.send(&format!("PRIVMSG {target}")).await?;
        let batch = self.collect(window).await?;
        Ok(
            assertions::numeric_error(&batch, &grammar::no_text_to_send(self.reply_target()))
                .or_explain(|e| format!("PRIVMSG with one parameter {e}")),
        )
    }

    /// One PRIVMSG to several unknown targets; one 401 each.
    pub async fn nonexistent_targets(
        &mut self,
        targets: &[String],
        window: Duration,
    ) -> Result<Verdict> {
        let list = join_targets(targets);
        debug!("[{}] probing unknown targets {}", self.label, list);
        self.send(&format!("PRIVMSG {list} hi")).await?;
        let batch = self.collect(window).await?;
        Ok(assertions::sequence(
            &batch,
            &grammar::no_such_targets(self.reply_target(), targets),
        ))
    }
}
