/// The numeric replies the conformance checks look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Numeric {
    // Command responses
    EndOfWho,
    ListStart,
    List,
    ListEnd,
    WhoReply,
    NamReply,
    EndOfNames,
    Motd,
    MotdStart,
    EndOfMotd,

    // Errors
    NoSuchNick,
    NoSuchChannel,
    NoRecipient,
    NoTextToSend,
    NoNicknameGiven,
    ErroneousNickname,
    NicknameInUse,
    NotOnChannel,
    NeedMoreParams,
    AlreadyRegistered,
}

impl Numeric {
    pub const ALL: [Numeric; 20] = [
        Numeric::EndOfWho,
        Numeric::ListStart,
        Numeric::List,
        Numeric::ListEnd,
        Numeric::WhoReply,
        Numeric::NamReply,
        Numeric::EndOfNames,
        Numeric::Motd,
        Numeric::MotdStart,
        Numeric::EndOfMotd,
        Numeric::NoSuchNick,
        Numeric::NoSuchChannel,
        Numeric::NoRecipient,
        Numeric::NoTextToSend,
        Numeric::NoNicknameGiven,
        Numeric::ErroneousNickname,
        Numeric::NicknameInUse,
        Numeric::NotOnChannel,
        Numeric::NeedMoreParams,
        Numeric::AlreadyRegistered,
    ];

    /// Three-digit code as it appears on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Numeric::EndOfWho => "315",
            Numeric::ListStart => "321",
            Numeric::List => "322",
            Numeric::ListEnd => "323",
            Numeric::WhoReply => "352",
            Numeric::NamReply => "353",
            Numeric::EndOfNames => "366",
            Numeric::Motd => "372",
            Numeric::MotdStart => "375",
            Numeric::EndOfMotd => "376",
            Numeric::NoSuchNick => "401",
            Numeric::NoSuchChannel => "403",
            Numeric::NoRecipient => "411",
            Numeric::NoTextToSend => "412",
            Numeric::NoNicknameGiven => "431",
            Numeric::ErroneousNickname => "432",
            Numeric::NicknameInUse => "433",
            Numeric::NotOnChannel => "442",
            Numeric::NeedMoreParams => "461",
            Numeric::AlreadyRegistered => "462",
        }
    }

    /// RFC 1459 symbolic name.
    pub fn name(self) -> &'static str {
        match self {
            Numeric::EndOfWho => "RPL_ENDOFWHO",
            Numeric::ListStart => "RPL_LISTSTART",
            Numeric::List => "RPL_LIST",
            Numeric::ListEnd => "RPL_LISTEND",
            Numeric::WhoReply => "RPL_WHOREPLY",
            Numeric::NamReply => "RPL_NAMREPLY",
            Numeric::EndOfNames => "RPL_ENDOFNAMES",
            Numeric::Motd => "RPL_MOTD",
            Numeric::MotdStart => "RPL_MOTDSTART",
            Numeric::EndOfMotd => "RPL_ENDOFMOTD",
            Numeric::NoSuchNick => "ERR_NOSUCHNICK",
            Numeric::NoSuchChannel => "ERR_NOSUCHCHANNEL",
            Numeric::NoRecipient => "ERR_NORECIPIENT",
            Numeric::NoTextToSend => "ERR_NOTEXTTOSEND",
            Numeric::NoNicknameGiven => "ERR_NONICKNAMEGIVEN",
            Numeric::ErroneousNickname => "ERR_ERRONEUSNICKNAME",
            Numeric::NicknameInUse => "ERR_NICKNAMEINUSE",
            Numeric::NotOnChannel => "ERR_NOTONCHANNEL",
            Numeric::NeedMoreParams => "ERR_NEEDMOREPARAMS",
            Numeric::AlreadyRegistered => "ERR_ALREADYREGISTRED",
        }
    }

    /// Fixed trailing text, for the replies that carry one.
    ///
    /// Spellings follow RFC 1459, including "Erroneus".
    pub fn text(self) -> Option<&'static str> {
        match self {
            Numeric::EndOfWho => Some("End of /WHO list"),
            Numeric::ListStart => Some("Users Name"),
            Numeric::ListEnd => Some("End of /LIST"),
            Numeric::EndOfNames => Some("End of /NAMES list"),
            Numeric::EndOfMotd => Some("End of /MOTD command"),
            Numeric::MotdStart => Some("Message of the day -"),
            Numeric::NoSuchNick => Some("No such nick/channel"),
            Numeric::NoSuchChannel => Some("No such channel"),
            Numeric::NoRecipient => Some("No recipient given (PRIVMSG)"),
            Numeric::NoTextToSend => Some("No text to send"),
            Numeric::NoNicknameGiven => Some("No nickname given"),
            Numeric::ErroneousNickname => Some("Erroneus nickname"),
            Numeric::NicknameInUse => Some("Nickname is already in use"),
            Numeric::NotOnChannel => Some("You're not on that channel"),
            Numeric::NeedMoreParams => Some("Not enough parameters"),
            Numeric::AlreadyRegistered => Some("You may not reregister"),
            Numeric::List | Numeric::WhoReply | Numeric::NamReply | Numeric::Motd => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Numeric> {
        Numeric::ALL.iter().copied().find(|n| n.code() == code)
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name(), self.code())
    }
}
