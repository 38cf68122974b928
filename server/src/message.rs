#![allow(non_camel_case_types)]

use std::fmt::{Display, Formatter};

/// A protocol line, either parsed from client input or built to be relayed to other clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: Command,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

/// A numbered reply sent from the server to a single client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub prefix: String,
    pub code: ReplyCode,
    pub params: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Nick,
    Join,
    PrivMsg,
    Part,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    RPL_WELCOME = 001,
    RPL_NAMREPLY = 353,
    RPL_ENDOFNAMES = 366,

    ERR_NOSUCHNICK = 401,
    ERR_NOSUCHCHANNEL = 403,
    ERR_UNKNOWNCOMMAND = 421,
    ERR_NONICKNAMEGIVEN = 431,
    ERR_ERRONEUSNICKNAME = 432,
    ERR_NICKNAMEINUSE = 433,
}

pub trait ToIrc: ToString {
    fn to_irc(&self) -> String {
        format!("{}\r\n", self.to_string())
    }
}

impl Message {
    /// Parse one line of client input. Return `None` if the line holds no command.
    ///
    /// A leading `:prefix` is kept but otherwise ignored by the server. Everything after the first
    /// ` :` is the trailing parameter and may contain spaces.
    pub fn parse(raw: &str) -> Option<Self> {
        // Trim line ending from input string
        let mut raw = raw.trim_end_matches(['\r', '\n']).trim_start();

        let prefix = match raw.strip_prefix(':') {
            Some(text) => {
                let (prefix, text) = Message::get_next_word(text);
                raw = text;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, text) = Message::get_next_word(raw);
        if command.is_empty() {
            return None;
        }
        let command = Command::from_str(command);
        raw = text;

        let mut params = vec![];
        let mut trailing = None;
        while !raw.is_empty() {
            if let Some(text) = raw.strip_prefix(':') {
                trailing = Some(text.to_string());
                break;
            }
            let (param, text) = Message::get_next_word(raw);
            if !param.is_empty() {
                params.push(param.to_string());
            }
            raw = text;
        }

        Some(Message {
            prefix,
            command,
            params,
            trailing,
        })
    }

    pub fn new(prefix: &str, command: Command, params: &[&str], trailing: Option<&str>) -> Self {
        Message {
            prefix: Some(prefix.to_string()),
            command,
            params: params.iter().map(|s| s.to_string()).collect(),
            trailing: trailing.map(str::to_string),
        }
    }

    /// Return the first whitespace separated word of the string and the rest of it, with the
    /// whitespace between them removed. If the string has no whitespace, return the input.
    fn get_next_word(input: &str) -> (&str, &str) {
        match input.split_once(|c: char| c.is_ascii_whitespace()) {
            Some((word, rest)) => (
                word,
                rest.trim_start_matches(|c: char| c.is_ascii_whitespace()),
            ),
            None => (input, ""), // String is done
        }
    }
}

impl Response {
    pub fn new(prefix: &str, code: ReplyCode, params: &[&str], text: &str) -> Self {
        Response {
            prefix: prefix.to_string(),
            code,
            params: params.iter().map(|s| s.to_string()).collect(),
            text: text.to_string(),
        }
    }
}

impl Command {
    /// Commands are case-sensitive.
    pub fn from_str(input: &str) -> Self {
        match input {
            "NICK" => Command::Nick,
            "JOIN" => Command::Join,
            "PRIVMSG" => Command::PrivMsg,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Command::Nick => write!(f, "NICK"),
            Command::Join => write!(f, "JOIN"),
            Command::PrivMsg => write!(f, "PRIVMSG"),
            Command::Part => write!(f, "PART"),
            Command::Unknown(name) => write!(f, "{name}"),
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}

impl ToIrc for Message {}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{} {:03}", self.prefix, self.code as u16)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        write!(f, " :{}", self.text)
    }
}

impl ToIrc for Response {}

/// Raw lines, such as keep-alive answers, are sent as they are.
impl ToIrc for String {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_params() {
        let message = Message::parse("NICK alice\r\n").unwrap();
        assert_eq!(message.command, Command::Nick);
        assert_eq!(message.params, vec!["alice"]);
        assert_eq!(message.trailing, None);
    }

    #[test]
    fn trailing_keeps_spaces_and_colons() {
        let message = Message::parse("PRIVMSG #test :hi there :)").unwrap();
        assert_eq!(message.command, Command::PrivMsg);
        assert_eq!(message.params, vec!["#test"]);
        assert_eq!(message.trailing.as_deref(), Some("hi there :)"));
    }

    #[test]
    fn tabs_separate_words_like_spaces() {
        let message = Message::parse("NICK\talice").unwrap();
        assert_eq!(message.command, Command::Nick);
        assert_eq!(message.params, vec!["alice"]);

        let message = Message::parse("PRIVMSG \t#test\t:hi\tthere").unwrap();
        assert_eq!(message.params, vec!["#test"]);
        assert_eq!(message.trailing.as_deref(), Some("hi\tthere"));
    }

    #[test]
    fn prefix_is_skipped_before_command() {
        let message = Message::parse(":alice JOIN #test").unwrap();
        assert_eq!(message.prefix.as_deref(), Some("alice"));
        assert_eq!(message.command, Command::Join);
    }

    #[test]
    fn commands_are_case_sensitive() {
        let message = Message::parse("nick alice").unwrap();
        assert_eq!(message.command, Command::Unknown("nick".to_string()));
    }

    #[test]
    fn blank_line_has_no_command() {
        assert!(Message::parse("   \r\n").is_none());
        assert!(Message::parse(":prefix").is_none());
    }

    #[test]
    fn renders_relayed_message() {
        let message = Message::new("alice", Command::PrivMsg, &["#test"], Some("hi"));
        assert_eq!(message.to_irc(), ":alice PRIVMSG #test :hi\r\n");

        let join = Message::new("bob", Command::Join, &["#test"], None);
        assert_eq!(join.to_string(), ":bob JOIN #test");
    }

    #[test]
    fn renders_numbered_reply_with_padded_code() {
        let response = Response::new(
            "IRCServer",
            ReplyCode::RPL_WELCOME,
            &["alice"],
            "Welcome to the IRC server!",
        );
        assert_eq!(
            response.to_irc(),
            ":IRCServer 001 alice :Welcome to the IRC server!\r\n"
        );
    }
}
