use crate::{
    broadcast::broadcast,
    error::{RegisterError, Result},
    message::{Command, Message, ReplyCode},
    registry::Scope,
    server::Session,
};
use log::{debug, info, warn};

/// Route one parsed line to its command handler.
///
/// Only NICK, JOIN and PRIVMSG are known. Anything else is answered with ERR_UNKNOWNCOMMAND and
/// the connection stays open. An `Err` means this client's own send path is gone.
pub fn dispatch(session: &mut Session, message: Message) -> Result<()> {
    match message.command {
        Command::Nick => handle_nick(session, &message),
        Command::Join => handle_join(session, &message),
        Command::PrivMsg => handle_privmsg(session, &message),
        Command::Part | Command::Unknown(_) => session.reply(
            ReplyCode::ERR_UNKNOWNCOMMAND,
            &[&message.command.to_string()],
            "Unknown command",
        ),
    }
}

fn handle_nick(session: &mut Session, message: &Message) -> Result<()> {
    // Example: NICK Wiz
    let Some(nickname) = message
        .params
        .first()
        .or(message.trailing.as_ref())
        .filter(|nickname| !nickname.is_empty())
    else {
        return Ok(());
    };

    // A registered client gets its directory entry and memberships moved to the new name
    let outcome = match &session.nick {
        None => session
            .registry
            .register(nickname, session.connection.clone()),
        Some(current) => session.registry.rename(current, nickname),
    };

    match outcome {
        Err(RegisterError::InvalidNick(nickname)) => session.reply(
            ReplyCode::ERR_ERRONEUSNICKNAME,
            &[&nickname],
            "Nicknames cannot start with symbols",
        ),
        Err(RegisterError::NickInUse(nickname)) => session.reply(
            ReplyCode::ERR_NICKNAMEINUSE,
            &[&nickname],
            "Nickname is already in use",
        ),
        Ok(()) => match session.nick.replace(nickname.clone()) {
            None => {
                info!("User '{nickname}' has joined the server.");
                session.reply(ReplyCode::RPL_WELCOME, &[], "Welcome to the IRC server!")
            }
            Some(old) if old == *nickname => Ok(()),
            Some(old) => {
                info!("User '{old}' is now known as '{nickname}'.");
                let notice = Message::new(&old, Command::Nick, &[nickname], None);
                broadcast(
                    &session.registry,
                    &notice,
                    &Scope::Neighbours(nickname.clone()),
                    None,
                );
                Ok(())
            }
        },
    }
}

fn handle_join(session: &mut Session, message: &Message) -> Result<()> {
    // Example: JOIN #rust
    let Some(nickname) = session.nick.clone() else {
        return session.reply(ReplyCode::ERR_NONICKNAMEGIVEN, &[], "No nickname given");
    };
    let Some(channel) = message.params.first() else {
        return Ok(());
    };

    if !channel.starts_with('#') {
        return session.reply(ReplyCode::ERR_NOSUCHCHANNEL, &[channel], "No such channel");
    }

    let members = session.registry.join(&nickname, channel);
    info!("User '{nickname}' joined channel {channel}");

    // The joining user sees its own JOIN before the member list
    let notice = Message::new(&nickname, Command::Join, &[channel], None);
    broadcast(
        &session.registry,
        &notice,
        &Scope::Channel(channel.clone()),
        None,
    );

    session.reply(ReplyCode::RPL_NAMREPLY, &["=", channel], &members.join(" "))?;
    session.reply(ReplyCode::RPL_ENDOFNAMES, &[channel], "End of /NAMES list")
}

fn handle_privmsg(session: &mut Session, message: &Message) -> Result<()> {
    // Example: PRIVMSG user :Hello there!
    //          PRIVMSG #channel :Hello there!
    let Some(nickname) = session.nick.clone() else {
        return session.reply(ReplyCode::ERR_NONICKNAMEGIVEN, &[], "No nickname given");
    };

    // Without a target and a ` :` separated body the line is dropped
    let (Some(target), Some(body)) = (message.params.first(), message.trailing.as_deref()) else {
        return Ok(());
    };

    debug!("{nickname} -> {target}: {body}");
    let relayed = Message::new(&nickname, Command::PrivMsg, &[target], Some(body));

    if target.starts_with('#') {
        if session.registry.lookup_channel(target).is_none() {
            return session.reply(ReplyCode::ERR_NOSUCHCHANNEL, &[target], "No such channel");
        }
        broadcast(
            &session.registry,
            &relayed,
            &Scope::Channel(target.clone()),
            Some(session.connection.id),
        );
        return Ok(());
    }

    match session.registry.lookup_nick(target) {
        Some(recipient) => {
            if let Err(e) = recipient.send(&relayed) {
                warn!("Failed to deliver message to {target}: {e}");
            }
            Ok(())
        }
        None => session.reply(ReplyCode::ERR_NOSUCHNICK, &[target], "No such nick/channel"),
    }
}
