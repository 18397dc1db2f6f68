use anyhow::{Context, Result, bail};
use log::info;
use std::io::Write;

use crate::ExitCode;
use crate::discord::{Channel, Guild};
use crate::options::ChannelsArgs;

use super::CommandParams;

/// Print the channels of a guild, one `<id>\t<name>` line per channel,
/// or only the id of the channel named with `--name`
pub(crate) async fn channels<W: Write>(
    params: CommandParams<ChannelsArgs>,
    out: &mut W,
) -> Result<ExitCode> {
    let CommandParams { dispatcher, args } = params;

    let guild_id = match args.guild {
        Some(id) => id,
        None => {
            let guilds: Vec<Guild> = dispatcher
                .get("users/@me/guilds")
                .await
                .context("Cannot list the guilds of the bot user")?;
            let Some(guild) = guilds.into_iter().next() else {
                bail!("The bot user is not a member of any guild");
            };
            info!("Using guild `{}` ({})", guild.name, guild.id);
            guild.id
        }
    };

    let mut channels: Vec<Channel> = dispatcher
        .get(&format!("guilds/{guild_id}/channels"))
        .await
        .with_context(|| format!("Cannot list the channels of guild {guild_id}"))?;
    channels.sort_by_key(|channel| channel.position);

    if let Some(name) = &args.name {
        let Some(channel) = channels
            .iter()
            .find(|channel| channel.is_text() && channel.name.as_deref() == Some(name.as_str()))
        else {
            bail!("No text channel named `{name}` in guild {guild_id}");
        };
        writeln!(out, "{}", channel.id)?;
        return Ok(ExitCode::Success);
    }

    for channel in channels.iter().filter(|c| args.all || c.is_text()) {
        writeln!(
            out,
            "{}\t{}",
            channel.id,
            channel.name.as_deref().unwrap_or_default()
        )?;
    }

    Ok(ExitCode::Success)
}
