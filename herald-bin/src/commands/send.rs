use anyhow::{Result, bail};
use futures::future::join_all;
use herald_lib::ApiRequest;
use log::error;
use std::io::{self, BufRead, IsTerminal, Write};

use crate::ExitCode;
use crate::discord::{Message, MessageCreate};
use crate::options::SendArgs;

use super::CommandParams;

/// Post all messages to the channel and print the id of each created
/// message, in order.
///
/// Every message is submitted before the first one is awaited; the
/// dispatcher keeps them in order. Messages that fail are reported and do
/// not stop the others.
pub(crate) async fn send<W: Write>(params: CommandParams<SendArgs>, out: &mut W) -> Result<ExitCode> {
    let CommandParams { dispatcher, args } = params;

    let mut contents = args.messages;
    if contents.is_empty() && !io::stdin().is_terminal() {
        contents = read_lines(io::stdin().lock())?;
    }

    let embed = args.embed.embed();
    let bodies = bodies(contents, embed);
    if bodies.is_empty() {
        bail!("Nothing to send: pass messages as arguments or on stdin, or describe an embed");
    }

    let url = dispatcher.url(&format!("channels/{}/messages", args.channel))?;
    let pending = bodies
        .iter()
        .map(|body| {
            let request = ApiRequest::post_json(url.clone(), body)?;
            dispatcher.submit::<Message>(request)
        })
        .collect::<herald_lib::Result<Vec<_>>>()?;

    let mut exit_code = ExitCode::Success;
    for (body, result) in bodies.iter().zip(join_all(pending).await) {
        match result {
            Ok(message) => writeln!(out, "{}", message.id)?,
            Err(e) => {
                error!(
                    "Failed to deliver message {:?}: {e}",
                    body.content.as_deref().unwrap_or("<embed>")
                );
                exit_code = ExitCode::DeliveryFailure;
            }
        }
    }

    Ok(exit_code)
}

/// One message per content; the embed goes with the first one
fn bodies(contents: Vec<String>, embed: Option<crate::discord::Embed>) -> Vec<MessageCreate> {
    if contents.is_empty() {
        return embed
            .map(|embed| MessageCreate::new(None, Some(embed)))
            .into_iter()
            .collect();
    }

    let mut embed = embed;
    contents
        .into_iter()
        .map(|content| MessageCreate::new(Some(content), embed.take()))
        .collect()
}

/// Read non-empty lines
fn read_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    Ok(lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::Embed;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_lines_skips_blank_lines() {
        let input = "first\n\n  \nsecond\n";
        assert_eq!(read_lines(input.as_bytes()).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_embed_goes_with_first_message() {
        let embed = Embed {
            title: Some("Release".into()),
            ..Embed::default()
        };
        let bodies = bodies(vec!["a".into(), "b".into()], Some(embed.clone()));

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].embeds, vec![embed.clone()]);
        assert!(bodies[1].embeds.is_empty());

        let only_embed = super::bodies(vec![], Some(embed));
        assert_eq!(only_embed.len(), 1);
        assert_eq!(only_embed[0].content, None);

        assert!(super::bodies(vec![], None).is_empty());
    }
}
