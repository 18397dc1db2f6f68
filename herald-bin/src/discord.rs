//! The subset of the chat API's resources `herald` works with.

use serde::{Deserialize, Serialize};

/// Channel type of a guild text channel
pub(crate) const GUILD_TEXT: u8 = 0;

/// A guild (server) the bot user is a member of
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Guild {
    pub(crate) id: String,
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Channel {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(rename = "type")]
    pub(crate) kind: u8,
    #[serde(default)]
    pub(crate) position: Option<i64>,
}

impl Channel {
    pub(crate) const fn is_text(&self) -> bool {
        self.kind == GUILD_TEXT
    }
}

/// A message as returned after posting it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Message {
    pub(crate) id: String,
}

/// Body of `POST channels/{id}/messages`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct MessageCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) embeds: Vec<Embed>,
}

impl MessageCreate {
    pub(crate) fn new(content: Option<String>, embed: Option<Embed>) -> Self {
        Self {
            content,
            embeds: embed.into_iter().collect(),
        }
    }
}

/// Rich content attached to a message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<EmbedImage>,
}

impl Embed {
    pub(crate) fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EmbedAuthor {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EmbedImage {
    pub(crate) url: String,
}

/// Parse an embed color given as `#rrggbb`, `0xrrggbb` or a decimal number
pub(crate) fn parse_color(value: &str) -> Result<u32, String> {
    let value = value.trim();
    let parsed = if let Some(hex) = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse()
    };

    match parsed {
        Ok(color) if color <= 0x00FF_FFFF => Ok(color),
        Ok(_) => Err(format!("color `{value}` is larger than #ffffff")),
        Err(e) => Err(format!("invalid color `{value}`: {e}")),
    }
}
