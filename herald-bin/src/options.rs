use crate::discord::{Embed, EmbedAuthor, EmbedImage, parse_color};
use crate::verbosity::Verbosity;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use herald_lib::ratelimit::RateLimitHeaders;
use herald_lib::{DEFAULT_AUTH_SCHEME, DEFAULT_THROTTLE_MARGIN, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};
use url::Url;

pub(crate) const HERALD_CONFIG_FILE: &str = "herald.toml";

const HELP_MSG_CONFIG_FILE: &str = "Configuration file to use

By default, `herald.toml` in the current working directory is used if it
exists. Values given on the command line take precedence over the file.";

// Serde defaults, which are also the values clap falls back to
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

default_function! {
    auth_scheme: String = DEFAULT_AUTH_SCHEME.to_string();
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    timeout: Duration = DEFAULT_TIMEOUT;
    throttle_margin: Duration = DEFAULT_THROTTLE_MARGIN;
}

// Copy every value from the config file that was left at its default on the
// command line. Listing a field that does not exist, or forgetting one, is a
// compile error.
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// herald posts messages to a rate-limited chat API, keeping them in order
/// and waiting out rate limits instead of dropping messages.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about)]
pub(crate) struct HeraldOptions {
    #[arg(short, long = "config", global = true)]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// List the channels of a guild the bot is a member of
    Channels(ChannelsArgs),

    /// Post messages to a channel, in the given order
    Send(SendArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct ChannelsArgs {
    /// Guild to list. Defaults to the first guild of the bot user
    #[arg(long)]
    pub(crate) guild: Option<String>,

    /// Only print the id of the text channel with this name
    #[arg(long)]
    pub(crate) name: Option<String>,

    /// Include voice channels, categories and other non-text channels
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct SendArgs {
    /// Channel to post to
    #[arg(long, short = 'C')]
    pub(crate) channel: String,

    /// Messages to post. Read from stdin, one per line, if none are given
    #[arg(name = "messages")]
    pub(crate) messages: Vec<String>,

    #[clap(flatten)]
    pub(crate) embed: EmbedArgs,
}

/// Embed attached to the first message (or posted on its own)
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct EmbedArgs {
    /// Embed title
    #[arg(long)]
    pub(crate) title: Option<String>,

    /// Embed description
    #[arg(long)]
    pub(crate) description: Option<String>,

    /// Link opened when clicking the embed title
    #[arg(long)]
    pub(crate) url: Option<String>,

    /// Color of the embed border, e.g. `#5865f2`
    #[arg(long, value_parser = parse_color)]
    pub(crate) color: Option<u32>,

    /// Author shown above the title
    #[arg(long)]
    pub(crate) author: Option<String>,

    /// Link of the author name
    #[arg(long, requires = "author")]
    pub(crate) author_url: Option<String>,

    /// Icon shown next to the author name
    #[arg(long, requires = "author")]
    pub(crate) author_icon: Option<String>,

    /// Small image in the top right corner
    #[arg(long)]
    pub(crate) thumbnail: Option<String>,

    /// Large image below the description
    #[arg(long)]
    pub(crate) image: Option<String>,
}

impl EmbedArgs {
    /// The embed, if any of its fields was given
    pub(crate) fn embed(&self) -> Option<Embed> {
        let embed = Embed {
            title: self.title.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            color: self.color,
            author: self.author.clone().map(|name| EmbedAuthor {
                name,
                url: self.author_url.clone(),
                icon_url: self.author_icon.clone(),
            }),
            thumbnail: self.thumbnail.clone().map(|url| EmbedImage { url }),
            image: self.image.clone().map(|url| EmbedImage { url }),
        };
        (!embed.is_empty()).then_some(embed)
    }
}

/// Options shared by all commands, from the command line or `herald.toml`
#[derive(clap::Args, Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[clap(flatten)]
    #[serde(skip)]
    pub(crate) verbose: Verbosity,

    /// API token, sent as `Authorization: <scheme> <token>`
    #[arg(long, env = "HERALD_TOKEN", hide_env_values = true, global = true)]
    #[serde(default)]
    pub(crate) token: Option<SecretString>,

    /// Root URL of the API [default: https://discord.com/api/v9/]
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) base_url: Option<Url>,

    /// Scheme of the `Authorization` header
    #[arg(long, default_value = DEFAULT_AUTH_SCHEME, global = true)]
    #[serde(default = "auth_scheme")]
    pub(crate) auth_scheme: String,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT, global = true)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Timeout of a single request, e.g. `20s` or `1m`. Timed out requests
    /// are reported, not retried
    #[arg(long, value_parser = humantime::parse_duration, default_value = "20s", global = true)]
    #[serde(default = "timeout", with = "humantime_serde")]
    pub(crate) timeout: Duration,

    /// Extra wait on top of the `retry_after` of a throttled response
    #[arg(long, value_parser = humantime::parse_duration, default_value = "100ms", global = true)]
    #[serde(default = "throttle_margin", with = "humantime_serde")]
    pub(crate) throttle_margin: Duration,

    /// Give up on a message after this many throttled retries.
    /// By default messages are retried until they are accepted
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) max_throttle_retries: Option<u32>,

    /// Print per-route request statistics to stderr when done
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) route_stats: bool,

    /// Names of the rate limit headers; only configurable in `herald.toml`
    #[arg(skip)]
    #[serde(default)]
    pub(crate) rate_limit_headers: RateLimitHeaders,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // SecretString has no PartialEq, so it can't go through fold_in!
        if self.token.is_none() && toml.token.is_some() {
            self.token = toml.token;
        }

        self.rate_limit_headers = toml.rate_limit_headers;

        fold_in! {
            self, toml;

            Config {
                ..verbose,
                ..token,
                ..rate_limit_headers,

                base_url: None,
                auth_scheme: auth_scheme(),
                user_agent: user_agent(),
                timeout: timeout(),
                throttle_margin: throttle_margin(),
                max_throttle_retries: None,
                route_stats: false,
            }
        }
    }

    /// Settings for the dispatcher
    pub(crate) fn dispatcher_config(&self) -> herald_lib::Config {
        let mut config = herald_lib::Config::builder()
            .auth_scheme(self.auth_scheme.as_str())
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .throttle_margin(self.throttle_margin)
            .rate_limit_headers(self.rate_limit_headers.clone())
            .build();
        config.token.clone_from(&self.token);
        config.max_throttle_retries = self.max_throttle_retries;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        config
    }
}
