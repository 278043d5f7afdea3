//! Host command line.
//!
//! Both tools take `-n <interface>` (required) and `-i <id>` (default
//! `0x7FF`, C `strtoumax` base-0 syntax, wins over a `-c` file).  `-h`
//! prints usage and exits with status 1, as does any parse error or a
//! missing `-n`.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::adapters::sysfs_led::DEFAULT_LED_PATH;
use crate::config::{ProtocolConfig, parse_identifier};
use crate::error::ConfigError;

/// Exit status for `-h` and every usage error.
pub const USAGE_EXIT_CODE: u8 = 1;

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// CAN interface.
    #[arg(short = 'n', value_name = "interface")]
    pub interface: Option<String>,

    /// CAN id of heartbeat frames; default 0x7FF.
    #[arg(short = 'i', value_name = "id", value_parser = identifier_arg)]
    pub identifier: Option<u32>,

    /// Print usage.
    #[arg(short = 'h')]
    pub help: bool,

    /// JSON file overriding timing defaults.
    #[arg(short = 'c', long = "config", value_name = "file")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "canping", disable_help_flag = true)]
pub struct PingCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "canpong", disable_help_flag = true)]
pub struct PongCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// LED brightness control file.
    #[arg(short = 'l', long = "led", value_name = "path", default_value = DEFAULT_LED_PATH)]
    pub led: PathBuf,

    /// Latch the fault and keep listening after a malformed frame.
    #[arg(long = "keep-going")]
    pub keep_going: bool,
}

fn identifier_arg(s: &str) -> Result<u32, String> {
    parse_identifier(s).map_err(|e| e.to_string())
}

/// Which tool is printing usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ping,
    Pong,
}

impl Tool {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ping => "canping",
            Self::Pong => "canpong",
        }
    }

    const fn summary(self) -> &'static str {
        match self {
            Self::Ping => "Send a counter message to CAN Bus every half second.",
            Self::Pong => "Listen for CAN Bus pings.",
        }
    }
}

/// Why parsing stopped short of a runnable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageExit {
    /// `-h` was given.
    Help,
    /// Bad or missing arguments; carries the message for stderr.
    Invalid(String),
}

/// Full usage text.
pub fn usage(tool: Tool) -> String {
    let name = tool.name();
    let mut text = format!(
        "{name}: {}\n\n\
         Usage:\n  {name} -n [interface] -i [id]\n    \
         -n [interface] : CAN interface. Required.\n    \
         -i [id]        : CAN ID for pings. Default: 0x7FF\n    \
         -c [file]      : JSON timing overrides.\n",
        tool.summary()
    );
    if tool == Tool::Pong {
        text.push_str(
            "    -l [path]      : LED brightness file.\n    \
             --keep-going   : keep listening after a malformed frame.\n",
        );
    }
    text.push_str(&format!("Example:\n  {name} -n can0\n"));
    text
}

impl UsageExit {
    /// Help goes to stdout, errors to stderr; both followed by usage.
    pub fn print(&self, tool: Tool) {
        match self {
            Self::Help => print!("{}", usage(tool)),
            Self::Invalid(msg) => eprint!("{msg}\n{}", usage(tool)),
        }
    }
}

impl CommonArgs {
    /// Reject `-h` and a missing interface; return the interface name.
    pub fn interface(&self) -> Result<&str, UsageExit> {
        if self.help {
            return Err(UsageExit::Help);
        }
        self.interface
            .as_deref()
            .ok_or_else(|| UsageExit::Invalid(format!("{}.", ConfigError::MissingInterface)))
    }

    /// Defaults, then the JSON file if any, then `-i`.
    pub fn protocol_config(&self) -> Result<ProtocolConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::File(format!("{}: {e}", path.display())))?;
                ProtocolConfig::from_json(&text)?
            }
            None => ProtocolConfig::default(),
        };
        if let Some(id) = self.identifier {
            config.target_id = id;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Parse `args` (including the program name) for a tool.
pub fn parse<C: Parser>(args: impl IntoIterator<Item = String>) -> Result<C, UsageExit> {
    C::try_parse_from(args).map_err(|e| {
        let rendered = e.to_string();
        UsageExit::Invalid(rendered.lines().next().unwrap_or_default().to_owned())
    })
}
