use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::{CliError, CliResult, USAGE};
use crate::key::KeyArgs;
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod sign;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an echo kernel that answers every request on a Unix socket.
    Serve(ServeArgs),
    /// Send one signed request and optionally wait for the reply.
    Send(SendArgs),
    /// Print the encoded, signed frames of a message without sending it.
    Sign(SignArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Sign(args) => sign::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Exit after replying to N requests.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub key: KeyArgs,
}

/// Fields of the message built by `send` and `sign`.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Message type, e.g. kernel_info_request.
    #[arg(long, short = 't')]
    pub msg_type: String,
    /// JSON content of the message.
    #[arg(long, default_value = "{}")]
    pub content: String,
    /// Session id. Default: a fresh UUID.
    #[arg(long)]
    pub session: Option<String>,
    /// Username placed in the header.
    #[arg(long, default_value = "kernelwire")]
    pub username: String,
}

impl MessageArgs {
    pub fn content_json(&self) -> CliResult<serde_json::Value> {
        serde_json::from_str(&self.content)
            .map_err(|err| CliError::new(USAGE, format!("--content is not valid JSON: {err}")))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    #[command(flatten)]
    pub message: MessageArgs,
    /// Routing identity frame to prepend (repeatable).
    #[arg(long = "identity", value_name = "ID")]
    pub identities: Vec<String>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    #[command(flatten)]
    pub message: MessageArgs,
    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
