mod cmd;
mod exit;
mod key;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "kernelwire", version, about = "Signed kernel message codec CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "kernelwire",
            "send",
            "/tmp/kernel.sock",
            "--msg-type",
            "kernel_info_request",
            "--identity",
            "a",
            "--identity",
            "b",
            "--key",
            "secret",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.identities, vec!["a", "b"]);
                assert_eq!(args.message.content, "{}");
                assert_eq!(args.key.key.as_deref(), Some("secret"));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn rejects_key_and_key_file_together() {
        let err = Cli::try_parse_from([
            "kernelwire",
            "sign",
            "--msg-type",
            "status",
            "--key",
            "secret",
            "--key-file",
            "/tmp/key",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn send_requires_msg_type() {
        let err = Cli::try_parse_from(["kernelwire", "send", "/tmp/kernel.sock"])
            .expect_err("missing --msg-type should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_serve_with_count() {
        let cli = Cli::try_parse_from(["kernelwire", "serve", "/tmp/kernel.sock", "--count", "2"])
            .expect("serve args should parse");
        assert!(matches!(
            cli.command,
            Command::Serve(ref args) if args.count == Some(2)
        ));
    }
}
