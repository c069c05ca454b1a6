use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kernelwire_msg::{receive, reply_type, Channel, Message, Receipt, Signer, WireError};
use kernelwire_multipart::{
    MultipartError, MultipartReader, MultipartWriter, PartConfig, UnixEndpoint,
};
use serde_json::json;

use crate::cmd::ServeArgs;
use crate::exit::{io_error, multipart_error, wire_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

enum RecvDisposition {
    Reply(Receipt),
    Disconnect,
    Skip,
    Fatal(CliError),
}

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let signer = args.key.signer()?;
    let endpoint =
        UnixEndpoint::bind(&args.path).map_err(|err| multipart_error("bind failed", err))?;
    tracing::info!(
        path = %endpoint.path().display(),
        authenticated = signer.is_authenticated(),
        "kernel listening"
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut replied = 0usize;
    while running.load(Ordering::SeqCst) {
        let stream = endpoint
            .accept()
            .map_err(|err| multipart_error("accept failed", err))?;
        tracing::debug!("front-end connected");

        let (mut reader, channel) = open_channel(stream, &signer)?;

        while running.load(Ordering::SeqCst) {
            let receipt = match classify(receive(&mut reader, &signer)) {
                RecvDisposition::Reply(receipt) => receipt,
                RecvDisposition::Disconnect => break,
                RecvDisposition::Skip => continue,
                RecvDisposition::Fatal(err) => return Err(err),
            };

            let reply = echo_reply(&receipt);
            channel
                .reply(&receipt, &reply)
                .map_err(|err| wire_error("reply failed", err))?;
            tracing::info!(
                request = %receipt.message.msg_type(),
                reply = %reply.msg_type(),
                "replied"
            );

            replied = replied.saturating_add(1);
            if args.count.is_some_and(|count| replied >= count) {
                return Ok(SUCCESS);
            }
        }
        tracing::debug!("front-end disconnected");
    }

    Ok(SUCCESS)
}

fn open_channel(
    stream: UnixStream,
    signer: &Arc<Signer>,
) -> CliResult<(MultipartReader<UnixStream>, Channel<MultipartWriter<UnixStream>>)> {
    let read_half = stream
        .try_clone()
        .map_err(|err| io_error("socket clone failed", err))?;
    let reader = MultipartReader::with_config_unix(read_half, PartConfig::default())
        .map_err(|err| multipart_error("socket setup failed", err))?;
    let writer = MultipartWriter::with_config_unix(stream, PartConfig::default())
        .map_err(|err| multipart_error("socket setup failed", err))?;
    Ok((reader, Channel::new(writer, Arc::clone(signer))))
}

/// `<type>_reply` carrying `{"status": "ok", "echo": <request content>}`.
fn echo_reply(receipt: &Receipt) -> Message {
    let mut reply = receipt.reply(reply_type(receipt.message.msg_type()));
    reply.content = json!({
        "status": "ok",
        "echo": receipt.message.content,
    });
    reply
}

fn classify(result: Result<Receipt, WireError>) -> RecvDisposition {
    match result {
        Ok(receipt) => {
            if !receipt.authenticated() {
                tracing::debug!(
                    msg_id = %receipt.message.header.msg_id,
                    "accepted unverified message"
                );
            }
            RecvDisposition::Reply(receipt)
        }
        Err(WireError::Transport(MultipartError::ConnectionClosed)) => RecvDisposition::Disconnect,
        Err(err @ (WireError::Signature(_) | WireError::Malformed(_))) => {
            tracing::warn!(error = %err, "dropping rejected message");
            RecvDisposition::Skip
        }
        Err(WireError::Transport(err @ MultipartError::TooManyParts { .. })) => {
            tracing::warn!(error = %err, "dropping oversized message");
            RecvDisposition::Skip
        }
        Err(WireError::Transport(
            err @ (MultipartError::InvalidMagic
            | MultipartError::InvalidFlags(_)
            | MultipartError::PartTooLarge { .. }),
        )) => {
            tracing::warn!(error = %err, "stream out of sync; closing connection");
            RecvDisposition::Disconnect
        }
        Err(err) => RecvDisposition::Fatal(wire_error("receive failed", err)),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
