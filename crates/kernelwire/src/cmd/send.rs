use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kernelwire_msg::{encode_envelope, receive, Receipt, Signer, WireError};
use kernelwire_multipart::{MultipartReader, MultipartWriter, PartConfig, UnixEndpoint};

use crate::cmd::sign::build_request;
use crate::cmd::SendArgs;
use crate::exit::{io_error, multipart_error, wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_receipt, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let signer = args.key.signer()?;
    let msg = build_request(&args.message)?;
    let identities: Vec<Bytes> = args
        .identities
        .iter()
        .map(|id| Bytes::from(id.clone().into_bytes()))
        .collect();

    let frames = encode_envelope(&identities, &msg, &signer)
        .map_err(|err| wire_error("encode failed", err))?;

    let stream =
        UnixEndpoint::connect(&args.path).map_err(|err| multipart_error("connect failed", err))?;
    let read_half = stream
        .try_clone()
        .map_err(|err| io_error("socket clone failed", err))?;

    let config = PartConfig {
        read_timeout: Some(wait_timeout),
        ..PartConfig::default()
    };
    let mut writer = MultipartWriter::with_config_unix(stream, config.clone())
        .map_err(|err| multipart_error("socket setup failed", err))?;
    writer
        .send_multipart(&frames)
        .map_err(|err| multipart_error("send failed", err))?;
    tracing::debug!(
        msg_type = %msg.header.msg_type,
        msg_id = %msg.header.msg_id,
        identities = identities.len(),
        "request sent"
    );

    if args.wait {
        let mut reader = MultipartReader::with_config_unix(read_half, config)
            .map_err(|err| multipart_error("socket setup failed", err))?;
        let receipt = wait_for_reply(&mut reader, &signer, &msg.header.msg_id)
            .map_err(|err| wire_error("receive failed", err))?;
        print_receipt(&receipt, format);
    }

    Ok(SUCCESS)
}

/// Read until the reply to `request_id` arrives, skipping unrelated
/// messages such as status broadcasts. Messages that fail signature or
/// envelope checks are dropped with a warning.
fn wait_for_reply<R: std::io::Read>(
    reader: &mut MultipartReader<R>,
    signer: &Arc<Signer>,
    request_id: &str,
) -> Result<Receipt, WireError> {
    loop {
        let receipt = match receive(reader, signer) {
            Ok(receipt) => receipt,
            Err(err @ (WireError::Signature(_) | WireError::Malformed(_))) => {
                tracing::warn!(error = %err, "dropping rejected message");
                continue;
            }
            Err(err) => return Err(err),
        };
        if receipt.message.parent_header.msg_id == request_id {
            return Ok(receipt);
        }
        tracing::debug!(
            msg_type = %receipt.message.header.msg_type,
            "skipping message for another request"
        );
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
