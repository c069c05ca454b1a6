use kernelwire_msg::{encode, MessageFactory};

use crate::cmd::{MessageArgs, SignArgs};
use crate::exit::{wire_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: SignArgs, format: OutputFormat) -> CliResult<i32> {
    let signer = args.key.signer()?;
    let msg = build_request(&args.message)?;

    let frames = encode(&msg, &signer).map_err(|err| wire_error("encode failed", err))?;
    print_frames(&frames, format);
    Ok(SUCCESS)
}

/// Build a request message from command-line fields.
pub fn build_request(args: &MessageArgs) -> CliResult<kernelwire_msg::Message> {
    let factory = match &args.session {
        Some(session) => MessageFactory::with_session(session.as_str(), args.username.as_str()),
        None => MessageFactory::new(args.username.as_str()),
    };
    let mut msg = factory.unsolicited(args.msg_type.as_str());
    msg.content = args.content_json()?;
    Ok(msg)
}
