use std::io::IsTerminal;

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kernelwire_msg::Receipt;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    msg_id: &'a str,
    msg_type: &'a str,
    session: &'a str,
    username: &'a str,
    parent_msg_id: &'a str,
    identities: Vec<String>,
    authenticated: bool,
    metadata: &'a Map<String, Value>,
    content: &'a Value,
    buffers: usize,
}

impl<'a> MessageOutput<'a> {
    fn from_receipt(receipt: &'a Receipt) -> Self {
        let msg = &receipt.message;
        Self {
            msg_id: &msg.header.msg_id,
            msg_type: &msg.header.msg_type,
            session: &msg.header.session,
            username: &msg.header.username,
            parent_msg_id: &msg.parent_header.msg_id,
            identities: receipt
                .identities
                .iter()
                .map(|id| preview(id))
                .collect(),
            authenticated: receipt.authenticated(),
            metadata: &msg.metadata,
            content: &msg.content,
            buffers: msg.buffers.len(),
        }
    }
}

pub fn print_receipt(receipt: &Receipt, format: OutputFormat) {
    let out = MessageOutput::from_receipt(receipt);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["msg_type", out.msg_type])
                .add_row(vec!["msg_id", out.msg_id])
                .add_row(vec!["parent_msg_id", out.parent_msg_id])
                .add_row(vec!["session", out.session])
                .add_row(vec!["username", out.username]);
            table.add_row(vec!["identities".to_string(), out.identities.join(", ")]);
            table.add_row(vec![
                "authenticated".to_string(),
                out.authenticated.to_string(),
            ]);
            table.add_row(vec!["content".to_string(), out.content.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} id={} parent={} session={} authenticated={} content={}",
                out.msg_type,
                out.msg_id,
                out.parent_msg_id,
                out.session,
                out.authenticated,
                out.content
            );
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    index: usize,
    role: &'static str,
    size: usize,
    frame: String,
}

pub fn print_frames(frames: &[Bytes], format: OutputFormat) {
    let rows: Vec<FrameOutput> = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| FrameOutput {
            index,
            role: frame_role(index),
            size: frame.len(),
            frame: preview(frame),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "ROLE", "SIZE", "FRAME"]);
            for row in rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.role.to_string(),
                    row.size.to_string(),
                    row.frame,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{:<13} {}", row.role, row.frame);
            }
        }
    }
}

/// Role of a frame in an encoded payload (signature first, no identities).
fn frame_role(index: usize) -> &'static str {
    match index {
        0 => "signature",
        1 => "header",
        2 => "parent_header",
        3 => "metadata",
        4 => "content",
        _ => "buffer",
    }
}

fn preview(frame: &[u8]) -> String {
    match std::str::from_utf8(frame) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", frame.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roles_follow_payload_layout() {
        assert_eq!(frame_role(0), "signature");
        assert_eq!(frame_role(4), "content");
        assert_eq!(frame_role(7), "buffer");
    }

    #[test]
    fn binary_frames_are_summarized() {
        assert_eq!(preview(b"abc"), "abc");
        assert_eq!(preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
