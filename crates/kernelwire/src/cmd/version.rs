use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    git_hash: &'static str,
    signature_schemes: &'static [&'static str],
    async_codec: bool,
}

impl BuildInfo {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            target: option_env!("KERNELWIRE_BUILD_TARGET").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            signature_schemes: &["hmac-sha256"],
            async_codec: cfg!(feature = "async"),
        }
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let info = BuildInfo::current();
    if !args.extended {
        println!("{} {}", info.name, info.version);
        return Ok(SUCCESS);
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("name: {}", info.name);
            println!("version: {}", info.version);
            println!("target: {}", info.target);
            println!("git_hash: {}", info.git_hash);
            println!("signature_schemes: {}", info.signature_schemes.join(", "));
            println!("async_codec: {}", info.async_codec);
        }
    }
    Ok(SUCCESS)
}
