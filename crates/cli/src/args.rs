//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::{bail, Result};
use solace_crypto::file::Mode;

/// Usage text printed for `--help`.
pub const USAGE: &str = "\
usage: solace <encrypt|decrypt> <INPUT> [OUTPUT] [--delete]

  encrypt    seal INPUT into OUTPUT (default: INPUT.enc)
  decrypt    open INPUT into OUTPUT (default: INPUT without its last extension)
  --delete   after encrypting, overwrite INPUT three times and remove it

The passphrase is read from SOLACE_PASSPHRASE, or prompted for without echo
when that is unset.";

/// A parsed invocation.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(Args),
}

/// Arguments for an encrypt or decrypt run.
#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub mode: Mode,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub delete_original: bool,
}

/// Parse arguments, excluding the program name.
///
/// # Errors
///
/// Returns an error describing the first problem found.
pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = None;
    let mut positional = Vec::new();
    let mut delete_original = false;

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--delete" => delete_original = true,
            "encrypt" | "-e" if mode.is_none() => mode = Some(Mode::Encrypt),
            "decrypt" | "-d" if mode.is_none() => mode = Some(Mode::Decrypt),
            flag if flag.starts_with('-') => bail!("unknown option: {flag}"),
            _ if mode.is_none() => bail!("first argument must be `encrypt` or `decrypt`, got `{arg}`"),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let Some(mode) = mode else {
        bail!("must specify either `encrypt` or `decrypt`");
    };
    if delete_original && mode == Mode::Decrypt {
        bail!("--delete is only valid when encrypting");
    }

    let mut positional = positional.into_iter();
    let Some(input) = positional.next() else {
        bail!("missing INPUT path");
    };
    let output = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument: {}", extra.display());
    }

    Ok(Command::Run(Args {
        mode,
        input,
        output,
        delete_original,
    }))
}
