//! `solace` — passphrase file encryption CLI.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`config::Config`] from environment variables.
//! 3. Initialise stderr logging.
//! 4. Read the passphrase from the environment, or prompt for it without echo.
//! 5. Encrypt or decrypt the file, printing the output path on success.

mod args;
mod config;
mod telemetry;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use solace_crypto::file::{self, FileError, Mode};
use solace_crypto::{AeadError, EnvelopeError};

use args::Command;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let args = match args::parse(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", args::USAGE);
            return Ok(());
        }
        Command::Run(args) => args,
    };

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env()?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 4. Passphrase
    // -----------------------------------------------------------------------
    let passphrase = cfg.passphrase(|| rpassword::prompt_password(config::PASSPHRASE_PROMPT))?;

    // -----------------------------------------------------------------------
    // 5. File operation
    // -----------------------------------------------------------------------
    let output = process(
        args.mode,
        &args.input,
        args.output.as_deref(),
        passphrase.as_bytes(),
        args.delete_original,
    )?;
    match args.mode {
        Mode::Encrypt => println!("File encrypted successfully: {}", output.display()),
        Mode::Decrypt => println!("File decrypted successfully: {}", output.display()),
    }
    Ok(())
}

/// Run one encrypt or decrypt operation and return the path written.
fn process(
    mode: Mode,
    input: &Path,
    output: Option<&Path>,
    passphrase: &[u8],
    delete_original: bool,
) -> Result<PathBuf> {
    if !input.is_file() {
        bail!("input file does not exist: {}", input.display());
    }
    let output = output.map_or_else(|| file::default_output_path(input, mode), Path::to_path_buf);
    if file::resolves_to_same_file(input, &output)? {
        bail!("output path must differ from input path: {}", output.display());
    }

    let result = match mode {
        Mode::Encrypt => file::encrypt_file(input, &output, passphrase, delete_original),
        Mode::Decrypt => file::decrypt_file(input, &output, passphrase),
    };
    result.map_err(describe)?;
    Ok(output)
}

fn describe(err: FileError) -> anyhow::Error {
    match err {
        FileError::Envelope(EnvelopeError::Aead(AeadError::AuthenticationFailed)) => {
            anyhow::anyhow!("decryption failed: wrong passphrase or the file was modified")
        }
        FileError::Envelope(EnvelopeError::Truncated { .. }) => {
            anyhow::anyhow!("not a solace encrypted file: too short")
        }
        other => other.into(),
    }
}
