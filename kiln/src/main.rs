// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::{error::Error as _, process::ExitCode};

use tui::Styled;

mod cli;

fn main() -> ExitCode {
    match cli::process() {
        Ok(code) => code,
        Err(error) => {
            report_error(&error);
            exit_code_for(&error)
        }
    }
}

fn report_error(error: &cli::Error) {
    let chain = sources(error);
    eprintln!("{}: {}", "Error".red(), chain.join(": "));
}

fn sources(error: &cli::Error) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }
    chain
}

fn exit_code_for(error: &cli::Error) -> ExitCode {
    use cli::Error;

    match error {
        Error::InvalidRecipe { .. } => ExitCode::from(2),
        Error::Source { source } => match source {
            kiln::source::Error::ChecksumMismatch { .. } => ExitCode::from(3),
            kiln::source::Error::Extract(kiln::source::extract::Error::Unsupported(_)) => ExitCode::from(4),
            kiln::source::Error::PatchFailed { .. } => ExitCode::from(5),
            _ => ExitCode::FAILURE,
        },
        Error::UnsupportedArchive => ExitCode::from(4),
        Error::Install { .. } => ExitCode::from(6),
        _ => ExitCode::FAILURE,
    }
}
