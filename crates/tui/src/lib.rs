// SPDX-FileCopyrightText: 2023 AerynOS Developers
// SPDX-License-Identifier: MPL-2.0

//! Small terminal-styling helpers shared by the CLI front end.

use crossterm::style::Stylize as _;

/// Colorizes text for terminal output. A thin wrapper over `crossterm` so
/// callers don't need to depend on it directly.
pub trait Styled {
    fn red(&self) -> String;
    fn yellow(&self) -> String;
    fn green(&self) -> String;
}

impl Styled for str {
    fn red(&self) -> String {
        self.to_string().red().to_string()
    }

    fn yellow(&self) -> String {
        self.to_string().yellow().to_string()
    }

    fn green(&self) -> String {
        self.to_string().green().to_string()
    }
}
