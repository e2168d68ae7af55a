// SPDX-FileCopyrightText: Copyright © 2020-2025 Serpent OS Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Drives a recipe's `build_cmd` / `check_cmd` / `install_cmd` through the
//! `Configured -> Built -> Tested -> Staged` state machine.

mod strip;

pub use strip::strip_stage;

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use fs_err as fs;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{config::Config, recipe::Recipe, util};

/// Everything one build invocation needs that isn't in the recipe itself.
pub struct BuildContext {
    pub source_top: PathBuf,
    pub stage_root: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configured,
    Built,
    Tested,
    Staged,
}

/// Drives one recipe through the state machine, shelling out to the
/// recipe's commands verbatim.
pub struct Driver<'a> {
    pub config: &'a Config,
}

impl<'a> Driver<'a> {
    pub fn run(&self, recipe: &Recipe, ctx: &BuildContext) -> Result<Phase, Error> {
        let cwd = match &recipe.build_subdir {
            Some(subdir) => ctx.source_top.join(subdir),
            None => ctx.source_top.clone(),
        };

        let makeflags = self.config.effective_makeflags(recipe.extra_make_flags.as_deref());

        let mut phase = Phase::Configured;

        if let Some(build_cmd) = &recipe.build_cmd {
            self.run_shell(build_cmd, &cwd, &[("MAKEFLAGS", &makeflags)], ctx)
                .map_err(|source| Error::BuildFailed { source })?;
            phase = Phase::Built;
        }

        if let Some(check_cmd) = &recipe.check_cmd {
            self.run_shell(check_cmd, &cwd, &[("MAKEFLAGS", &makeflags)], ctx)
                .map_err(|source| Error::TestFailed { source })?;
            phase = Phase::Tested;
        }

        fs::create_dir_all(&ctx.stage_root)?;
        let destdir = ctx.stage_root.to_string_lossy().into_owned();

        self.run_install(&recipe.install_cmd, &cwd, &destdir, ctx)
            .map_err(|source| Error::InstallFailed { source })?;
        phase = Phase::Staged;

        if self.config.strip {
            if let Err(error) = strip::strip_stage(&ctx.stage_root) {
                warn!(%error, "stripping stage root encountered errors");
            }
        }

        Ok(phase)
    }

    fn run_shell(&self, command: &str, cwd: &Path, env: &[(&str, &str)], ctx: &BuildContext) -> Result<(), ShellError> {
        self.spawn(command, cwd, env, ctx)
    }

    fn run_install(&self, install_cmd: &str, cwd: &Path, destdir: &str, ctx: &BuildContext) -> Result<(), ShellError> {
        let env: Vec<(&str, &str)> = vec![("DESTDIR", destdir)];

        if let Some(fakeroot) = util::locate("fakeroot") {
            debug!(tool = %fakeroot.display(), "wrapping install with privilege-emulation shim");
            let wrapped = format!("{} -- sh -c {}", fakeroot.display(), shell_quote(install_cmd));
            self.spawn(&wrapped, cwd, &env, ctx)
        } else {
            warn!("fakeroot not found on PATH; archive ownership metadata will reflect the invoking user");
            self.spawn(install_cmd, cwd, &env, ctx)
        }
    }

    fn spawn(&self, command: &str, cwd: &Path, env: &[(&str, &str)], ctx: &BuildContext) -> Result<(), ShellError> {
        debug!(command, "running");
        info!(command = %summarize(command), "running command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).current_dir(cwd);
        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output()?;

        if let Ok(mut log) = fs::OpenOptions::new().create(true).append(true).open(&ctx.log_file) {
            use std::io::Write as _;
            let _ = log.write_all(&output.stdout);
            let _ = log.write_all(&output.stderr);
        }
        use std::io::Write as _;
        let _ = std::io::stdout().write_all(&output.stdout);
        let _ = std::io::stderr().write_all(&output.stderr);

        if !output.status.success() {
            return Err(ShellError::NonZeroExit {
                command: command.to_string(),
                code: output.status.code(),
            });
        }

        Ok(())
    }
}

fn summarize(command: &str) -> String {
    command.lines().next().unwrap_or(command).to_string()
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("command `{command}` exited with {code:?}")]
    NonZeroExit { command: String, code: Option<i32> },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("build_cmd failed")]
    BuildFailed { source: ShellError },
    #[error("check_cmd failed")]
    TestFailed { source: ShellError },
    #[error("install_cmd failed")]
    InstallFailed { source: ShellError },
}
