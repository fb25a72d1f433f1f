//! Child process setup shared by the ssh transport and the git cloner.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;

/// Variables passed through to `git` and `ssh` children.
///
/// `HOME` stays so ssh can find keys and known hosts; `SSH_AUTH_SOCK` so an
/// agent keeps working.
const INHERITED_VARS: &[&str] = &["PATH", "HOME", "SSH_AUTH_SOCK"];

/// Build a command with a scrubbed environment.
///
/// Clears the inherited environment (no `GIT_PROXY_COMMAND`,
/// `GIT_EXTERNAL_DIFF` and friends), ignores system and global git config,
/// disables credential prompts, and kills the child when the handle drops.
pub(crate) fn hardened_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);

    cmd.env_clear();
    for var in INHERITED_VARS {
        if let Ok(value) = std::env::var(var) {
            cmd.env(var, value);
        }
    }
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes");
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    cmd
}

/// Quote a path for a remote POSIX shell, the way git does for
/// `git-upload-pack '<path>'`.
pub(crate) fn shell_quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len().saturating_add(2));
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str(r"'\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Trimmed stderr of a child, or `fallback` when it is empty.
pub(crate) fn stderr_summary(stderr: &[u8], fallback: &str) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}
