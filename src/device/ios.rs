//! Cisco IOS command dialect and prompt recognition.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::VlanId;

/// Prints the VLAN table.
pub const SHOW_VLAN_BRIEF: &str = "show vlan brief";

/// Lists interfaces with address and line status.
pub const SHOW_IP_INTERFACE_BRIEF: &str = "show ip interface brief";

/// Disables `--More--` paging for the session.
pub const TERMINAL_LENGTH_0: &str = "terminal length 0";

/// Enters privileged exec mode.
pub const ENABLE: &str = "enable";

/// Enters global configuration mode.
pub const CONFIGURE_TERMINAL: &str = "configure terminal";

/// Leaves configuration mode.
pub const END: &str = "end";

/// Closes the exec session.
pub const EXIT: &str = "exit";

/// Single-VLAN lookup used for verification and the final status.
#[must_use]
pub fn show_vlan_id(id: VlanId) -> String {
    format!("show vlan id {id}")
}

static EXEC_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<host>[A-Za-z0-9._/:@-]+)(?P<mode>\((?:config)[A-Za-z0-9._-]*\))?(?P<level>[>#])\s*$")
        .expect("exec prompt pattern is valid")
});

static USERNAME_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:user ?name|login)\s*:\s*$").expect("username prompt pattern is valid")
});

static PASSWORD_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)password\s*:\s*$").expect("password prompt pattern is valid")
});

static MORE_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*--More--\s*").expect("pager pattern is valid"));

static ERROR_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*%\s*(Invalid input|Incomplete command|Ambiguous command|Unknown command)")
        .expect("error marker pattern is valid")
});

static LOGIN_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(%\s*login invalid|%\s*authentication failed|%\s*bad passwords?|access denied)")
        .expect("login failure pattern is valid")
});

/// Exec privilege shown by the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// `host>`
    User,
    /// `host#`
    Privileged,
    /// `host(config...)#`
    Config,
}

/// What the device is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Login username.
    Username,
    /// Login password or enable secret.
    Password,
    /// Exec prompt of a logged-in session.
    Exec {
        /// Hostname shown in the prompt.
        host: String,
        /// Privilege level.
        privilege: Privilege,
    },
}

/// Classifies the last, unterminated line of device output.
#[must_use]
pub fn classify_prompt(line: &str) -> Option<Prompt> {
    if let Some(caps) = EXEC_PROMPT.captures(line) {
        let privilege = match (&caps["level"], caps.name("mode")) {
            ("#", Some(_)) => Privilege::Config,
            ("#", None) => Privilege::Privileged,
            _ => Privilege::User,
        };
        return Some(Prompt::Exec {
            host: caps["host"].to_string(),
            privilege,
        });
    }

    if PASSWORD_PROMPT.is_match(line) {
        Some(Prompt::Password)
    } else if USERNAME_PROMPT.is_match(line) {
        Some(Prompt::Username)
    } else {
        None
    }
}

/// Returns true if the line is a pager prompt.
#[must_use]
pub fn is_more_prompt(line: &str) -> bool {
    MORE_PROMPT.is_match(line)
}

/// Removes pager prompts from captured output.
#[must_use]
pub fn strip_more(text: &str) -> String {
    MORE_PROMPT.replace_all(text, "\n").into_owned()
}

/// Returns the IOS error marker in a command's output, if any.
#[must_use]
pub fn error_marker(output: &str) -> Option<&str> {
    ERROR_MARKER
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns true if the output reports a refused login.
#[must_use]
pub fn login_failed(output: &str) -> bool {
    LOGIN_FAILED.is_match(output)
}
