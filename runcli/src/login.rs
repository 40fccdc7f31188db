//! Login handshake as an explicit state machine.
//!
//! A freshly spawned ssh client prints one of a handful of things: a
//! host-key confirmation, a password prompt, a host-key verification
//! failure, or (for key auth and jump hosts) a prompt straight away. Each
//! read waits for the first of the candidates allowed in the current state,
//! and the pair `(state, event)` is looked up in [`TRANSITIONS`].
//!
//! ```text
//!            new host key               password prompt
//! ┌──────┐  send "yes"   ┌─────────────┐ send password ┌─────────────┐
//! │ Init ├──────────────►│ HostKeyAcc. ├──────────────►│PasswordSent │
//! └─┬──┬─┘               └─────────────┘               └──┬───────┬──┘
//!   │  │ password prompt, send password                   │       │
//!   │  └──────────────────────────────────────────────────┘       │
//!   │ device prompt / shell prompt               device prompt    │
//!   └───────────────────────────► Connected ◄──────────────────────┘
//! ```
//!
//! Only one password is ever sent. A second password prompt means the
//! credentials were rejected; retrying would only feed login throttling on
//! the device.

use std::time::Duration;

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use crate::channel::{Expect, PatternSet, PtyChannel};
use crate::error::{LoginError, Result};
use crate::platform::DeviceProfile;
use crate::transport::{Credentials, Transport};

/// ssh asking to trust an unknown host key.
pub const NEW_HOST_KEY: &str = "Are you sure you want to continue connecting";

/// Password prompt from ssh or the device.
pub const PASSWORD_PROMPT: &str = "assword:";

/// ssh refusing a changed host key.
pub const HOST_KEY_FAILED: &str = r"verification failed\.";

/// Plain `$ ` shell prompt, as shown by jump hosts.
pub const SHELL_PROMPT: &str = r"\$ $";

/// Reply to the host key question.
const CONFIRM: &str = "yes";

/// Position in the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginState {
    /// Nothing sent yet.
    Init,
    /// Host key accepted, waiting for a credential challenge.
    HostKeyAccepted,
    /// Password sent, waiting for the device prompt.
    PasswordSent,
}

/// What a read produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginEvent {
    /// Nothing recognised before the timeout.
    Timeout,
    /// [`NEW_HOST_KEY`] matched.
    NewHostKey,
    /// [`PASSWORD_PROMPT`] matched.
    PasswordPrompt,
    /// [`HOST_KEY_FAILED`] matched.
    HostKeyFailed,
    /// The device profile's prompt matched.
    DevicePrompt,
    /// [`SHELL_PROMPT`] matched.
    ShellPrompt,
}

/// Input sent before moving to the next state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAction {
    /// Answer the host key question.
    ConfirmHostKey,
    /// Send the password.
    SendPassword,
}

/// How the session became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedVia {
    /// Device prompt without any challenge (key authentication).
    KeyAuth,
    /// Device prompt after the password was accepted.
    Password,
    /// Generic shell prompt of a jump host, no credential sent.
    HopShell,
}

/// Terminal failure of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    Timeout,
    BadCredentials,
    HostKeyChanged,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Perform `action`, then wait in `next`.
    Next { action: LoginAction, next: LoginState },
    /// Session is ready for commands.
    Connected(ConnectedVia),
    /// Handshake is over and failed.
    Failed(LoginFailure),
}

use LoginEvent as E;
use LoginState as S;
use Transition as Step;

/// The transition table. Row order within a state is also the candidate
/// order used to break ties when two patterns match at the same offset.
pub const TRANSITIONS: &[(LoginState, LoginEvent, Transition)] = &[
    (S::Init, E::Timeout, Step::Failed(LoginFailure::Timeout)),
    (
        S::Init,
        E::NewHostKey,
        Step::Next {
            action: LoginAction::ConfirmHostKey,
            next: S::HostKeyAccepted,
        },
    ),
    (
        S::Init,
        E::PasswordPrompt,
        Step::Next {
            action: LoginAction::SendPassword,
            next: S::PasswordSent,
        },
    ),
    (S::Init, E::HostKeyFailed, Step::Failed(LoginFailure::HostKeyChanged)),
    (S::Init, E::DevicePrompt, Step::Connected(ConnectedVia::KeyAuth)),
    (S::Init, E::ShellPrompt, Step::Connected(ConnectedVia::HopShell)),
    (S::HostKeyAccepted, E::Timeout, Step::Failed(LoginFailure::Timeout)),
    (
        S::HostKeyAccepted,
        E::PasswordPrompt,
        Step::Next {
            action: LoginAction::SendPassword,
            next: S::PasswordSent,
        },
    ),
    (S::HostKeyAccepted, E::DevicePrompt, Step::Connected(ConnectedVia::KeyAuth)),
    (S::PasswordSent, E::Timeout, Step::Failed(LoginFailure::Timeout)),
    (S::PasswordSent, E::DevicePrompt, Step::Connected(ConnectedVia::Password)),
    (S::PasswordSent, E::PasswordPrompt, Step::Failed(LoginFailure::BadCredentials)),
];

/// Look up the transition for `event` in `state`.
pub fn transition(state: LoginState, event: LoginEvent) -> Option<Transition> {
    TRANSITIONS
        .iter()
        .find(|(s, e, _)| *s == state && *e == event)
        .map(|(_, _, t)| *t)
}

/// Events a read in `state` waits for, in candidate order.
pub fn candidates(state: LoginState) -> impl Iterator<Item = LoginEvent> {
    TRANSITIONS
        .iter()
        .filter(move |(s, _, _)| *s == state)
        .map(|(_, e, _)| *e)
}

struct FixedPatterns {
    new_host_key: Regex,
    password: Regex,
    host_key_failed: Regex,
    shell: Regex,
}

static FIXED: Lazy<FixedPatterns> = Lazy::new(|| FixedPatterns {
    new_host_key: Regex::new(NEW_HOST_KEY).expect("static pattern"),
    password: Regex::new(PASSWORD_PROMPT).expect("static pattern"),
    host_key_failed: Regex::new(HOST_KEY_FAILED).expect("static pattern"),
    shell: Regex::new(SHELL_PROMPT).expect("static pattern"),
});

/// Build the pattern set for a read in `state`.
fn patterns_for(state: LoginState, device_prompt: &Regex) -> PatternSet<LoginEvent> {
    candidates(state).fold(PatternSet::new(), |set, event| {
        let pattern = match event {
            E::Timeout => return set,
            E::NewHostKey => &FIXED.new_host_key,
            E::PasswordPrompt => &FIXED.password,
            E::HostKeyFailed => &FIXED.host_key_failed,
            E::DevicePrompt => device_prompt,
            E::ShellPrompt => &FIXED.shell,
        };
        set.with(event, pattern.clone())
    })
}

/// Drive the handshake on `channel` until the session is ready or fails.
///
/// Every read is bounded by `timeout`; a timeout in any state ends the
/// handshake.
pub async fn login<T: Transport>(
    channel: &mut PtyChannel<T>,
    host: &str,
    profile: &DeviceProfile,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<ConnectedVia> {
    info!("Connecting to {}", host);

    let mut state = LoginState::Init;
    let mut seen = String::new();

    loop {
        let patterns = patterns_for(state, &profile.prompt);
        let event = match channel.expect(&patterns, timeout).await? {
            Expect::Matched {
                key,
                before,
                matched,
            } => {
                seen.push_str(&before);
                seen.push_str(&matched);
                key
            }
            Expect::Timeout { before } => {
                seen.push_str(&before);
                LoginEvent::Timeout
            }
            Expect::Eof { before } => {
                seen.push_str(&before);
                error!("{}: ssh exited during login", host);
                return Err(LoginError::Closed {
                    host: host.to_string(),
                    output: seen,
                }
                .into());
            }
        };

        let Some(step) = transition(state, event) else {
            unreachable!("{event:?} is not a candidate in {state:?}");
        };
        debug!("{}: login {:?} + {:?} -> {:?}", host, state, event, step);

        match step {
            Transition::Next { action, next } => {
                match action {
                    LoginAction::ConfirmHostKey => channel.send_line(CONFIRM).await?,
                    LoginAction::SendPassword => match credentials.password_secret() {
                        Some(password) => channel.send_line(password.expose_secret()).await?,
                        None => {
                            error!("{}: password requested but only key auth is configured", host);
                            return Err(LoginError::BadCredentials {
                                host: host.to_string(),
                                output: seen,
                            }
                            .into());
                        }
                    },
                }
                state = next;
            }
            Transition::Connected(via) => {
                info!("Connected to {}", host);
                return Ok(via);
            }
            Transition::Failed(failure) => {
                return Err(failure_error(failure, host, timeout, seen).into());
            }
        }
    }
}

fn failure_error(failure: LoginFailure, host: &str, timeout: Duration, output: String) -> LoginError {
    let host = host.to_string();
    match failure {
        LoginFailure::Timeout => {
            error!("SSH could not login to {}. Here is what SSH said:", host);
            if !output.is_empty() {
                error!("{}", output);
            }
            LoginError::Timeout {
                host,
                timeout,
                output,
            }
        }
        LoginFailure::BadCredentials => {
            error!("Device credentials do not work for {}", host);
            LoginError::BadCredentials { host, output }
        }
        LoginFailure::HostKeyChanged => {
            error!("{}", output);
            LoginError::HostKeyChanged { host, output }
        }
    }
}
