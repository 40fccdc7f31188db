//! Connection and credential configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::{Result, TransportError};

/// How a session reaches the device. Only `ssh` is implemented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectMethod {
    /// Spawn the system ssh client on a pseudo-terminal.
    #[default]
    Ssh,
}

impl FromStr for ConnectMethod {
    type Err = TransportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            _ => Err(TransportError::UnsupportedMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// Authentication method. Exactly one is active per run.
#[derive(Debug)]
pub enum AuthMethod {
    /// Answer the password prompt with this secret.
    Password(SecretString),

    /// Pass `-i <path>` to ssh and expect no password prompt.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
    },
}

/// Username plus authentication method.
#[derive(Debug)]
pub struct Credentials {
    /// Login username.
    pub username: String,

    /// Active authentication method.
    pub auth: AuthMethod,
}

impl Credentials {
    /// Password authentication.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::Password(SecretString::from(password.into())),
        }
    }

    /// Private key authentication.
    pub fn private_key(username: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            username: username.into(),
            auth: AuthMethod::PrivateKey { path: path.into() },
        }
    }

    /// Build credentials from optional parts.
    ///
    /// A private key takes precedence over a password. Supplying neither is
    /// an error.
    pub fn from_parts(
        username: impl Into<String>,
        password: Option<String>,
        private_key: Option<PathBuf>,
    ) -> Result<Self> {
        let username = username.into();
        match (private_key, password) {
            (Some(path), _) => Ok(Self::private_key(username, path)),
            (None, Some(password)) => Ok(Self::password(username, password)),
            (None, None) => Err(TransportError::InvalidCredentials {
                user: username,
                message: "either a password or a private key is required".to_string(),
            }
            .into()),
        }
    }

    /// The password, when password authentication is active.
    pub fn password_secret(&self) -> Option<&SecretString> {
        match &self.auth {
            AuthMethod::Password(secret) => Some(secret),
            AuthMethod::PrivateKey { .. } => None,
        }
    }

    /// The private key path, when key authentication is active.
    pub fn key_path(&self) -> Option<&Path> {
        match &self.auth {
            AuthMethod::PrivateKey { path } => Some(path),
            AuthMethod::Password(_) => None,
        }
    }

    /// Check that the configured private key can be read and parsed.
    ///
    /// Does nothing for password authentication.
    pub fn check_private_key(&self) -> Result<()> {
        let Some(path) = self.key_path() else {
            return Ok(());
        };
        ssh_key::PrivateKey::read_openssh_file(path).map_err(|e| TransportError::Key {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Command line used to spawn the ssh client.
#[derive(Debug, Clone)]
pub struct SshCommand {
    /// ssh executable (default: "ssh").
    pub program: String,

    /// Login username (`-l`).
    pub username: String,

    /// Private key (`-i`), if key authentication is used.
    pub private_key: Option<PathBuf>,

    /// Port (`-p`), if not the default.
    pub port: Option<u16>,

    /// Extra arguments placed before the host.
    pub extra_args: Vec<String>,

    /// Terminal width for the PTY.
    pub terminal_width: u16,

    /// Terminal height for the PTY.
    pub terminal_height: u16,
}

impl SshCommand {
    /// Spawn settings for the given credentials.
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            program: "ssh".to_string(),
            username: credentials.username.clone(),
            private_key: credentials.key_path().map(Path::to_path_buf),
            port: None,
            extra_args: Vec::new(),
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Arguments passed to the ssh executable for `host`.
    pub fn args(&self, host: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(key) = &self.private_key {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push("-l".to_string());
        args.push(self.username.clone());
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(host.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use secrecy::ExposeSecret;

    #[test]
    fn test_connect_method() {
        assert_eq!("ssh".parse::<ConnectMethod>().unwrap(), ConnectMethod::Ssh);
        assert_eq!("SSH".parse::<ConnectMethod>().unwrap(), ConnectMethod::Ssh);
        let err = "telnet".parse::<ConnectMethod>().unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedMethod { method } if method == "telnet"));
    }

    #[test]
    fn test_key_takes_precedence() {
        let creds = Credentials::from_parts(
            "admin",
            Some("secret".to_string()),
            Some(PathBuf::from("/tmp/id_rsa")),
        )
        .unwrap();
        assert_eq!(creds.key_path(), Some(Path::new("/tmp/id_rsa")));
        assert!(creds.password_secret().is_none());
    }

    #[test]
    fn test_password_only() {
        let creds = Credentials::from_parts("admin", Some("secret".to_string()), None).unwrap();
        assert_eq!(creds.password_secret().unwrap().expose_secret(), "secret");
        assert!(creds.key_path().is_none());
        creds.check_private_key().unwrap();
    }

    #[test]
    fn test_no_auth_method_rejected() {
        let err = Credentials::from_parts("admin", None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn test_missing_key_file() {
        let creds = Credentials::private_key("admin", "/nonexistent/id_ed25519");
        assert!(matches!(
            creds.check_private_key(),
            Err(Error::Transport(TransportError::Key { .. }))
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let creds = Credentials::password("admin", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_ssh_args() {
        let creds = Credentials::password("admin", "secret");
        let cmd = SshCommand::new(&creds);
        assert_eq!(cmd.args("10.0.0.1"), ["-l", "admin", "10.0.0.1"]);

        let creds = Credentials::private_key("admin", "/keys/id_rsa");
        let mut cmd = SshCommand::new(&creds);
        cmd.port = Some(2222);
        assert_eq!(
            cmd.args("sw1"),
            ["-i", "/keys/id_rsa", "-l", "admin", "-p", "2222", "sw1"]
        );
    }
}
