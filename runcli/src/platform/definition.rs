//! Device profile definition.

use regex::bytes::Regex;

use crate::error::{PlatformError, Result};

/// Prompt recognition and line handling for one device family.
///
/// The prompt pattern is matched against the tail of the output stream,
/// so it must be anchored at the end (`$`) and describe only the trailing
/// fragment of the prompt, never a full line: prompts can follow arbitrary
/// scrollback.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    /// Device type identifier (e.g., "arista", "junos").
    pub device_type: String,

    /// Pattern that matches the device's command prompt.
    pub prompt: Regex,

    /// Extra terminator appended to every command line (e.g., "\r").
    pub extra_terminator: String,
}

impl DeviceProfile {
    /// Create a profile with no extra line terminator.
    pub fn new(device_type: impl Into<String>, prompt: &str) -> Result<Self> {
        if !is_end_anchored(prompt) {
            return Err(PlatformError::InvalidDefinition {
                message: format!("prompt pattern '{prompt}' must be anchored with '$'"),
            }
            .into());
        }

        let prompt = Regex::new(prompt).map_err(|e| PlatformError::InvalidDefinition {
            message: e.to_string(),
        })?;

        Ok(Self {
            device_type: device_type.into(),
            prompt,
            extra_terminator: String::new(),
        })
    }

    /// Set the extra line terminator sent after each command.
    pub fn with_extra_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.extra_terminator = terminator.into();
        self
    }

    /// Build the full line written for a command.
    pub fn command_line(&self, command: &str) -> String {
        format!("{}{}", command, self.extra_terminator)
    }
}

/// Check that `pattern` ends in an unescaped `$`.
fn is_end_anchored(pattern: &str) -> bool {
    let Some(body) = pattern.strip_suffix('$') else {
        return false;
    };
    let escapes = body.bytes().rev().take_while(|&b| b == b'\\').count();
    escapes % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_prompt_rejected() {
        let err = DeviceProfile::new("bad", r"router#").unwrap_err();
        assert!(err.to_string().contains("anchored"));
    }

    #[test]
    fn test_escaped_dollar_rejected() {
        assert!(DeviceProfile::new("bad", r"\$").is_err());
        assert!(DeviceProfile::new("bad", r"host\\\$").is_err());
        assert!(DeviceProfile::new("ok", r"host\\$").is_ok());
        assert!(DeviceProfile::new("ok", r"\$ $").is_ok());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        assert!(DeviceProfile::new("bad", r"([#$").is_err());
    }

    #[test]
    fn test_command_line_terminator() {
        let plain = DeviceProfile::new("plain", r"#$").unwrap();
        assert_eq!(plain.command_line("show version"), "show version");

        let cr = plain.clone().with_extra_terminator("\r");
        assert_eq!(cr.command_line("show version"), "show version\r");
    }
}
