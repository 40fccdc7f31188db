//! File names derived from command text.

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+|/").expect("static pattern"));

/// Turn a command into a file-name fragment.
///
/// Runs of whitespace and each `/` become `_`; each `|` becomes `pipe`.
/// The result contains none of those characters, so sanitizing it again
/// changes nothing.
///
/// ```
/// use runcli::batch::sanitize_output_name;
///
/// assert_eq!(sanitize_output_name("show int | inc Eth1/1"), "show_int_pipe_inc_Eth1_1");
/// ```
pub fn sanitize_output_name(command: &str) -> String {
    SEPARATORS.replace_all(command, "_").replace('|', "pipe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_and_whitespace() {
        let name = sanitize_output_name("show | include foo");
        assert_eq!(name, "show_pipe_include_foo");
        assert!(name.contains("pipe"));
        assert!(!name.contains(char::is_whitespace));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_slashes_and_tabs() {
        assert_eq!(
            sanitize_output_name("show interfaces\tethernet1/1/2"),
            "show_interfaces_ethernet1_1_2"
        );
        assert_eq!(sanitize_output_name("a  //b"), "a___b");
    }

    #[test]
    fn test_idempotent() {
        for command in [
            "show version",
            "show ip route | no-more",
            "cat /etc/hosts",
            "  leading and trailing  ",
            "a||b",
            "",
            "show_version_pipe_x",
        ] {
            let once = sanitize_output_name(command);
            assert_eq!(sanitize_output_name(&once), once, "command: {command:?}");
        }
    }
}
