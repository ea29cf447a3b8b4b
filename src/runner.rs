use std::io;
use std::process::{Command, Stdio};
use taskgraph::CommandOutput;

/// Run a command and capture its output, whatever the exit status
pub fn capture(cmd: &str, args: &[String]) -> io::Result<CommandOutput> {
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map(CommandOutput::from)
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_capture_keeps_failure_output() {
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let output = capture("sh", &args).unwrap();
        assert!(!output.success);
        assert_eq!(output.stdout_str().trim(), "out");
        assert_eq!(output.stderr_str().trim(), "err");
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        assert!(capture("dbfleet-no-such-binary", &[]).is_err());
        assert!(!command_exists("dbfleet-no-such-binary"));
    }
}
