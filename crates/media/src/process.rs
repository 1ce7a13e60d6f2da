//! Running external programs.

use std::io::ErrorKind;
use std::process::{Command, Output};

use slidecast_core::{Error, Result};

/// Run `cmd` to completion, capturing its output.
///
/// A missing executable becomes [`Error::ToolNotFound`] and a non-zero exit
/// becomes [`Error::ProcessError`] carrying stderr.
pub fn run(cmd: &mut Command) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ToolNotFound(program.clone()),
        _ => Error::IoError(e),
    })?;

    if !output.status.success() {
        return Err(Error::process(program, output.status, &output.stderr));
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_tool_not_found() {
        let err = run(&mut Command::new("slidecast-definitely-not-installed")).unwrap_err();
        assert!(
            matches!(err, Error::ToolNotFound(ref p) if p == "slidecast-definitely-not-installed")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        match run(&mut cmd) {
            Err(Error::ProcessError { program, stderr, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected process error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_program_returns_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf ok"]);
        let output = run(&mut cmd).unwrap();
        assert_eq!(output.stdout, b"ok");
    }
}
