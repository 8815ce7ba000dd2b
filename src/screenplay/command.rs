use std::io::{self, Write};
use std::process::{Command, Stdio};

use super::{ParseError, ParsedDocument, ScreenplayParser};

/// Parser collaborator that runs an external program.
///
/// The program receives the screenplay on stdin and must print a JSON object
/// `{"title_page": <string|null>, "script": <string>}` on stdout (`body` is
/// accepted in place of `script`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    program: String,
    args: Vec<String>,
}

impl CommandParser {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace-separated command line, e.g. `"fountain2json --html"`.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(ToOwned::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ScreenplayParser for CommandParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let spawn_err = |source| ParseError::Spawn {
            program: self.program.clone(),
            source,
        };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // stdin is fed from its own thread while stdout and stderr drain here,
        // so a program that answers before reading all input cannot stall us
        // on a full pipe.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer =
                stdin.map(|mut stdin| scope.spawn(move || stdin.write_all(text.as_bytes())));
            let output = child.wait_with_output();
            let written = writer.map_or(Ok(()), |writer| {
                writer
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
            });
            (written, output)
        });
        let output = output.map_err(spawn_err)?;
        match written {
            // The program stopped reading; its exit status and output decide.
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!(program = %self.program, "parser closed stdin early");
            }
            other => other.map_err(spawn_err)?,
        }
        if !output.status.success() {
            return Err(ParseError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let parsed: ParsedDocument = serde_json::from_slice(&output.stdout)?;
        tracing::debug!(
            program = %self.program,
            input_bytes = text.len(),
            title_page = parsed.title_page.is_some(),
            "parser collaborator finished"
        );
        Ok(parsed.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line_splits_args() {
        let parser = CommandParser::from_command_line("fountain2json --html  --strict").unwrap();
        assert_eq!(parser.program(), "fountain2json");
        assert_eq!(parser.args, vec!["--html", "--strict"]);
        assert!(CommandParser::from_command_line("   ").is_none());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let parser = CommandParser::new("fountain-view-no-such-parser", Vec::new());
        let err = parser.parse("INT. HOUSE - DAY").unwrap_err();
        assert!(matches!(err, ParseError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_json_from_stdout() {
        let parser = CommandParser::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; printf '{"title_page":"","script":"<p>ok</p>"}'"#.to_string(),
            ],
        );
        let doc = parser.parse("anything").unwrap();
        assert!(doc.title_page.is_none());
        assert_eq!(doc.body, "<p>ok</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported_with_stderr() {
        let parser = CommandParser::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo bad input >&2; exit 3".to_string()],
        );
        match parser.parse("x").unwrap_err() {
            ParseError::Exit { stderr, .. } => assert_eq!(stderr, "bad input"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_garbage_output_is_output_error() {
        let parser = CommandParser::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo not-json".to_string()],
        );
        assert!(matches!(parser.parse("x"), Err(ParseError::Output(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_echoed_back_does_not_stall() {
        // Echoing fills the stdout pipe long before stdin is fully written.
        let parser = CommandParser::new("cat", Vec::new());
        let text = "INT. HOUSE - DAY\n".repeat(12_000);
        assert!(text.len() > 200_000);
        assert!(matches!(parser.parse(&text), Err(ParseError::Output(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_program_ignoring_stdin_still_answers() {
        let parser = CommandParser::new(
            "sh",
            vec!["-c".to_string(), r#"printf '{"script":"<p>early</p>"}'"#.to_string()],
        );
        let doc = parser.parse(&"FADE IN:\n".repeat(20_000)).unwrap();
        assert_eq!(doc.body, "<p>early</p>");
    }
}
