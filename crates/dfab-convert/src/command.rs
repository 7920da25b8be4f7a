use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ConversionError, ConversionResult};
use crate::traits::{normalize_newlines, ConversionSource, Converter};

/// Placeholder replaced by the input file path in converter arguments.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Converter that shells out to an external program.
///
/// The program gets the original's path through the `{input}` placeholder
/// (appended as the last argument when no argument carries one) and must
/// print Markdown on stdout. Originals without an on-disk path are staged in
/// a temporary file that keeps the original's extension.
#[derive(Clone, Debug)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    /// Build from a full argv; the first element is the program.
    pub fn new(argv: Vec<String>) -> ConversionResult<Self> {
        let mut argv = argv.into_iter();
        let program = argv
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ConversionError::InvalidCommand("empty command".into()))?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with the placeholder substituted by `input`.
    fn render_args(&self, input: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(INPUT_PLACEHOLDER, &input)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(input.into_owned());
        }
        args
    }

    async fn run(&self, input: &Path) -> ConversionResult<String> {
        let args = self.render_args(input);
        debug!(program = %self.program, ?args, "running converter");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ConversionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(program = %self.program, status = %output.status, "converter failed");
            return Err(ConversionError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                exit_code: output.status.code(),
                stderr,
            });
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|_| ConversionError::InvalidUtf8(format!("output of {}", self.program)))?;
        Ok(normalize_newlines(text))
    }
}

#[async_trait]
impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, source: &ConversionSource<'_>) -> ConversionResult<String> {
        if let Some(path) = source.handle.path() {
            return self.run(path).await;
        }

        let suffix = source
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let staged = stage(source.data.to_vec(), suffix).await?;
        // `staged` is removed when dropped, after the converter has exited.
        self.run(staged.path()).await
    }
}

/// Write `data` to a fresh temporary file on the blocking pool.
async fn stage(data: Vec<u8>, suffix: String) -> ConversionResult<tempfile::NamedTempFile> {
    tokio::task::spawn_blocking(move || -> ConversionResult<tempfile::NamedTempFile> {
        let mut staged = tempfile::Builder::new()
            .prefix("dfab-convert-")
            .suffix(&suffix)
            .tempfile()?;
        staged.write_all(&data)?;
        staged.flush()?;
        Ok(staged)
    })
    .await
    .map_err(|e| {
        ConversionError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
    })?
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use dfab_blob::OriginalHandle;
    use dfab_types::DocumentId;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn handle(filename: &str, path: Option<&Path>) -> OriginalHandle {
        OriginalHandle {
            id: DocumentId::new(),
            filename: filename.into(),
            path: path.map(Path::to_path_buf),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn empty_argv_is_rejected() {
        assert!(matches!(
            CommandConverter::new(Vec::new()).unwrap_err(),
            ConversionError::InvalidCommand(_)
        ));
        assert!(CommandConverter::new(argv(&["  "])).is_err());
    }

    #[test]
    fn placeholder_is_substituted_or_appended() {
        let c = CommandConverter::new(argv(&["conv", "--in={input}", "-"])).unwrap();
        assert_eq!(c.render_args(Path::new("/x/a.pdf")), argv(&["--in=/x/a.pdf", "-"]));

        let c = CommandConverter::new(argv(&["conv", "--to", "md"])).unwrap();
        assert_eq!(
            c.render_args(Path::new("/x/a.pdf")),
            argv(&["--to", "md", "/x/a.pdf"])
        );
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reads_stored_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "# From disk\r\n").unwrap();
        let h = handle("a.txt", Some(&path));

        let c = CommandConverter::new(argv(&["cat", "{input}"])).unwrap();
        let text = c
            .convert(&ConversionSource::new(&h, "application/pdf", b"ignored"))
            .await
            .unwrap();
        assert_eq!(text, "# From disk\n");
    }

    #[tokio::test]
    async fn stages_bytes_without_path() {
        let h = handle("doc.bin", None);
        let c = CommandConverter::new(argv(&["cat"])).unwrap();
        let text = c
            .convert(&ConversionSource::new(&h, "application/octet-stream", b"staged bytes"))
            .await
            .unwrap();
        assert_eq!(text, "staged bytes");
    }

    #[tokio::test]
    async fn staged_file_keeps_extension() {
        let h = handle("deck.PPTX", None);
        let c = CommandConverter::new(argv(&["sh", "-c", "basename \"$0\"", "{input}"])).unwrap();
        let text = c
            .convert(&ConversionSource::new(&h, "application/octet-stream", b""))
            .await
            .unwrap();
        assert!(text.trim_end().ends_with(".pptx"), "{text}");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let h = handle("a.pdf", None);
        let c = CommandConverter::new(argv(&["sh", "-c", "echo boom >&2; exit 3", "{input}"]))
            .unwrap();
        let err = c
            .convert(&ConversionSource::new(&h, "application/pdf", b"x"))
            .await
            .unwrap_err();
        match err {
            ConversionError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let h = handle("a.pdf", None);
        let c = CommandConverter::new(argv(&["/nonexistent/dfab-converter"])).unwrap();
        let err = c
            .convert(&ConversionSource::new(&h, "application/pdf", b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Spawn { .. }));
    }
}
