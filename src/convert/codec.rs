//! The opaque asset codec and the mapping resource it needs.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ConversionDirection, ConvertError};

/// Mapping/schema table shared by every unit of a batch.
///
/// Loaded once per batch; its identity participates in cache keys so that
/// switching mappings never serves stale output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingResource {
    path: Option<PathBuf>,
    identity: String,
}

impl MappingResource {
    /// Identity used when no mapping is configured.
    pub const NONE: &'static str = "none";

    /// Reads the mapping at `path` and computes its identity.
    pub fn load(path: Option<&Path>) -> Result<Self, ConvertError> {
        let Some(path) = path else {
            return Ok(Self::none());
        };

        let bytes = fs::read(path).map_err(|source| ConvertError::Mapping {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = format!("{:x}", Sha256::digest(&bytes));
        debug!("Loaded mapping {} ({} bytes)", path.display(), bytes.len());

        Ok(Self {
            path: Some(path.to_path_buf()),
            identity,
        })
    }

    /// No mapping.
    pub fn none() -> Self {
        Self {
            path: None,
            identity: Self::NONE.to_string(),
        }
    }

    /// Path handed to the codec, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// SHA-256 of the mapping bytes, or `"none"`.
    pub fn identity(&self) -> &str {
        &self.identity
    }
}

/// Converts a single file. Implementations must be shareable across worker
/// threads.
pub trait AssetCodec: Send + Sync {
    /// Converts `input` into `output`.
    ///
    /// # Arguments
    /// * `direction` - Which way to convert
    /// * `input` - Existing source file
    /// * `output` - Destination file (parent directory exists)
    /// * `mapping` - Batch-wide mapping resource
    /// * `deadline` - Point after which the conversion must give up
    ///
    /// A started conversion runs to completion or to its deadline; batch
    /// cancellation is handled between units by the caller.
    fn convert(
        &self,
        direction: ConversionDirection,
        input: &Path,
        output: &Path,
        mapping: &MappingResource,
        deadline: Option<Instant>,
    ) -> Result<(), ConvertError>;
}

/// Codec backed by the external converter tool.
///
/// Runs `<tool> to-json|from-json <in> <out> [--usmap <mapping>]` and kills
/// the process when the deadline passes. The tool's stdout is drained on a
/// reader thread while the process runs.
#[derive(Debug, Clone)]
pub struct ExternalCodec {
    tool: PathBuf,
    poll_interval: Duration,
}

impl ExternalCodec {
    /// Creates a codec for the tool at `tool`.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            poll_interval: Duration::from_millis(25),
        }
    }

    /// Path of the converter tool.
    pub fn tool(&self) -> &Path {
        &self.tool
    }
}

impl AssetCodec for ExternalCodec {
    fn convert(
        &self,
        direction: ConversionDirection,
        input: &Path,
        output: &Path,
        mapping: &MappingResource,
        deadline: Option<Instant>,
    ) -> Result<(), ConvertError> {
        let mut cmd = Command::new(&self.tool);
        cmd.arg(direction.command())
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(mapping) = mapping.path() {
            cmd.arg("--usmap").arg(mapping);
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            ConvertError::Codec(format!(
                "Failed to execute {}: {e}",
                self.tool.display()
            ))
        })?;

        let reader = child.stdout.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut stdout = String::new();
                if let Err(e) = pipe.read_to_string(&mut stdout) {
                    debug!("Failed to read converter output: {}", e);
                }
                stdout
            })
        });

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ConvertError::io("Failed to wait for converter", e));
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::Timeout(started.elapsed().as_secs()));
            }
            thread::sleep(self.poll_interval);
        };

        // Joined only after a normal exit; after a kill the reader is detached.
        let stdout = reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(ConvertError::Codec(tool_error_message(&stdout).unwrap_or_else(|| {
                format!(
                    "{} {} exited with {}",
                    self.tool.display(),
                    direction,
                    status.code().map_or_else(|| "signal".to_string(), |c| c.to_string())
                )
            })))
        }
    }
}

/// Extracts `error` from the tool's `{success:false, error}` record.
fn tool_error_message(stdout: &str) -> Option<String> {
    stdout.lines().rev().find_map(|line| {
        serde_json::from_str::<Value>(line.trim())
            .ok()?
            .get("error")?
            .as_str()
            .map(ToString::to_string)
    })
}

/// Codec for tests: writes a small placeholder document.
#[derive(Debug, Default)]
pub struct MockCodec {
    /// Simulated work per unit in milliseconds.
    pub delay_ms: u64,
    /// Input file names that fail with a codec error.
    pub fail_names: Vec<String>,
    pub(crate) calls: AtomicUsize,
}

impl MockCodec {
    /// Creates a mock that fails on the given file names.
    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Number of conversions actually attempted.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetCodec for MockCodec {
    fn convert(
        &self,
        direction: ConversionDirection,
        input: &Path,
        output: &Path,
        mapping: &MappingResource,
        deadline: Option<Instant>,
    ) -> Result<(), ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.delay_ms));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ConvertError::Timeout(0));
        }

        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.fail_names.contains(&name) {
            return Err(ConvertError::Codec(format!("Parse error: {name} is malformed")));
        }

        let source = fs::read(input).map_err(|e| ConvertError::io("Failed to read input", e))?;
        let body = serde_json::json!({
            "Info": format!("mock {direction}"),
            "Source": name,
            "SourceBytes": source.len(),
            "Mapping": mapping.identity(),
            "Exports": []
        });
        fs::write(output, body.to_string())
            .map_err(|e| ConvertError::io(format!("Failed to write {}", output.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mapping_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("game.usmap");
        fs::write(&path, b"abc").unwrap();

        let mapping = MappingResource::load(Some(&path)).unwrap();
        assert_eq!(
            mapping.identity(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(mapping.path(), Some(path.as_path()));
        assert_eq!(MappingResource::load(None).unwrap().identity(), "none");
    }

    #[test]
    fn test_missing_mapping_is_an_error() {
        let err = MappingResource::load(Some(Path::new("/no/such.usmap"))).unwrap_err();
        assert!(matches!(err, ConvertError::Mapping { .. }));
    }

    #[test]
    fn test_tool_error_message() {
        let stdout = "noise\n{\"success\":false,\"error\":\"Parse error: bad header\"}\n";
        assert_eq!(
            tool_error_message(stdout).as_deref(),
            Some("Parse error: bad header")
        );
        assert_eq!(tool_error_message("plain text"), None);
    }

    #[test]
    fn test_external_codec_missing_tool() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("a.uasset");
        fs::write(&input, b"x").unwrap();
        let codec = ExternalCodec::new(temp_dir.path().join("no-such-tool"));
        let err = codec
            .convert(
                ConversionDirection::ToJson,
                &input,
                &temp_dir.path().join("a.json"),
                &MappingResource::none(),
                None,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
    }

    #[test]
    fn test_mock_codec_writes_and_fails() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.uasset");
        let bad = temp_dir.path().join("bad.uasset");
        fs::write(&good, b"1234").unwrap();
        fs::write(&bad, b"1234").unwrap();
        let codec = MockCodec::failing_on(&["bad.uasset"]);
        let mapping = MappingResource::none();

        let out = temp_dir.path().join("good.json");
        codec
            .convert(ConversionDirection::ToJson, &good, &out, &mapping, None)
            .unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["SourceBytes"], 4);

        let err = codec
            .convert(
                ConversionDirection::ToJson,
                &bad,
                &temp_dir.path().join("bad.json"),
                &mapping,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ConvertError::Codec(_)));
        assert_eq!(codec.calls(), 2);
    }

    #[cfg(unix)]
    fn write_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let tool = dir.join("converter.sh");
        fs::write(&tool, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        tool
    }

    #[cfg(unix)]
    #[test]
    fn test_external_codec_drains_large_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("a.uasset");
        let output = temp_dir.path().join("a.json");
        fs::write(&input, b"{}").unwrap();
        // 256 KiB of log lines, well past a pipe buffer
        let tool = write_tool(
            temp_dir.path(),
            "i=0; while [ $i -lt 4096 ]; do echo 'converting export ................................................'; i=$((i+1)); done\ncp \"$2\" \"$3\"",
        );

        let started = Instant::now();
        ExternalCodec::new(tool)
            .convert(
                ConversionDirection::ToJson,
                &input,
                &output,
                &MappingResource::none(),
                Some(Instant::now() + Duration::from_secs(20)),
            )
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(15));
        assert_eq!(fs::read_to_string(&output).unwrap(), "{}");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_codec_reports_tool_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("a.uasset");
        fs::write(&input, b"x").unwrap();
        let tool = write_tool(
            temp_dir.path(),
            "echo '{\"success\":false,\"error\":\"Parse error: bad header\"}'\nexit 4",
        );

        let err = ExternalCodec::new(tool)
            .convert(
                ConversionDirection::ToJson,
                &input,
                &temp_dir.path().join("a.json"),
                &MappingResource::none(),
                None,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Parse error: bad header");
    }
}
