//! Parallel batch conversion with caching and fault isolation.
//!
//! ## Design
//!
//! - Workers pull unit indices from a shared atomic cursor
//! - Each finished unit is sent over an mpsc channel to the calling thread,
//!   which counts completions, emits progress and collects results
//! - A unit's failure never affects its siblings
//! - Cancellation stops new units from starting; in-flight units finish
//! - Output paths are resolved before dispatch; a unit whose output escapes
//!   the output directory or repeats an earlier unit's output fails alone
//! - Results are returned in input order

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::{hash_file, ConversionCache};
use super::codec::{AssetCodec, MappingResource};
use super::progress::{ProgressEvent, ProgressSink};
use super::units::ConversionUnit;
use super::{ConversionDirection, ConvertError};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Batch tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Worker threads (0 uses the processor count)
    pub workers: usize,
    /// Deadline for each codec call
    pub unit_timeout: Option<Duration>,
    /// Whether to consult and fill the cache
    pub use_cache: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            unit_timeout: None,
            use_cache: true,
        }
    }
}

/// Outcome of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    /// Whether an output was produced
    pub success: bool,
    /// Input file name
    pub file_name: String,
    /// Input path as given
    pub input_path: String,
    /// Produced file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    /// Served from cache
    pub cached: bool,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitResult {
    fn failed(unit: &ConversionUnit, error: &ConvertError) -> Self {
        Self {
            success: false,
            file_name: unit.name(),
            input_path: unit.input.display().to_string(),
            output_path: None,
            cached: false,
            error: Some(error.to_string()),
        }
    }
}

/// Final batch record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Always true: the batch itself completed
    pub success: bool,
    /// Unique id of this run
    pub batch_id: String,
    /// `batch-to-json` or `batch-from-json`
    pub command: String,
    /// Units in the batch
    pub total: usize,
    /// Units that produced output
    pub succeeded: usize,
    /// Units that did not
    pub failed: usize,
    /// Successful units served from cache
    pub cached_count: usize,
    /// Per-unit results in input order
    pub results: Vec<UnitResult>,
}

impl BatchSummary {
    /// Process exit code: 0 when every unit succeeded, otherwise 4 for
    /// `batch-to-json` and 5 for `batch-from-json`.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else if self.command == ConversionDirection::FromJson.batch_command() {
            5
        } else {
            4
        }
    }
}

/// Resolves the worker count for `unit_count` units.
///
/// # Examples
///
/// ```
/// use rvfxe::convert::pipeline::worker_count;
///
/// assert_eq!(worker_count(8, 3), 3);
/// assert_eq!(worker_count(2, 10), 2);
/// assert_eq!(worker_count(4, 0), 1);
/// ```
pub fn worker_count(requested: usize, unit_count: usize) -> usize {
    let wanted = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    wanted.min(unit_count).max(1)
}

/// Runs batches against one codec and an optional cache.
pub struct BatchPipeline<'a> {
    codec: &'a dyn AssetCodec,
    cache: Option<&'a ConversionCache>,
    options: PipelineOptions,
}

impl<'a> BatchPipeline<'a> {
    /// Creates a pipeline.
    pub fn new(
        codec: &'a dyn AssetCodec,
        cache: Option<&'a ConversionCache>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            codec,
            cache,
            options,
        }
    }

    /// Converts every unit into `output_dir`.
    ///
    /// Emits exactly one progress event per unit, including units skipped by
    /// cancellation, which are reported as failed.
    pub fn run(
        &self,
        direction: ConversionDirection,
        units: &[ConversionUnit],
        output_dir: &Path,
        mapping: &MappingResource,
        sink: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> BatchSummary {
        let total = units.len();
        let batch_id = Uuid::new_v4().to_string();
        let workers = worker_count(self.options.workers, total);
        info!(
            "Batch {} ({}): {} unit(s) on {} worker(s)",
            batch_id,
            direction.batch_command(),
            total,
            workers
        );

        let planned = plan_outputs(direction, units, output_dir);
        let mut results: Vec<Option<UnitResult>> = vec![None; total];
        let mut completed = 0;
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, UnitResult)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let planned = &planned;
                scope.spawn(move || loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(unit) = units.get(index) else {
                        break;
                    };
                    let result = match &planned[index] {
                        Ok(output) => self.process_unit(direction, unit, output, mapping),
                        Err(e) => {
                            warn!("Skipping {}: {}", unit.input.display(), e);
                            UnitResult::failed(unit, e)
                        }
                    };
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (index, result) in rx {
                completed += 1;
                sink.emit(&ProgressEvent::new(
                    completed,
                    total,
                    result.file_name.clone(),
                    result.cached,
                    result.error.clone(),
                ));
                results[index] = Some(result);
            }
        });

        let results: Vec<UnitResult> = results
            .into_iter()
            .zip(units)
            .map(|(result, unit)| {
                result.unwrap_or_else(|| {
                    let skipped = UnitResult::failed(unit, &ConvertError::Cancelled);
                    completed += 1;
                    sink.emit(&ProgressEvent::new(
                        completed,
                        total,
                        skipped.file_name.clone(),
                        false,
                        skipped.error.clone(),
                    ));
                    skipped
                })
            })
            .collect();

        if let Some(cache) = self.cache.filter(|_| self.options.use_cache) {
            if let Err(e) = cache.flush() {
                warn!("Failed to persist cache index: {}", e);
            }
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let cached_count = results.iter().filter(|r| r.cached).count();
        let summary = BatchSummary {
            success: true,
            batch_id,
            command: direction.batch_command().to_string(),
            total,
            succeeded,
            failed: total - succeeded,
            cached_count,
            results,
        };
        info!(
            "Batch {} finished: {} succeeded, {} failed, {} cached",
            summary.batch_id, summary.succeeded, summary.failed, summary.cached_count
        );
        summary
    }

    /// Converts a single file to an explicit output path.
    pub fn convert_one(
        &self,
        direction: ConversionDirection,
        input: &Path,
        output: &Path,
        mapping: &MappingResource,
    ) -> Result<UnitResult, ConvertError> {
        let unit = ConversionUnit::new(input);
        let cached = self.convert_to(direction, &unit, output, mapping)?;
        Ok(UnitResult {
            success: true,
            file_name: unit.name(),
            input_path: input.display().to_string(),
            output_path: Some(output.display().to_string()),
            cached,
            error: None,
        })
    }

    fn process_unit(
        &self,
        direction: ConversionDirection,
        unit: &ConversionUnit,
        output: &Path,
        mapping: &MappingResource,
    ) -> UnitResult {
        match self.convert_to(direction, unit, output, mapping) {
            Ok(cached) => UnitResult {
                success: true,
                file_name: unit.name(),
                input_path: unit.input.display().to_string(),
                output_path: Some(output.display().to_string()),
                cached,
                error: None,
            },
            Err(e) => {
                debug!("Unit {} failed: {}", unit.input.display(), e);
                UnitResult::failed(unit, &e)
            }
        }
    }

    /// Returns whether the output came from cache.
    fn convert_to(
        &self,
        direction: ConversionDirection,
        unit: &ConversionUnit,
        output: &Path,
        mapping: &MappingResource,
    ) -> Result<bool, ConvertError> {
        if !unit.input.is_file() {
            return Err(ConvertError::InputNotFound(unit.input.clone()));
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConvertError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        let cache = self.cache.filter(|_| self.options.use_cache);
        let cache_key = match cache {
            Some(_) => {
                let hash = hash_file(&unit.input).map_err(|e| {
                    ConvertError::io(format!("Failed to hash {}", unit.input.display()), e)
                })?;
                let key = ConversionCache::key(&hash, mapping.identity(), direction);
                Some((hash, key))
            }
            None => None,
        };

        if let (Some(cache), Some((_, key))) = (cache, &cache_key) {
            if cache.fetch(key, output)? {
                return Ok(true);
            }
        }

        let deadline = self.options.unit_timeout.map(|t| Instant::now() + t);
        self.codec
            .convert(direction, &unit.input, output, mapping, deadline)?;

        if let (Some(cache), Some((hash, key))) = (cache, &cache_key) {
            if let Err(e) = cache.store(key, hash, &unit.input, output, direction) {
                warn!("Failed to cache {}: {}", unit.input.display(), e);
            }
        }
        Ok(false)
    }
}

/// Resolves every unit's output path under `output_dir`.
///
/// The first unit to claim a path keeps it; later claimants fail.
fn plan_outputs(
    direction: ConversionDirection,
    units: &[ConversionUnit],
    output_dir: &Path,
) -> Vec<Result<PathBuf, ConvertError>> {
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    units
        .iter()
        .enumerate()
        .map(|(index, unit)| {
            let relative = unit.checked_output(direction)?;
            match claimed.entry(relative) {
                Entry::Occupied(entry) => Err(ConvertError::DuplicateOutput {
                    output: entry.key().display().to_string(),
                    first: units[*entry.get()].input.display().to_string(),
                }),
                Entry::Vacant(entry) => {
                    let output = output_dir.join(entry.key());
                    entry.insert(index);
                    Ok(output)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::codec::MockCodec;
    use crate::convert::progress::{ChannelSink, NullSink};
    use tempfile::TempDir;

    fn inputs(dir: &Path, names: &[&str]) -> Vec<ConversionUnit> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, format!("binary {name}")).unwrap();
                ConversionUnit::new(path)
            })
            .collect()
    }

    #[test]
    fn test_batch_counts_with_missing_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let mut units = inputs(temp_dir.path(), &["a.uasset", "b.uasset", "c.uasset", "d.uasset"]);
        units.push(ConversionUnit::new(temp_dir.path().join("missing1.uasset")));
        units.push(ConversionUnit::new(temp_dir.path().join("missing2.uasset")));

        let codec = MockCodec::failing_on(&["c.uasset"]);
        let pipeline = BatchPipeline::new(
            &codec,
            None,
            PipelineOptions {
                workers: 3,
                ..PipelineOptions::default()
            },
        );
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink(tx);
        let summary = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &temp_dir.path().join("out"),
            &MappingResource::none(),
            &mut sink,
            &CancelToken::new(),
        );
        drop(sink);

        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded + summary.failed, 6);
        assert!(summary.failed >= 2);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.exit_code(), 4);
        assert_eq!(summary.command, "batch-to-json");

        let events: Vec<ProgressEvent> = rx.iter().collect();
        let mut counts: Vec<usize> = events.iter().map(|e| e.current).collect();
        counts.sort_unstable();
        assert_eq!(counts, (1..=6).collect::<Vec<_>>());
        assert_eq!(events.iter().filter(|e| e.current == 6).count(), 1);

        // Results keep input order
        let names: Vec<&str> = summary.results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["a.uasset", "b.uasset", "c.uasset", "d.uasset", "missing1.uasset", "missing2.uasset"]
        );
        assert!(summary.results[4].error.as_deref().unwrap().contains("File not found"));
        assert!(temp_dir.path().join("out/a.json").exists());
    }

    #[test]
    fn test_second_run_is_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let units = inputs(temp_dir.path(), &["a.uasset", "b.uasset"]);
        let cache = ConversionCache::open(temp_dir.path().join("cache"));
        let codec = MockCodec::default();
        let pipeline = BatchPipeline::new(&codec, Some(&cache), PipelineOptions::default());
        let mapping = MappingResource::none();

        let first = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &temp_dir.path().join("out1"),
            &mapping,
            &mut NullSink,
            &CancelToken::new(),
        );
        assert_eq!(first.cached_count, 0);
        assert_eq!(codec.calls(), 2);

        let second = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &temp_dir.path().join("out2"),
            &mapping,
            &mut NullSink,
            &CancelToken::new(),
        );
        assert_eq!(second.cached_count, 2);
        assert!(second.results.iter().all(|r| r.cached && r.success));
        assert_eq!(codec.calls(), 2);
        assert!(temp_dir.path().join("out2/b.json").exists());

        // Changing the source content invalidates its entry
        fs::write(&units[0].input, "changed").unwrap();
        let third = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &temp_dir.path().join("out3"),
            &mapping,
            &mut NullSink,
            &CancelToken::new(),
        );
        assert_eq!(third.cached_count, 1);
        assert!(!third.results[0].cached);
        assert_eq!(codec.calls(), 3);
    }

    #[test]
    fn test_cancelled_batch_reports_every_unit() {
        let temp_dir = TempDir::new().unwrap();
        let units = inputs(temp_dir.path(), &["a.uasset", "b.uasset", "c.uasset"]);
        let codec = MockCodec::default();
        let pipeline = BatchPipeline::new(&codec, None, PipelineOptions::default());
        let cancel = CancelToken::new();
        cancel.cancel();

        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink(tx);
        let summary = pipeline.run(
            ConversionDirection::FromJson,
            &units,
            &temp_dir.path().join("out"),
            &MappingResource::none(),
            &mut sink,
            &cancel,
        );
        drop(sink);

        assert_eq!(codec.calls(), 0);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.exit_code(), 5);
        assert!(summary.results.iter().all(|r| r.error.as_deref() == Some("cancelled")));
        assert_eq!(rx.iter().count(), 3);
    }

    #[test]
    fn test_cancel_lets_running_unit_finish() {
        let temp_dir = TempDir::new().unwrap();
        let units = inputs(temp_dir.path(), &["a.uasset", "b.uasset", "c.uasset"]);
        let codec = MockCodec {
            delay_ms: 500,
            ..MockCodec::default()
        };
        let pipeline = BatchPipeline::new(
            &codec,
            None,
            PipelineOptions {
                workers: 1,
                ..PipelineOptions::default()
            },
        );
        let out = temp_dir.path().join("out");
        let cancel = CancelToken::new();

        let summary = thread::scope(|scope| {
            scope.spawn(|| {
                while codec.calls() == 0 {
                    thread::sleep(Duration::from_millis(5));
                }
                cancel.cancel();
            });
            pipeline.run(
                ConversionDirection::ToJson,
                &units,
                &out,
                &MappingResource::none(),
                &mut NullSink,
                &cancel,
            )
        });

        assert!(summary.results[0].success);
        assert!(out.join("a.json").exists());
        assert!(codec.calls() < 3);
        assert_eq!(summary.results[2].error.as_deref(), Some("cancelled"));
        assert!(!out.join("c.json").exists());
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_duplicate_outputs_fail_later_units() {
        let temp_dir = TempDir::new().unwrap();
        for (dir, body) in [("d1", "one"), ("d2", "second")] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
            fs::write(temp_dir.path().join(dir).join("x.uasset"), body).unwrap();
        }
        let units = vec![
            ConversionUnit::new(temp_dir.path().join("d1/x.uasset")),
            ConversionUnit::new(temp_dir.path().join("d2/x.uasset")),
        ];
        let cache = ConversionCache::open(temp_dir.path().join("cache"));
        let codec = MockCodec::default();
        let pipeline = BatchPipeline::new(
            &codec,
            Some(&cache),
            PipelineOptions {
                workers: 2,
                ..PipelineOptions::default()
            },
        );
        let (tx, rx) = mpsc::channel();
        let mut sink = ChannelSink(tx);
        let out = temp_dir.path().join("out");
        let summary = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &out,
            &MappingResource::none(),
            &mut sink,
            &CancelToken::new(),
        );
        drop(sink);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(codec.calls(), 1);
        assert_eq!(rx.iter().count(), 2);
        let error = summary.results[1].error.as_deref().unwrap();
        assert!(error.contains("already produced by"), "{error}");
        assert!(error.contains("d1"), "{error}");

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("x.json")).unwrap()).unwrap();
        assert_eq!(written["SourceBytes"], 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_escaping_outputs_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut units = inputs(temp_dir.path(), &["a.uasset", "b.uasset", "c.uasset"]);
        units[0].output = Some("../escaped.json".to_string());
        units[1].output = Some(temp_dir.path().join("abs.json").display().to_string());
        units[2].output = Some("vfx/c.json".to_string());
        let codec = MockCodec::default();
        let pipeline = BatchPipeline::new(&codec, None, PipelineOptions::default());
        let out = temp_dir.path().join("out");
        let summary = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &out,
            &MappingResource::none(),
            &mut NullSink,
            &CancelToken::new(),
        );

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.exit_code(), 4);
        for result in &summary.results[..2] {
            assert!(result.error.as_deref().unwrap().contains("inside the output directory"));
        }
        assert!(summary.results[2].success);
        assert!(out.join("vfx/c.json").exists());
        assert!(!temp_dir.path().join("escaped.json").exists());
        assert!(!temp_dir.path().join("abs.json").exists());
        assert_eq!(codec.calls(), 1);
    }

    #[test]
    fn test_timeout_is_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let units = inputs(temp_dir.path(), &["slow.uasset"]);
        let codec = MockCodec {
            delay_ms: 50,
            ..MockCodec::default()
        };
        let pipeline = BatchPipeline::new(
            &codec,
            None,
            PipelineOptions {
                unit_timeout: Some(Duration::from_millis(1)),
                ..PipelineOptions::default()
            },
        );
        let summary = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            temp_dir.path(),
            &MappingResource::none(),
            &mut NullSink,
            &CancelToken::new(),
        );
        assert_eq!(summary.failed, 1);
        assert!(summary.results[0].error.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_explicit_output_names_and_convert_one() {
        let temp_dir = TempDir::new().unwrap();
        let mut units = inputs(temp_dir.path(), &["a.uasset"]);
        units[0].output = Some("1011/vfx/a.json".to_string());
        let codec = MockCodec::default();
        let pipeline = BatchPipeline::new(&codec, None, PipelineOptions::default());
        let out = temp_dir.path().join("out");
        let summary = pipeline.run(
            ConversionDirection::ToJson,
            &units,
            &out,
            &MappingResource::none(),
            &mut NullSink,
            &CancelToken::new(),
        );
        assert_eq!(summary.exit_code(), 0);
        assert!(out.join("1011/vfx/a.json").exists());

        let single = pipeline
            .convert_one(
                ConversionDirection::ToJson,
                &units[0].input,
                &temp_dir.path().join("single/a.json"),
                &MappingResource::none(),
            )
            .unwrap();
        assert!(single.success);
        let err = pipeline
            .convert_one(
                ConversionDirection::ToJson,
                &temp_dir.path().join("nope.uasset"),
                &temp_dir.path().join("nope.json"),
                &MappingResource::none(),
            )
            .unwrap_err();
        assert!(matches!(err, ConvertError::InputNotFound(_)));
    }
}
