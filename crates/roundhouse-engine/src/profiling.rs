//! PID marker file and optional CPU profiling, both scoped to Init..Stop.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// File holding the process id while the pipeline is initialised.
#[derive(Debug)]
pub(crate) struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub(crate) fn create(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("{}\n", std::process::id()))?;
        tracing::debug!(path = %path.display(), "Wrote pid file");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn remove(self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove pid file");
        }
    }
}

/// Sampling profiler that writes a flamegraph when finished.
#[cfg(feature = "cpu-profile")]
pub(crate) struct CpuProfiler {
    guard: pprof::ProfilerGuard<'static>,
    path: PathBuf,
}

#[cfg(feature = "cpu-profile")]
impl CpuProfiler {
    const FREQUENCY_HZ: i32 = 100;

    pub(crate) fn start(path: &Path) -> Result<Self, PipelineError> {
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(Self::FREQUENCY_HZ)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(|e| PipelineError::Profiling(e.to_string()))?;
        tracing::info!(path = %path.display(), "CPU profiling started");
        Ok(Self {
            guard,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn finish(self) -> Result<(), PipelineError> {
        let report = self
            .guard
            .report()
            .build()
            .map_err(|e| PipelineError::Profiling(e.to_string()))?;
        let file = fs::File::create(&self.path)?;
        report
            .flamegraph(file)
            .map_err(|e| PipelineError::Profiling(e.to_string()))?;
        tracing::info!(path = %self.path.display(), "CPU profile written");
        Ok(())
    }
}

#[cfg(not(feature = "cpu-profile"))]
pub(crate) struct CpuProfiler;

#[cfg(not(feature = "cpu-profile"))]
impl CpuProfiler {
    pub(crate) fn start(_path: &Path) -> Result<Self, PipelineError> {
        Err(PipelineError::Profiling(
            "built without the 'cpu-profile' feature".to_string(),
        ))
    }

    #[allow(clippy::unused_self)]
    pub(crate) fn finish(self) -> Result<(), PipelineError> {
        Ok(())
    }
}
