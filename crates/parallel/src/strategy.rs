//! Parallel processing strategies

use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while setting up parallel execution
#[derive(Error, Debug)]
pub enum ParallelError {
    #[error("failed to build a {threads}-thread pool: {source}")]
    ThreadPool {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("thread count must be at least 1")]
    ZeroThreads,
}

/// Processing mode for independent work items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing on the global rayon pool
    #[default]
    Parallel,
    /// Parallel on a dedicated pool with the given number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for an optional thread count (`None` = all cores, `Some(1)` = sequential)
    pub fn from_threads(threads: Option<usize>) -> Result<Self, ParallelError> {
        match threads {
            None => Ok(ProcessingMode::Parallel),
            Some(0) => Err(ParallelError::ZeroThreads),
            Some(1) => Ok(ProcessingMode::Sequential),
            Some(n) => Ok(ProcessingMode::ParallelWith(n)),
        }
    }

    /// Number of worker threads this mode will use
    pub fn threads(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => num_cpus(),
            ProcessingMode::ParallelWith(n) => *n,
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Sequential => write!(f, "sequential"),
            ProcessingMode::Parallel => write!(f, "parallel ({} threads)", num_cpus()),
            ProcessingMode::ParallelWith(n) => write!(f, "parallel ({} threads)", n),
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(ProcessingMode::Sequential),
            "parallel" | "par" => Ok(ProcessingMode::Parallel),
            other => other
                .parse::<usize>()
                .map_err(|_| format!("unknown processing mode: {}", s))
                .and_then(|n| ProcessingMode::from_threads(Some(n)).map_err(|e| e.to_string())),
        }
    }
}

/// Strategy for fanning out independent work items
pub trait ParallelStrategy {
    /// Map a function over indices and collect results in index order.
    ///
    /// Every item is processed before this returns.
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Result<Vec<T>, ParallelError>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send;

    /// Like [`par_map`](Self::par_map) over fallible work, failing with the
    /// first error in index order once all items have finished.
    fn try_par_map<T, E, F>(&self, range: std::ops::Range<usize>, f: F) -> Result<Result<Vec<T>, E>, ParallelError>
    where
        T: Send,
        E: Send,
        F: Fn(usize) -> Result<T, E> + Sync + Send,
    {
        Ok(self.par_map(range, f)?.into_iter().collect())
    }
}

impl ParallelStrategy for ProcessingMode {
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Result<Vec<T>, ParallelError>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => Ok(range.map(f).collect()),
            ProcessingMode::Parallel => Ok(range.into_par_iter().map(f).collect()),
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*threads)
                    .build()
                    .map_err(|source| ParallelError::ThreadPool {
                        threads: *threads,
                        source,
                    })?;
                Ok(pool.install(|| range.into_par_iter().map(f).collect()))
            }
        }
    }
}

/// Get the number of available CPU cores
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}
