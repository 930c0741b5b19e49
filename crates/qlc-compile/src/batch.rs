//! Compilation of several scales in parallel.

use std::collections::BTreeMap;

use qlc_circuit::Circuit;
use qlc_core::{ErrorInfo, QlcError};
use rayon::prelude::*;
use tracing::info;

use crate::config::CompileConfig;
use crate::detectors::DetectorEngine;
use crate::tree::LayerTree;

/// Compiles one fresh tree per value of `ks` on a rayon pool.
///
/// All compilations share `engine`, so situations found at one scale are
/// reused by the others. Duplicated values of `k` are compiled once.
pub fn compile_many<F>(
    tree_factory: F,
    ks: &[u32],
    config: &CompileConfig,
    engine: &DetectorEngine,
) -> Result<BTreeMap<u32, Circuit>, QlcError>
where
    F: Fn() -> Result<LayerTree, QlcError> + Sync,
{
    config.validate()?;
    let mut ks = ks.to_vec();
    ks.sort_unstable();
    ks.dedup();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.threads > 0 {
        builder = builder.num_threads(config.threads);
    }
    let pool = builder.build().map_err(|err| {
        QlcError::Construction(
            ErrorInfo::new("thread-pool", err.to_string())
                .with_context("threads", config.threads.to_string()),
        )
    })?;
    info!(scales = ks.len(), threads = pool.current_num_threads(), "compiling scales");

    let circuits: Result<Vec<(u32, Circuit)>, QlcError> = pool.install(|| {
        ks.par_iter()
            .map(|k| {
                let mut tree = tree_factory()?;
                Ok((*k, tree.generate_circuit(*k, config, engine)?))
            })
            .collect()
    });
    Ok(circuits?.into_iter().collect())
}
