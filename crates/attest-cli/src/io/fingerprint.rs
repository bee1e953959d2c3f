use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

use attest_core::model::Fingerprint;

use crate::args::TargetArgs;

/// SHA-256 of a local file, lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint named by `--hash`, or computed from the file argument.
pub fn resolve(target: &TargetArgs) -> Result<Fingerprint> {
    let raw = match (&target.hash, &target.file) {
        (Some(_), Some(_)) => return Err(anyhow!("cannot use ARG(s) with --hash")),
        (Some(h), None) => h.clone(),
        (None, Some(path)) => sha256_file(path)?,
        (None, None) => return Err(anyhow!("no argument: pass a file or --hash")),
    };
    Ok(Fingerprint::new(&raw)?)
}
