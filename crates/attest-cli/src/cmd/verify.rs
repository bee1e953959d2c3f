use anyhow::Result;

use attest_core::config::CoreConfig;
use attest_core::engine::Engine;
use attest_core::model::SignerId;

use crate::args::VerifyArgs;
use crate::cmd::Backends;
use crate::config;
use crate::io::fingerprint;
use crate::output::{self, OutputMode};

pub async fn run(mut cfg: CoreConfig, mode: OutputMode, args: VerifyArgs) -> Result<i32> {
    let fingerprint = fingerprint::resolve(&args.target)?;
    let signer = args.target.signer_id.as_deref().and_then(SignerId::parse);

    let principal = config::resolve(&mut cfg, &args.ledger);
    let backends = Backends::connect(&cfg, principal.as_ref())?;
    let engine = Engine::new(&backends.ledger, &backends.platform, cfg.limits.clone());

    let outcome = engine.verify(&fingerprint, signer.as_ref()).await?;
    output::verify(mode, &outcome)?;

    let custom = args.exit_code.or(cfg.limits.default_exit_code);
    Ok(outcome.exit_code(custom))
}
