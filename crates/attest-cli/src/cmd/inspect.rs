use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use attest_core::config::CoreConfig;
use attest_core::engine::Engine;
use attest_core::model::SignerId;
use attest_core::plan::QueryParams;

use crate::args::InspectArgs;
use crate::cmd::Backends;
use crate::config;
use crate::io::fingerprint;
use crate::output::{self, OutputMode};

pub async fn run(mut cfg: CoreConfig, mode: OutputMode, args: InspectArgs) -> Result<i32> {
    let fingerprint = fingerprint::resolve(&args.target)?;

    let mut params = QueryParams::new(fingerprint);
    params.signer = args.target.signer_id.as_deref().and_then(SignerId::parse);
    params.first = args.first;
    params.last = args.last;
    params.start = args.start;
    params.end = args.end;

    let principal = config::resolve(&mut cfg, &args.ledger);
    let backends = Backends::connect(&cfg, principal.as_ref())?;
    let engine = Engine::new(&backends.ledger, &backends.platform, cfg.limits.clone());

    let pb = spinner(mode)?;
    pb.set_message(format!("querying history of {}", params.fingerprint));
    let report = engine.inspect(&params).await;
    pb.finish_and_clear();

    let report = report?;
    output::inspect(mode, &report)?;
    Ok(report.exit_code())
}

fn spinner(mode: OutputMode) -> Result<ProgressBar> {
    if mode.is_json() {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}
