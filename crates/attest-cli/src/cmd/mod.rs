use anyhow::Result;
use tracing::info;

use attest_core::config::CoreConfig;
use attest_core::principal::Principal;
use attest_ledger_client::HttpLedgerClient;
use attest_platform_client::HttpPlatformClient;

use crate::args::{Cli, Command};

mod inspect;
mod verify;

/// Run the selected command and return the process exit code.
pub async fn dispatch(cli: Cli) -> Result<i32> {
    let cfg = crate::config::load(&cli.config)?;
    match cli.command {
        Command::Inspect(args) => inspect::run(cfg, cli.output, args).await,
        Command::Verify(args) => verify::run(cfg, cli.output, args).await,
    }
}

/// Remote collaborators for one invocation.
pub struct Backends {
    pub ledger: HttpLedgerClient,
    pub platform: HttpPlatformClient,
}

impl Backends {
    pub fn connect(cfg: &CoreConfig, principal: Option<&Principal>) -> Result<Self> {
        let ledger = match principal {
            Some(Principal::Ledger(u)) => HttpLedgerClient::for_user(u)?,
            _ => HttpLedgerClient::new(&cfg.ledger.endpoint(), None)?,
        };
        let token = principal.and_then(Principal::credential).map(str::to_string);
        let platform = HttpPlatformClient::new(&cfg.platform.base_url, token)?;

        if let Some(p) = principal {
            info!(principal = %p.label(), ledger = %ledger.base_url(), "backends ready");
        }
        Ok(Self { ledger, platform })
    }
}
