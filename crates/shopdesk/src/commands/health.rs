//! Backend readiness probe.

use std::time::Duration;

use shopdesk_api::{AdminClient, HealthCheck};

use crate::cli::{GlobalOpts, HealthArgs};
use crate::error::CliError;

pub async fn handle(
    client: &AdminClient,
    args: &HealthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.attempts == 0 {
        return Err(CliError::Validation {
            field: "attempts".into(),
            reason: "must be at least 1".into(),
        });
    }

    let check = HealthCheck {
        max_attempts: args.attempts,
        delay: Duration::from_secs(args.delay),
        timeout: Duration::from_secs(args.timeout.max(1)),
    };

    if !global.quiet {
        eprintln!("Checking {} ...", client.base_url());
    }
    let attempt = client.check_server_health(&check).await?;
    if !global.quiet {
        println!("Server ready (attempt {attempt}/{})", check.max_attempts);
    }
    Ok(())
}
