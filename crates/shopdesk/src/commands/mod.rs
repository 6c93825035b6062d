//! Command dispatch: bridges CLI args -> `AdminClient` calls -> output.

pub mod auth;
pub mod config_cmd;
pub mod health;
pub mod resource;

use shopdesk_api::AdminClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    client: &AdminClient,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(client, args, global).await,
        Command::Logout => auth::logout(client, global).await,
        Command::Whoami => auth::whoami(client, global),
        Command::Verify => auth::verify(client, global).await,
        Command::Can(args) => auth::can(client, &args, global),
        Command::Health(args) => health::handle(client, &args, global).await,
        Command::Get(args) => resource::get(client, args, config, global).await,
        // Handled before a client is built
        Command::Endpoints | Command::Config(_) => unreachable!(),
    }
}
