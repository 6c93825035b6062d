//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::resolve_config(global)?;
            let toml_str = toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            })?;
            output::print_output(toml_str.trim_end(), global.quiet);

            let base_url = cfg.base_url()?;
            if !global.quiet {
                eprintln!("# effective API URL: {base_url}");
                eprintln!("# session file: {}", cfg.session_path().display());
            }
            Ok(())
        }
    }
}
