//! Resource queries: `get` and `endpoints`.

use tabled::Tabled;

use shopdesk_api::{AdminClient, Endpoint, EndpointTable};

use crate::cli::{GetArgs, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Tabled, serde::Serialize)]
struct EndpointRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Path")]
    path: &'static str,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn get(
    client: &AdminClient,
    args: GetArgs,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let endpoint = match args.id.as_deref() {
        Some(id) if !args.endpoint.starts_with('/') => Endpoint::WithId(&args.endpoint, id),
        _ => Endpoint::from(args.endpoint.as_str()),
    };

    let params = query_params(&args, config);
    let query: Vec<(&str, String)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();

    let body = client.get(endpoint, &query).await?;
    let out = output::render_value(global.output, &body);
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Pagination first, then `--param` pairs in the order given.
fn query_params(args: &GetArgs, config: &Config) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(args.params.len() + 2);
    if args.page.is_some() || args.limit.is_some() {
        params.push(("page".to_owned(), args.page.unwrap_or(1).to_string()));
        params.push(("limit".to_owned(), config.page_size(args.limit).to_string()));
    }
    params.extend(args.params.iter().cloned());
    params
}

pub fn endpoints(global: &GlobalOpts) {
    let table = EndpointTable::standard();
    let rows: Vec<EndpointRow> = table
        .names()
        .into_iter()
        .filter_map(|name| {
            table
                .template(name)
                .map(|path| EndpointRow { name, path })
        })
        .collect();

    let out = output::render_list(global.output, &rows, |r| *r);
    output::print_output(&out, global.quiet);
}
