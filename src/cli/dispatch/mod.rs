//! Maps validated CLI matches to the action to run.

use crate::{
    api::{ListQuery, SortOrder},
    cli::{
        actions::{get, verify, Action},
        commands::{self, client},
        globals::GlobalArgs,
    },
    config::normalize_value,
};
use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let options = client::Options::parse(matches)?;

    let mut globals = GlobalArgs::new(options.base_url, options.session_file);
    globals.timeout = Duration::from_secs(options.timeout_secs);
    globals.settle_delay = Duration::from_millis(options.settle_delay_ms);
    for cookie in options.cookies {
        globals.add_cookie(cookie);
    }

    match matches.subcommand() {
        Some((commands::CMD_VERIFY, sub_m)) => {
            if let Some(route) = sub_m
                .get_one::<String>("denied-route")
                .and_then(|route| normalize_value(route))
            {
                globals.denied_route = route;
            }
            Ok(Action::Verify(verify::Args {
                globals,
                admin: sub_m.get_flag("admin"),
                roles: sub_m
                    .get_many::<String>("role")
                    .map(|roles| roles.cloned().collect())
                    .unwrap_or_default(),
                hydrate: sub_m.get_flag("hydrate"),
            }))
        }
        Some((commands::CMD_GET, sub_m)) => {
            let path = sub_m
                .get_one::<String>("path")
                .cloned()
                .context("missing required argument: <path>")?;
            let query = list_query(sub_m)?;
            Ok(Action::Get(get::Args {
                globals,
                path,
                query,
            }))
        }
        Some((commands::CMD_WHOAMI, _)) => Ok(Action::Whoami(globals)),
        Some((commands::CMD_LOGOUT, _)) => Ok(Action::Logout(globals)),
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
        None => Err(anyhow!("missing command")),
    }
}

fn list_query(matches: &clap::ArgMatches) -> Result<Option<ListQuery>> {
    let page = matches.get_one::<u32>("page").copied();
    let limit = matches.get_one::<u32>("limit").copied();
    let search = matches.get_one::<String>("search").cloned();
    let sort_by = matches.get_one::<String>("sort-by").cloned();
    let filters = matches
        .get_many::<String>("filter")
        .map(|values| values.map(|value| parse_filter(value)).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    if page.is_none() && limit.is_none() && search.is_none() && sort_by.is_none() && filters.is_empty()
    {
        return Ok(None);
    }

    let mut query = ListQuery::default();
    if let Some(page) = page {
        query = query.page(page);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(search) = search {
        query = query.search(search);
    }
    for (key, value) in filters {
        query = query.filter(key, value);
    }
    if let Some(field) = sort_by {
        let order = matches
            .get_one::<String>("order")
            .map(|order| order.parse::<SortOrder>())
            .transpose()
            .map_err(|err| anyhow!(err))?
            .unwrap_or_default();
        query = query.sort(field, order);
    }

    Ok(Some(query))
}

fn parse_filter(value: &str) -> Result<(String, String)> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid filter {value}, expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("invalid filter, empty key"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
