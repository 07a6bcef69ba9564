//! Tracing bootstrap for the smoke binary.
//!
//! The filter comes from the first non-blank, parseable variable among
//! `RUST_LOG`, `MATRIX_RPC_SMOKE_LOG` and `MATRIX_RPC_LOG`, else
//! [`DEFAULT_FILTER`].

use std::env;

use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,rpc_smoke=debug,rpc_core=debug,rpc_matrix=debug";
const FILTER_KEYS: [&str; 3] = ["RUST_LOG", "MATRIX_RPC_SMOKE_LOG", "MATRIX_RPC_LOG"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterSource {
    Var(&'static str),
    Default,
}

pub fn init() {
    let (filter, source) = select_filter(|key| env::var(key).ok());
    let installed = tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_env_filter(filter)
        .try_init()
        .is_ok();
    if installed {
        debug!(?source, "tracing initialised");
    }
}

fn select_filter<F>(mut lookup: F) -> (EnvFilter, FilterSource)
where
    F: FnMut(&str) -> Option<String>,
{
    for key in FILTER_KEYS {
        let Some(directives) = lookup(key).filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        match EnvFilter::try_new(&directives) {
            Ok(filter) => return (filter, FilterSource::Var(key)),
            // No subscriber exists yet.
            Err(err) => eprintln!("rpc-smoke: ignoring {key}={directives:?}: {err}"),
        }
    }
    (EnvFilter::new(DEFAULT_FILTER), FilterSource::Default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source_for(pairs: &[(&str, &str)]) -> FilterSource {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        select_filter(|key| map.get(key).cloned()).1
    }

    #[test]
    fn falls_back_to_default_filter() {
        assert_eq!(source_for(&[]), FilterSource::Default);
        assert_eq!(source_for(&[("MATRIX_RPC_LOG", "  ")]), FilterSource::Default);
    }

    #[test]
    fn rust_log_takes_precedence() {
        let source = source_for(&[
            ("RUST_LOG", "warn"),
            ("MATRIX_RPC_SMOKE_LOG", "trace"),
            ("MATRIX_RPC_LOG", "debug"),
        ]);
        assert_eq!(source, FilterSource::Var("RUST_LOG"));
    }

    #[test]
    fn smoke_variable_beats_shared_one() {
        let source = source_for(&[("MATRIX_RPC_SMOKE_LOG", "trace"), ("MATRIX_RPC_LOG", "debug")]);
        assert_eq!(source, FilterSource::Var("MATRIX_RPC_SMOKE_LOG"));
    }

    #[test]
    fn unparseable_directives_are_skipped() {
        let source = source_for(&[("RUST_LOG", "rpc_core=loudest"), ("MATRIX_RPC_LOG", "debug")]);
        assert_eq!(source, FilterSource::Var("MATRIX_RPC_LOG"));
    }
}
