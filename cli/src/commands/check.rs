use std::collections::BTreeSet;

use anyhow::{Context, Result};
use countymap::{compute_domain, normalize, RenderSession};

pub fn run(cli: &crate::cli::Cli) -> Result<()> {
    let (config, reader) = super::load_config(cli)?;
    let (session, failed) = RenderSession::open_eager(config, reader)
        .context("[check] county shapes could not be loaded")?;

    for error in &failed {
        println!("[check] source failed: {error}");
    }

    let config = session.config();
    let index = session.index();

    let mut feature_keys = BTreeSet::new();
    for feature in &session.features().features {
        let name = feature.name(&config.name_properties).unwrap_or("");
        let key = normalize(name);
        if key.is_empty() {
            println!("[check] feature without a usable name: {name:?}");
        } else if !index.contains_key(&key) {
            println!("[check] no table row for feature {name:?} (key '{key}')");
        }
        feature_keys.insert(key);
    }

    for key in index.keys() {
        if !feature_keys.contains(key) {
            println!("[check] table rows for '{key}' match no feature");
        }
    }

    if index.skipped_rows() > 0 {
        println!("[check] {} table rows had no usable county name", index.skipped_rows());
    }

    for metric in config.metrics() {
        match compute_domain(index, metric) {
            Some(domain) => println!(
                "[check] {metric}: [{:.1}, {:.1}], {} invalid cells",
                domain.min, domain.max, index.invalid_count(metric),
            ),
            None => println!("[check] {metric}: no data"),
        }
    }

    Ok(())
}
