use std::path::PathBuf;

use anyhow::{Context, Result};
use countymap::{Applied, RenderSession};

use crate::cli::{OutputFormat, RenderArgs};

pub fn run(cli: &crate::cli::Cli, args: &RenderArgs) -> Result<()> {
    let (config, reader) = super::load_config(cli)?;

    tracing::info!(geography = %config.geography, "[render] loading county shapes");
    let mut session = if args.eager {
        let (session, failed) = RenderSession::open_eager(config, reader)
            .context("[render] county shapes could not be loaded; there is no map to draw")?;
        for error in failed {
            eprintln!("[render] warning: {error}");
        }
        session
    } else {
        RenderSession::open(config, reader)
            .context("[render] county shapes could not be loaded; there is no map to draw")?
    };

    match session.show(&args.metric)? {
        Applied::Rendered(summary) => tracing::info!(
            metric = %args.metric,
            colored = summary.colored,
            invalid = summary.invalid,
            unmatched = summary.unmatched,
            "[render] painted counties"
        ),
        Applied::Degraded(error) => eprintln!("[render] warning: {error}; drawing {} as no data", args.metric),
        Applied::Stale => {}
    }

    let default_out = match args.format {
        OutputFormat::Svg => "./map.svg",
        OutputFormat::Geojson => "./map.geojson",
    };
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from(default_out));

    println!("[render] writing {} to {}", args.metric, out_path.display());
    match args.format {
        OutputFormat::Svg => session.to_svg_with_size(&out_path, args.width, 10)?,
        OutputFormat::Geojson => session.write_geojson(&out_path)?,
    }

    Ok(())
}
