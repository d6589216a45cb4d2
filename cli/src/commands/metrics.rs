use anyhow::Result;

pub fn run(cli: &crate::cli::Cli) -> Result<()> {
    let (config, _) = super::load_config(cli)?;

    for source in &config.sources {
        for metric in &source.metrics {
            println!("{metric}\t{}", source.path);
        }
    }

    Ok(())
}
