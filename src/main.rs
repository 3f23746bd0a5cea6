use std::fs::{self, File};
use std::io::{self, BufReader};

use anyhow::Context;
use cachesim::sim::config::OutputFormat;
use cachesim::sim::report::{JsonSink, ReportSink, TextSink};
use cachesim::sim::trace::TraceReader;
use cachesim::ui::{init_logging, log_level_filter, make_sim, CachesimArgs};
use clap::Parser;
use log::info;

pub fn main() -> anyhow::Result<()> {
    let argv = CachesimArgs::parse();
    init_logging(argv.log);

    let config = match &argv.config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?,
        None => String::new(),
    };
    let (sim_config, mut sim) = make_sim(&config, Some(&argv))?;
    if argv.log.is_none() && std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(log_level_filter(sim_config.log_level));
    }

    if sim_config.trace.as_os_str().is_empty() {
        anyhow::bail!("no trace file given (pass it as the first argument or set sim.trace)");
    }
    let file = File::open(&sim_config.trace)
        .with_context(|| format!("failed to open trace file {}", sim_config.trace.display()))?;
    let mut trace = TraceReader::new(BufReader::new(file));

    let stdout = io::stdout().lock();
    let mut sink: Box<dyn ReportSink> = match sim_config.format {
        OutputFormat::Text => Box::new(TextSink::new(io::BufWriter::new(stdout))),
        OutputFormat::Json => Box::new(JsonSink::new(io::BufWriter::new(stdout))),
    };
    let stats = sim.run(&mut trace, sink.as_mut())?;
    if trace.skipped() > 0 {
        info!("skipped {} malformed trace lines", trace.skipped());
    }

    if sim_config.summary {
        eprintln!("{}", stats);
    }
    if let Some(path) = &sim_config.stats_json {
        let payload = serde_json::to_string_pretty(&stats)?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write stats to {}", path.display()))?;
    }
    Ok(())
}
