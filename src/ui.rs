use crate::cache::geometry::{ConfigError, MAX_CACHE_SIZE};
use crate::sim::config::{CacheConfig, Config, OutputFormat, SimConfig};
use crate::sim::top::CacheSim;
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use toml::Table;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Set-associative LRU cache simulator")]
pub struct CachesimArgs {
    #[arg(help = "Path to the access trace")]
    pub trace_path: Option<PathBuf>,
    #[arg(help = "Cache size in KiB")]
    pub cache_size_kb: Option<u32>,
    #[arg(help = "Associativity (ways per set)")]
    pub associativity: Option<u32>,
    #[arg(help = "Block size in bytes")]
    pub block_size: Option<u32>,
    #[arg(long, help = "Path to config.toml")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Enable log at level (0:warnings, 1:info, 2:debug)")]
    pub log: Option<u64>,
    #[arg(long, help = "Result format (text, json)")]
    pub format: Option<OutputFormat>,
    #[arg(long, help = "Print a hit/miss summary to stderr")]
    pub summary: bool,
    #[arg(long, help = "Write run statistics as JSON to this path")]
    pub stats_json: Option<PathBuf>,
}

pub fn log_level_filter(level: u64) -> LevelFilter {
    match level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install env_logger. `RUST_LOG` wins when set; otherwise the level is
/// controlled through `log::set_max_level` so the config file can still
/// raise it later.
pub fn init_logging(cli_level: Option<u64>) {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Debug);
    builder.parse_default_env();
    builder.init();
    if !from_env {
        log::set_max_level(log_level_filter(cli_level.unwrap_or(0)));
    }
}

fn cache_size_from_kb(kb: u32) -> Result<u32, ConfigError> {
    let bytes = kb as u64 * 1024;
    if bytes > MAX_CACHE_SIZE as u64 {
        return Err(ConfigError::CacheTooLarge(bytes));
    }
    Ok(bytes as u32)
}

/// Resolve the run configuration from the TOML string.
/// If `cli_args` is given, override TOML options with CLI arguments.
pub fn load_config(
    toml_string: &str,
    cli_args: Option<&CachesimArgs>,
) -> anyhow::Result<(SimConfig, CacheConfig)> {
    let config_table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let mut sim_config =
        SimConfig::from_section(config_table.get("sim")).context("invalid [sim] section")?;
    let mut cache_config =
        CacheConfig::from_section(config_table.get("cache")).context("invalid [cache] section")?;

    // override toml configs with CLI args
    if let Some(args) = cli_args {
        if let Some(path) = &args.trace_path {
            sim_config.trace = path.clone();
        }
        if let Some(kb) = args.cache_size_kb {
            cache_config.size_bytes = cache_size_from_kb(kb)?;
        }
        cache_config.ways = args.associativity.unwrap_or(cache_config.ways);
        cache_config.block_bytes = args.block_size.unwrap_or(cache_config.block_bytes);
        sim_config.log_level = args.log.unwrap_or(sim_config.log_level);
        sim_config.format = args.format.unwrap_or(sim_config.format);
        sim_config.summary |= args.summary;
        if args.stats_json.is_some() {
            sim_config.stats_json = args.stats_json.clone();
        }
    }

    Ok((sim_config, cache_config))
}

/// Make a CacheSim from the TOML configuration and optional CLI overrides.
/// Geometry errors surface here, before any trace record is read.
pub fn make_sim(
    toml_string: &str,
    cli_args: Option<&CachesimArgs>,
) -> anyhow::Result<(SimConfig, CacheSim)> {
    let (sim_config, cache_config) = load_config(toml_string, cli_args)?;
    let sim = CacheSim::new(&cache_config).context("invalid cache configuration")?;
    Ok((sim_config, sim))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kb: u32, ways: u32, block: u32) -> CachesimArgs {
        CachesimArgs {
            trace_path: Some(PathBuf::from("trace.txt")),
            cache_size_kb: Some(kb),
            associativity: Some(ways),
            block_size: Some(block),
            ..CachesimArgs::default()
        }
    }

    #[test]
    fn parses_positional_geometry() {
        let argv = CachesimArgs::parse_from(["cachesim", "trace.txt", "1024", "4", "32"]);
        assert_eq!(argv.trace_path, Some(PathBuf::from("trace.txt")));
        assert_eq!(argv.cache_size_kb, Some(1024));
        assert_eq!(argv.associativity, Some(4));
        assert_eq!(argv.block_size, Some(32));
        assert!(!argv.summary);
    }

    #[test]
    fn parses_flags() {
        let argv = CachesimArgs::parse_from([
            "cachesim", "t.txt", "--format", "json", "--summary", "--log", "2",
        ]);
        assert_eq!(argv.format, Some(OutputFormat::Json));
        assert!(argv.summary);
        assert_eq!(argv.log, Some(2));
        assert_eq!(argv.cache_size_kb, None);
    }

    #[test]
    fn cli_overrides_toml() {
        let toml = "[cache]\nsize_bytes = 4096\nways = 2\nblock_bytes = 16\n[sim]\nformat = \"json\"\n";
        let (sim_config, cache_config) = load_config(toml, Some(&args(8, 1, 64))).unwrap();
        assert_eq!(sim_config.trace, PathBuf::from("trace.txt"));
        assert_eq!(sim_config.format, OutputFormat::Json);
        assert_eq!(
            cache_config,
            CacheConfig {
                size_bytes: 8192,
                ways: 1,
                block_bytes: 64
            }
        );
    }

    #[test]
    fn toml_alone_is_enough() {
        let toml = "[sim]\ntrace = \"x.trace\"\n[cache]\nsize_bytes = 1024\nways = 2\nblock_bytes = 8\n";
        let (sim_config, sim) = make_sim(toml, None).unwrap();
        assert_eq!(sim_config.trace, PathBuf::from("x.trace"));
        assert_eq!(sim.geometry().sets(), 64);
    }

    #[test]
    fn rejects_geometry_before_running() {
        // 3 KiB direct mapped with 1 KiB blocks is 3 sets
        let err = make_sim("", Some(&args(3, 1, 1024))).err().unwrap();
        assert_eq!(
            err.root_cause().downcast_ref::<ConfigError>(),
            Some(&ConfigError::SetsNotPowerOfTwo(3))
        );
        let err = make_sim("", Some(&args(4096, 1, 64))).err().unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::CacheTooLarge(4096 * 1024))
        );
    }

    #[test]
    fn accepts_geometry_with_leftover_capacity() {
        // 2 KiB, 3 ways, 256-byte blocks: 2 sets
        let (_, sim) = make_sim("", Some(&args(2, 3, 256))).unwrap();
        assert_eq!(sim.geometry().sets(), 2);
        assert_eq!(sim.geometry().ways(), 3);
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level_filter(0), LevelFilter::Warn);
        assert_eq!(log_level_filter(1), LevelFilter::Info);
        assert_eq!(log_level_filter(2), LevelFilter::Debug);
    }
}
