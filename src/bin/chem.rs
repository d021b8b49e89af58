use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use chem_table::{
    AppConfig, AssetCache, CacheEvent, CacheOutcome, Fetcher, Field, HttpFetcher,
    TableController, format_bytes, format_elapsed, format_table,
};

fn print_usage() {
    eprintln!("Usage: chem [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>     Config file (default: {})", AppConfig::default_path().display());
    eprintln!("  --url <URL>         Data endpoint to load records from");
    eprintln!("  --cache-dir <DIR>   Root directory of the offline asset cache");
    eprintln!("  --no-cache          Bypass the offline asset cache");
    eprintln!("  --print             Print the table once and exit instead of opening the TUI");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Set RUST_LOG=info (or debug) for log output on stderr.");
}

struct Args {
    config: Option<PathBuf>,
    url: Option<String>,
    cache_dir: Option<PathBuf>,
    no_cache: bool,
    print: bool,
}

fn value_of(args: &[String], i: usize, flag: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("Error: {flag} requires a value");
        std::process::exit(1);
    })
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        url: None,
        cache_dir: None,
        no_cache: false,
        print: false,
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                parsed.config = Some(PathBuf::from(value_of(&args, i, "--config")));
            }
            "--url" => {
                i += 1;
                parsed.url = Some(value_of(&args, i, "--url"));
            }
            "--cache-dir" => {
                i += 1;
                parsed.cache_dir = Some(PathBuf::from(value_of(&args, i, "--cache-dir")));
            }
            "--no-cache" => parsed.no_cache = true,
            "--print" => parsed.print = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Error: unknown argument '{other}'");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

/// Installs the current asset cache and evicts older ones. Failures are
/// logged and the network is used directly.
async fn prepare_cache<F: Fetcher>(cache: &AssetCache<F>) {
    match cache.handle(CacheEvent::Install).await {
        Ok(CacheOutcome::Installed { assets, bytes }) => {
            log::info!("Cache {} ready: {assets} assets, {}", cache.name(), format_bytes(bytes));
        }
        Ok(_) => {}
        Err(e) => log::warn!("Asset cache install failed: {e}"),
    }
    match cache.handle(CacheEvent::Activate).await {
        Ok(CacheOutcome::Activated { evicted }) if !evicted.is_empty() => {
            log::info!("Evicted old caches: {}", evicted.join(", "));
        }
        Ok(_) => {}
        Err(e) => log::warn!("Asset cache activate failed: {e}"),
    }
}

/// Loads once and prints the table to stdout. A load failure is reported on
/// stderr and yields a failing exit code.
async fn print_table(mut table: TableController, fetcher: &dyn Fetcher) -> ExitCode {
    let start = Instant::now();
    if let Some(notice) = table.initialize(fetcher).await {
        eprintln!("{}", notice.message);
        return ExitCode::FAILURE;
    }

    let headers = Field::ALL.map(Field::label);
    let rows: Vec<Vec<String>> = table.rows().iter().map(|row| row.cells.clone()).collect();
    print!("{}", format_table(&headers, &rows));
    eprintln!(
        "{} chemicals loaded in {}",
        rows.len(),
        format_elapsed(start.elapsed())
    );
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> chem_table::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args();
    let config_path = args.config.unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_or_create(&config_path)?;
    log::info!("Loaded config from {}", config_path.display());

    if let Some(url) = args.url {
        config.source = config.source.with_url(url);
    }
    if let Some(dir) = args.cache_dir {
        config.cache = config.cache.with_root(dir);
    }
    if args.no_cache {
        config.cache = config.cache.with_enabled(false);
    }

    let network = HttpFetcher::new(&config.source)?;
    let fetcher: Arc<dyn Fetcher> = if config.cache.enabled {
        let cache = AssetCache::new(&config.cache, network);
        prepare_cache(&cache).await;
        Arc::new(cache)
    } else {
        Arc::new(network)
    };

    let table = TableController::new(&config.source.url);

    if args.print {
        return Ok(print_table(table, fetcher.as_ref()).await);
    }

    #[cfg(feature = "tui")]
    {
        chem_table::tui::run(table, fetcher).await?;
        Ok(ExitCode::SUCCESS)
    }
    #[cfg(not(feature = "tui"))]
    {
        let _ = (table, fetcher);
        eprintln!("TUI support not compiled in; use --print");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chem_table::Response;

    struct Fixed(u16, &'static str);

    #[async_trait]
    impl Fetcher for Fixed {
        async fn get(&self, _url: &str) -> chem_table::Result<Response> {
            Ok(Response::new(self.0, self.1))
        }
    }

    fn code_of(code: ExitCode) -> String {
        format!("{code:?}")
    }

    #[tokio::test]
    async fn print_failure_returns_failing_exit_code() {
        let table = TableController::new("http://localhost/data.json");
        let code = print_table(table, &Fixed(500, "")).await;
        assert_eq!(code_of(code), code_of(ExitCode::FAILURE));
    }

    #[tokio::test]
    async fn print_success_returns_success() {
        let table = TableController::new("http://localhost/data.json");
        let code = print_table(table, &Fixed(200, "[]")).await;
        assert_eq!(code_of(code), code_of(ExitCode::SUCCESS));
    }
}
