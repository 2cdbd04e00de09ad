//! Hosts one KidPaint studio.
//!
//! ```text
//! kidpaint-server --mode draw-and-guess --name "Art Club" --round-secs 45
//! RUST_LOG=debug kidpaint-server --config studio.json --no-discovery
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use kidpaint::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Command line arguments. Studio settings left unset fall back to the
/// config file, then to the built-in defaults.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// TCP port for studio connections
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind both sockets to
    #[clap(long, default_value = "0.0.0.0")]
    host: String,

    /// Studio name shown to discovering clients [default: KidPaint Studio]
    #[clap(short, long)]
    name: Option<String>,

    /// Canvas edge length in cells [default: 50]
    #[clap(short, long)]
    size: Option<usize>,

    /// Game mode [default: draw-together]
    #[clap(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Seconds per Draw & Guess round [default: 60]
    #[clap(long)]
    round_secs: Option<u32>,

    /// UDP port for discovery probes
    #[clap(long, default_value_t = DISCOVERY_PORT)]
    discovery_port: u16,

    /// Don't answer discovery probes
    #[clap(long)]
    no_discovery: bool,

    /// JSON studio config file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    DrawTogether,
    DrawAndGuess,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::DrawTogether => GameMode::DrawTogether,
            ModeArg::DrawAndGuess => GameMode::DrawAndGuess,
        }
    }
}

/// Startup failures that happen before the server exists.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();
    let config = studio_config(&args)?;
    config.validate()?;

    let mut builder = KidPaintServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .config(config.clone());
    builder = if args.no_discovery {
        builder.no_discovery()
    } else {
        builder.discovery_bind(&format!("{}:{}", args.host, args.discovery_port))
    };

    let server = builder.build().await?;
    tracing::info!(
        studio = %config.name,
        mode = %config.mode,
        canvas = config.canvas_size,
        addr = %server.local_addr()?,
        discovery = ?server.discovery_addr(),
        "studio open"
    );

    server.run().await?;
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` overrides the default
/// `info` level.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true).compact())
        .init();
}

/// Defaults, then the config file, then CLI flags.
fn studio_config(args: &Args) -> Result<StudioConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => StudioConfig::default(),
    };

    if let Some(name) = &args.name {
        config.name = name.clone();
    }
    if let Some(size) = args.size {
        config.canvas_size = size;
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(secs) = args.round_secs {
        config.round_secs = secs;
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<StudioConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kidpaint-server").chain(argv.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, 12345);
        assert_eq!(args.discovery_port, 12346);
        assert!(!args.no_discovery);

        let config = studio_config(&args).unwrap();
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--name",
            "Art Club",
            "--size",
            "32",
            "--mode",
            "draw-and-guess",
            "--round-secs",
            "45",
            "--no-discovery",
        ]);
        assert!(args.no_discovery);

        let config = studio_config(&args).unwrap();
        assert_eq!(config.name, "Art Club");
        assert_eq!(config.canvas_size, 32);
        assert_eq!(config.mode, GameMode::DrawAndGuess);
        assert_eq!(config.round_secs, 45);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = Args::try_parse_from(["kidpaint-server", "--mode", "battle-royale"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_apply_on_top_of_config_file() {
        let path = std::env::temp_dir().join(format!(
            "kidpaint-config-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"name": "From File", "mode": "draw-and-guess", "words": ["KITE"]}"#,
        )
        .unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--name", "From Flag"]);
        let config = studio_config(&args).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.name, "From Flag");
        assert_eq!(config.mode, GameMode::DrawAndGuess);
        assert_eq!(config.words, vec!["KITE"]);
        assert_eq!(config.canvas_size, 50);
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let args = parse(&["--config", "/definitely/not/here.json"]);
        assert!(matches!(
            studio_config(&args),
            Err(CliError::ReadConfig { .. })
        ));
    }
}
