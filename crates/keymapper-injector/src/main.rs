//! keymapper injector: entry point.
//!
//! Prepares one virtual device for injection: resolves every target symbol of
//! a preset to a keycode, writes the XKB files for symbols the system layout
//! lacks, and applies them to that device with `setxkbmap`.
//!
//! # Usage
//!
//! ```text
//! keymapper-injector [--config <PATH>] prepare \
//!     --device /dev/input/event12 --name "my preset" \
//!     --map 30=odiaeresis --map 31=EuroSign --map 32='k(a).k(b)' [--wait] [--dry-run]
//!
//! keymapper-injector keycodes
//! ```
//!
//! `prepare` prints one `<source> <keycode>` line per remapped key, which is
//! what the injection loop emits for that source key.
//!
//! # Environment variable overrides
//!
//! | Variable                | Description                             |
//! |-------------------------|-----------------------------------------|
//! | `KEYMAPPER_CONFIG`      | Config file path                        |
//! | `KEYMAPPER_BASE_LOCALE` | Layout included by generated symbols    |
//! | `KEYMAPPER_XKB_ROOT`    | XKB data directory                      |
//! | `RUST_LOG`              | Log filter, overrides `general.log_level` |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keymapper_core::{
    xkb::keycodes::render_keycodes_table, KeycodeRegistry, SourceCode, SystemMapping,
};
use keymapper_injector::application::prepare::{
    PrepareDeviceUseCase, PrepareRequest, PreparedDevice,
};
use keymapper_injector::application::xkb::{ArtifactStore, LayoutSwitcher, XkbSettings};
use keymapper_injector::infrastructure::{
    config::{load_config, load_config_from, XkbConfig},
    fs_store::FsArtifactStore,
    mock::{MemoryArtifactStore, MockLayoutSwitcher},
    setxkbmap::SetxkbmapSwitcher,
    xmodmap::XmodmapReader,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Device-scoped XKB layouts for keymapper injection.
#[derive(Debug, Parser)]
#[command(name = "keymapper-injector", version, about)]
struct Cli {
    /// Config file to use instead of ~/.config/keymapper/config.toml.
    #[arg(long, env = "KEYMAPPER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Allocate keycodes for a preset and apply its layout to one device.
    Prepare(PrepareArgs),
    /// Print the identity keycodes table referenced by every applied layout.
    Keycodes,
}

#[derive(Debug, Args)]
struct PrepareArgs {
    /// evdev node of the virtual device, e.g. /dev/input/event12.
    #[arg(long)]
    device: PathBuf,

    /// Preset name; whitespace is replaced in the symbols file name.
    #[arg(long)]
    name: String,

    /// Remapping of a source keycode to a symbol or macro.
    #[arg(long = "map", value_name = "SOURCE=TARGET", value_parser = parse_mapping)]
    mappings: Vec<(SourceCode, String)>,

    /// Layout the generated symbols include.
    #[arg(long, env = "KEYMAPPER_BASE_LOCALE")]
    base_locale: Option<String>,

    /// XKB data directory.
    #[arg(long, env = "KEYMAPPER_XKB_ROOT")]
    xkb_root: Option<PathBuf>,

    /// Wait for setxkbmap and fail if it does.
    #[arg(long)]
    wait: bool,

    /// Print the files and commands instead of writing and running them.
    #[arg(long)]
    dry_run: bool,
}

/// Parses `SOURCE=TARGET`, e.g. `30=odiaeresis`.
fn parse_mapping(s: &str) -> Result<(SourceCode, String), String> {
    let (source, target) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCE=TARGET, got {s:?}"))?;
    let source = source
        .trim()
        .parse()
        .map_err(|e| format!("invalid source keycode {source:?}: {e}"))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(format!("empty target in {s:?}"));
    }
    Ok((source, target.to_string()))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("failed to load configuration")?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Prepare(args) => prepare(args, config.xkb).await,
        Commands::Keycodes => {
            print!("{}", render_keycodes_table());
            Ok(())
        }
    }
}

async fn prepare(args: PrepareArgs, mut xkb: XkbConfig) -> anyhow::Result<()> {
    if let Some(locale) = args.base_locale {
        xkb.base_locale = locale;
    }
    if let Some(root) = args.xkb_root {
        xkb.xkb_root = root;
    }
    let settings = XkbSettings::from(&xkb);

    let registry: Arc<dyn KeycodeRegistry> =
        Arc::new(match XmodmapReader::new(xkb.xmodmap.as_str()).system_mapping() {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("could not read the system keycodes, assuming an empty layout: {e}");
                SystemMapping::new()
            }
        });

    let request = PrepareRequest {
        session_name: args.name,
        device_path: args.device,
        mapping: args.mappings,
    };

    if args.dry_run {
        let store = Arc::new(MemoryArtifactStore::new());
        let switcher = Arc::new(MockLayoutSwitcher::new());
        let use_case = PrepareDeviceUseCase::new(
            registry,
            Arc::clone(&store) as Arc<dyn ArtifactStore>,
            Arc::clone(&switcher) as Arc<dyn LayoutSwitcher>,
            settings,
        );
        let prepared = use_case.prepare(request).context("failed to prepare device")?;
        print_key_codes(&prepared);

        for (path, contents) in store.snapshot() {
            println!("# {}", xkb.xkb_root.join(path).display());
            print!("{contents}");
        }
        for command in switcher.recorded() {
            println!("# {} {}", xkb.setxkbmap, command);
        }
        return Ok(());
    }

    let use_case = PrepareDeviceUseCase::new(
        registry,
        Arc::new(FsArtifactStore::new(xkb.xkb_root.clone())),
        Arc::new(SetxkbmapSwitcher::new(xkb.setxkbmap.clone())),
        settings,
    );
    let prepared = use_case.prepare(request).context("failed to prepare device")?;
    print_key_codes(&prepared);

    match (prepared.switch, args.wait) {
        (Some(handle), true) => {
            let outcome = handle.wait().await.context("setxkbmap did not finish")?;
            if !outcome.success() {
                anyhow::bail!("setxkbmap exited with {:?}", outcome.exit_code);
            }
            info!("layout applied to {}", prepared.context.device_path().display());
        }
        (Some(_), false) => info!("layout switch started"),
        (None, _) => info!("no device layout applied"),
    }
    Ok(())
}

fn print_key_codes(prepared: &PreparedDevice) {
    if let Some(name) = &prepared.symbols_name {
        info!("symbols \"{name}\" generated");
    }
    for (source, code) in prepared.context.key_to_code() {
        println!("{source} {code}");
    }
    for (source, definition) in prepared.context.macros() {
        println!("{source} {definition}");
    }
}
