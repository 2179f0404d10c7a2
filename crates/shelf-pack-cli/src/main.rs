use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use shelf_pack_core::config::SortOrder;
use shelf_pack_core::{
    data_layout_to_json, generate_layout, generate_layout_unique, layout_to_json, to_json,
    BatchOptions, BinRequest, LayoutItem, LayoutOptions, PackerOptions, ShelfPack,
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "shelf-pack",
    about = "Pack rectangles onto shelves and compute sprite layouts",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a JSON array of rectangles and print the packer state
    Pack(PackArgs),
    /// Compute a sprite layout from a JSON array of items
    Layout(LayoutArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input JSON file: `[{ "id"?, "w"|"width", "h"|"height" }, ...]`
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output file (stdout if omitted)
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// YAML config file path (overrides the layout options below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    /// Canvas width
    #[arg(long, default_value_t = 64, help_heading = "Layout")]
    width: u32,
    /// Canvas height
    #[arg(long, default_value_t = 64, help_heading = "Layout")]
    height: u32,
    /// Grow the canvas on demand (and shrink it to fit afterwards)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    auto_resize: bool,
    /// Sort order: height_desc|none
    #[arg(long = "sort", alias = "sort-order", default_value = "none", help_heading = "Layout")]
    sort_order: String,

    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    /// Input JSON file: `[{ "id", "width", "height", "signature"?, "content"?, "stretchX"?, "stretchY"?, "placeholder"? }, ...]`
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output file (stdout if omitted)
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// Pixel ratio recorded in the layout
    #[arg(long, default_value_t = 1, help_heading = "Layout")]
    pixel_ratio: u32,
    /// Sort order: height_desc|none
    #[arg(long = "sort", alias = "sort-order", default_value = "height_desc", help_heading = "Layout")]
    sort_order: String,
    /// Pack items with the same signature only once
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    unique: bool,
    /// Largest allowed item side in pixels
    #[arg(long, help_heading = "Layout")]
    max_item_size: Option<u32>,
    /// Drop items larger than --max-item-size instead of failing
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    remove_oversized: bool,
    /// Omit content/stretch/placeholder metadata from the output
    #[arg(long, default_value_t = false, help_heading = "Export")]
    no_metadata: bool,
    /// Output format: data (keyed by id) | sprite (sheet size + item list)
    #[arg(long, default_value = "data", value_parser = ["data", "sprite"], help_heading = "Export")]
    format: String,
}

/// Effective configuration of the `pack` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PackConfig {
    width: u32,
    height: u32,
    packer: PackerOptions,
    sort_order: SortOrder,
}

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    width: Option<u32>,
    height: Option<u32>,
    auto_resize: Option<bool>,
    sort_order: Option<String>,
}

impl YamlConfig {
    fn into_pack_config(self, mut cfg: PackConfig) -> PackConfig {
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.auto_resize {
            cfg.packer.auto_resize = v;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = v.parse().unwrap_or(cfg.sort_order);
        }
        cfg
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Layout(args) => run_layout(args),
    }
}

fn run_pack(args: &PackArgs) -> anyhow::Result<()> {
    let base = PackConfig {
        width: args.width,
        height: args.height,
        packer: PackerOptions::builder().auto_resize(args.auto_resize).build(),
        sort_order: parse_sort_order(&args.sort_order)?,
    };
    let cfg = if let Some(path) = &args.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.into_pack_config(base)
    } else {
        base
    };

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let mut requests: Vec<BinRequest> = read_json(&args.input)?;
    info!(count = requests.len(), "loaded requests");
    if cfg.sort_order == SortOrder::HeightDesc {
        requests.sort_by(|a, b| b.h.cmp(&a.h).then_with(|| a.id.cmp(&b.id)));
    }

    let mut sprite = ShelfPack::new(cfg.width, cfg.height, cfg.packer.clone())?;
    let placed = sprite.pack(&mut requests, BatchOptions { in_place: true })?;
    let skipped = requests.len() - requests.iter().filter(|r| r.x.is_some()).count();
    if skipped > 0 {
        warn!(skipped, "some requests did not fit");
    }
    let stats = sprite.pack_stats();
    info!(
        placed = placed.len(),
        auto_resize = sprite.options().auto_resize,
        "{}",
        stats.summary()
    );

    let value = serde_json::json!({
        "packer": to_json(&sprite),
        "requests": requests,
        "stats": stats,
    });
    write_json(args.out.as_deref(), &value)
}

fn run_layout(args: &LayoutArgs) -> anyhow::Result<()> {
    let opts = LayoutOptions {
        pixel_ratio: args.pixel_ratio,
        sort_order: parse_sort_order(&args.sort_order)?,
        max_item_size: args.max_item_size,
        remove_oversized: args.remove_oversized,
        keep_metadata: !args.no_metadata,
    };
    let items: Vec<LayoutItem> = read_json(&args.input)?;
    info!(count = items.len(), unique = args.unique, "loaded layout items");

    let layout = if args.unique {
        generate_layout_unique(&items, &opts)?
    } else {
        generate_layout(&items, &opts)?
    };
    info!(
        width = layout.width,
        height = layout.height,
        items = layout.items.len(),
        "layout computed"
    );

    let value = match args.format.as_str() {
        "sprite" => layout_to_json(&layout),
        _ => data_layout_to_json(&layout.to_data_layout()),
    };
    write_json(args.out.as_deref(), &value)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

fn write_json(out: Option<&Path>, value: &serde_json::Value) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create out dir {}", dir.display()))?;
            }
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            debug!(?path, "output written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
