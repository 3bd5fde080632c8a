//! `trellis render` — render one configured layout to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;
use trellis_config::resolve_layout;
use trellis_engine::{RenderMode, TemplateEngine};
use trellis_template::Data;

use crate::project::load_project;
use crate::{GlobalArgs, RenderArgs};

/// Runs the `trellis render` command.
///
/// Development mode is taken from `--dev` or `engine.dev_mode`. Returns exit
/// code 0 on success; render failures are returned as errors.
pub fn run(args: &RenderArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(args, global, &mut out)?;
    Ok(0)
}

fn render_to(
    args: &RenderArgs,
    global: &GlobalArgs,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let layout = resolve_layout(&project.config, &project.root, &args.layout)?;
    let data = match args.data {
        Some(ref path) => load_data(Path::new(path))?,
        None => Data::new(),
    };

    let engine = TemplateEngine::from_config(&project.config);
    let mode = if args.dev || project.config.engine.dev_mode {
        RenderMode::Development(layout.dev_locator())
    } else {
        RenderMode::Production
    };

    if global.verbose {
        eprintln!("   Rendering {} from {}", layout.name, layout.source);
    }
    for _ in 0..args.repeat {
        engine.render(&layout.name, &layout.source, &data, out, mode)?;
    }

    if args.stats && !global.quiet {
        match engine.cache_stats() {
            Some(stats) => eprintln!(
                "   Cache: {} hit(s), {} miss(es), {} compilation(s), {} fast / {} overflow entries ({} bytes)",
                stats.hits,
                stats.misses,
                stats.compilations,
                stats.fast_entries,
                stats.overflow_entries,
                stats.overflow_bytes
            ),
            None => eprintln!("   Cache: disabled"),
        }
    }
    Ok(())
}

/// Reads render data from a JSON file whose top level must be an object.
pub fn load_data(path: &Path) -> Result<Data, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read data file {}: {e}", path.display()))?;
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(format!(
            "data file {} must contain a JSON object at the top level",
            path.display()
        )
        .into()),
    }
}
