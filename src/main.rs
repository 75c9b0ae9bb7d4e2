//! # Folio CLI
//!
//! Usage:
//!   folio library.json -o guide.pdf
//!   cat library.json | folio -o guide.pdf
//!   folio --example > library.json
//!   folio library.json --pages-only

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Lay out a documentation library as a paged PDF", long_about = None)]
struct Cli {
    /// Library JSON file (stdin if not specified)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(short, long, value_name = "FILE", default_value = "output.pdf")]
    output: PathBuf,

    /// Print a sample library and exit
    #[arg(long)]
    example: bool,

    /// Print the page count and outline instead of writing a PDF
    #[arg(long)]
    pages_only: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if cli.example {
        print!("{}", example_library_json());
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> folio::Result<()> {
    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let library = folio::parse_library(&input)?;
    let engine = folio::Engine::new();

    if cli.pages_only {
        let output = engine.layout(&library)?;
        println!("{} pages", output.pages.len());
        for entry in &output.outline {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            println!("{}{} (page {})", indent, entry.title, entry.page + 1);
        }
        return Ok(());
    }

    let pdf = engine.render(&library)?;
    fs::write(&cli.output, &pdf)?;
    let stats = engine.cache_stats();
    log::info!(
        "raster cache: {} hits, {} misses, {} entries",
        stats.hits,
        stats.misses,
        stats.entries
    );
    eprintln!("Wrote {} bytes to {}", pdf.len(), cli.output.display());
    Ok(())
}

fn example_library_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Field Guide",
    "author": "Docs Team"
  },
  "layout": {
    "page": { "size": "A4", "margin": { "top": 54, "right": 54, "bottom": 54, "left": 54 } },
    "baseFontSize": 11
  },
  "categories": [
    {
      "title": "Getting Started",
      "description": "Everything needed for a first deployment.",
      "blocks": [
        { "type": "text", "text": "This guide walks through installation and first steps." },
        { "type": "messageBox", "variant": "warning", "title": "Before you begin", "text": "Back up your configuration directory." }
      ],
      "documents": [
        {
          "title": "Installation",
          "tags": ["setup", "linux"],
          "blocks": [
            { "type": "list", "ordered": true, "items": ["Download the archive", "Unpack it", { "text": "Run the installer", "children": ["as root", "or with sudo"] }] },
            { "type": "code", "filename": "install.sh", "language": "bash", "code": "#!/bin/sh\nset -e\ntar xzf folio.tar.gz\n./install --prefix /usr/local" },
            { "type": "divider" },
            { "type": "table", "headers": ["Platform", "Supported", "Notes"], "rows": [["Linux", "yes", "x86_64 and arm64"], ["macOS", "yes", "13+"], ["Windows", "partial", "WSL only"]] }
          ]
        }
      ],
      "categories": [
        {
          "title": "Reference",
          "documents": [
            {
              "title": "Throughput",
              "blocks": [
                { "type": "chart", "chartType": "bar", "title": "Requests per second", "labels": ["v1", "v2", "v3"], "datasets": [{ "label": "p50", "values": [1200, 1850, 2400] }, { "label": "p99", "values": [900, 1400, 2100] }] },
                { "type": "math", "expression": "\\frac{requests}{seconds} \\times 100" },
                { "type": "youtube", "url": "https://youtu.be/dQw4w9WgXcQ", "title": "Benchmark walkthrough" }
              ]
            }
          ]
        }
      ]
    }
  ],
  "documents": [
    {
      "title": "Changelog",
      "blocks": [
        { "type": "title", "text": "1.2.0", "level": 2 },
        { "type": "text", "text": "Faster chart rendering and repeated table headers." }
      ]
    }
  ]
}
"##
}
