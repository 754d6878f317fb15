//! Heron CLI
//!
//! Headless layout runner for testing and debugging: loads a document,
//! runs a flow layout pass at the given width, and prints the parsed
//! tree, the diagnostics, and the resulting fragments (or the fragments
//! alone as JSON).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;

use heron_engine::{Document, ImageCache};
use heron_markup::print_tree;
use heron_style::{ApproximateFontMetrics, FragmentKind, LayoutOptions};

/// Headless layout runner for the Heron renderer.
#[derive(Parser)]
#[command(name = "heron", version, about)]
struct Args {
    /// Document to load and lay out.
    input: PathBuf,

    /// Available width in pixels.
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Default text size in pixels.
    #[arg(long, default_value_t = 16.0)]
    text_size: f32,

    /// Emit the fragment sequence as JSON instead of the readable dump.
    #[arg(long)]
    json: bool,

    /// Also print the parsed node tree.
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let path = args.input.display().to_string();

    let mut document = match Document::load(&path) {
        Ok(document) => document,
        Err(error) => {
            eprintln!("{} {error}", "error:".red());
            // Host applications key off the numeric outcome code.
            let code = u8::try_from(error.outcome_code().unsigned_abs()).unwrap_or(1);
            return Ok(ExitCode::from(code));
        }
    };

    let images = ImageCache::new(
        args.input
            .parent()
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
    );
    let options = LayoutOptions {
        width: args.width,
        text_size: args.text_size,
        ..LayoutOptions::default()
    };
    document.layout(&options, &ApproximateFontMetrics, &images, false);

    if args.json {
        let json = serde_json::to_string_pretty(document.fragments())
            .context("failed to serialize fragments")?;
        println!("{json}");
        return Ok(ExitCode::SUCCESS);
    }

    if args.tree {
        println!("{}", "=== Node Tree ===".bold());
        print_tree(&document.tree);
        println!();
    }

    if !document.diagnostics.is_empty() {
        println!("{}", "=== Diagnostics ===".bold());
        for diagnostic in &document.diagnostics {
            println!("  {}", diagnostic.yellow());
        }
        println!();
    }

    println!("{}", "=== Fragments ===".bold());
    for fragment in document.fragments() {
        let bounds = fragment.bounds;
        let location = format!(
            "({:.1}, {:.1})-({:.1}, {:.1})",
            bounds.left, bounds.top, bounds.right, bounds.bottom
        );
        match &fragment.kind {
            FragmentKind::Block => {
                println!("  {} {location}", "box".blue());
            }
            FragmentKind::Text { text, .. } => {
                println!("  {} {location} {text:?}", "text".green());
            }
            FragmentKind::Image { logical_width, logical_height, .. } => {
                println!(
                    "  {} {location} {logical_width:.0}x{logical_height:.0}",
                    "image".magenta()
                );
            }
            FragmentKind::Link { href, .. } => {
                println!("  {} {location} -> {href}", "link".cyan());
            }
        }
    }

    let (width, height) = document.occupied();
    println!("\noccupied: {width:.1} x {height:.1}");

    Ok(ExitCode::SUCCESS)
}
