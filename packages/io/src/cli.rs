//! Command-line interface for converting and checking map files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use lanemap_core::{GpsPoint, LaneletMap, Origin, SphericalMercatorProjector};

use crate::config::{Configuration, JOSM_FORMAT_ELEVATION, JOSM_UPLOAD};
use crate::error::Result;
use crate::map_io::MapIo;
use crate::registry::ErrorMessages;

/// Lanemap - convert and check road network maps.
#[derive(Parser)]
#[command(name = "lanemap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a map and write it in another format.
    Convert {
        /// Map to read
        input: PathBuf,

        /// File to write
        output: PathBuf,

        /// Skip bad records instead of aborting
        #[arg(short, long)]
        robust: bool,

        /// Projection origin as LAT,LON (default: 0,0)
        #[arg(long, value_parser = parse_origin)]
        origin: Option<Origin>,

        /// Input format name (default: by extension)
        #[arg(long)]
        input_format: Option<String>,

        /// Output format name (default: by extension)
        #[arg(long)]
        output_format: Option<String>,

        /// Value of the JOSM upload flag in OSM output
        #[arg(long, value_parser = ["true", "false", "never"])]
        josm_upload: Option<String>,

        /// Write OSM elevations with two decimals
        #[arg(long)]
        format_elevation: bool,
    },

    /// Load a map robustly and report what it contains.
    Check {
        /// Map to read
        input: PathBuf,

        /// Projection origin as LAT,LON (default: 0,0)
        #[arg(long, value_parser = parse_origin)]
        origin: Option<Origin>,

        /// Input format name (default: by extension)
        #[arg(long)]
        input_format: Option<String>,
    },

    /// List the registered formats.
    Formats,
}

/// Run the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            robust,
            origin,
            input_format,
            output_format,
            josm_upload,
            format_elevation,
        } => {
            let mut config = Configuration::new().with(JOSM_FORMAT_ELEVATION, format_elevation);
            if let Some(upload) = josm_upload {
                config = config.with(JOSM_UPLOAD, upload);
            }
            let io = MapIo::default().with_config(config);
            convert_command(
                &io,
                &input,
                &output,
                robust,
                origin.unwrap_or_default(),
                input_format.as_deref(),
                output_format.as_deref(),
            )
        }
        Commands::Check {
            input,
            origin,
            input_format,
        } => check_command(
            &MapIo::default(),
            &input,
            origin.unwrap_or_default(),
            input_format.as_deref(),
        ),
        Commands::Formats => {
            formats_command(&MapIo::default());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_origin(s: &str) -> std::result::Result<Origin, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{s}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{lon}'"))?;
    Ok(Origin::new(GpsPoint::new(lat, lon, 0.0)))
}

fn convert_command(
    io: &MapIo,
    input: &Path,
    output: &Path,
    robust: bool,
    origin: Origin,
    input_format: Option<&str>,
    output_format: Option<&str>,
) -> Result<ExitCode> {
    let projector = SphericalMercatorProjector::new(origin);
    let mut errors = ErrorMessages::new();

    println!(
        "{} {} to {}",
        style("Converting").bold(),
        style(input.display()).cyan(),
        style(output.display()).cyan()
    );

    let map = io.load_with_format(
        input,
        input_format,
        &projector,
        robust.then_some(&mut errors),
    )?;
    io.write_with_format(
        output,
        output_format,
        &map,
        &projector,
        robust.then_some(&mut errors),
    )?;

    print_summary(&map);
    print_errors(&errors);
    println!("{}", style("Done").green().bold());
    Ok(ExitCode::SUCCESS)
}

fn check_command(
    io: &MapIo,
    input: &Path,
    origin: Origin,
    input_format: Option<&str>,
) -> Result<ExitCode> {
    let projector = SphericalMercatorProjector::new(origin);
    let mut errors = ErrorMessages::new();
    let map = io.load_with_format(input, input_format, &projector, Some(&mut errors))?;

    println!("{} {}", style("Checked").bold(), style(input.display()).cyan());
    print_summary(&map);
    print_errors(&errors);

    if errors.is_empty() {
        println!("{}", style("No errors").green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn formats_command(io: &MapIo) {
    println!("{}", style("Registered formats").bold());
    for handler in io.handlers().iter() {
        let extension = if handler.extension.is_empty() {
            "-"
        } else {
            handler.extension.as_str()
        };
        println!(
            "  {} {:<8} parse: {:<5} write: {}",
            style(format!("{:<10}", handler.name)).cyan(),
            extension,
            handler.can_parse(),
            handler.can_write()
        );
    }
}

fn print_summary(map: &LaneletMap) {
    println!("  Points: {}", map.points.len());
    println!("  Linestrings: {}", map.line_strings.len());
    println!("  Polygons: {}", map.polygons.len());
    println!("  Lanelets: {}", map.lanelets.len());
    println!("  Regulatory elements: {}", map.regulatory_elements.len());

    let mut per_rule: BTreeMap<&str, usize> = BTreeMap::new();
    for element in map.regulatory_elements.iter() {
        let rule = element.rule_name().unwrap_or("<untyped>");
        *per_rule.entry(rule).or_default() += 1;
    }
    for (rule, count) in per_rule {
        println!("    {rule}: {count}");
    }
}

fn print_errors(errors: &ErrorMessages) {
    if errors.is_empty() {
        return;
    }
    println!(
        "  {} {}",
        style("Skipped records:").yellow().bold(),
        style(errors.len()).yellow().bold()
    );
    for error in errors {
        println!("    {} {error}", style("-").yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin() {
        let origin = parse_origin("49.0, 8.4").unwrap();
        assert_eq!(origin.position, GpsPoint::new(49.0, 8.4, 0.0));
        assert!(parse_origin("49.0").is_err());
        assert!(parse_origin("north,8.4").is_err());
    }

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "lanemap",
            "convert",
            "in.osm",
            "out.yaml",
            "--robust",
            "--origin",
            "49,8.4",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Convert { robust: true, origin: Some(_), .. }
        ));
    }
}
