use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::catalog::ambiguity::{check_ambiguity, AmbiguityReport};
use crate::catalog::store::{BarcodeCatalog, CatalogError};
use crate::cli::OutputFormat;
use crate::parsing::sample_sheet::{self, ResolvedSample, SampleSheetError};

#[derive(Args)]
pub struct CheckArgs {
    /// Barcode file: `name,sequence` per line
    #[arg(short = 'b', long, required = true)]
    pub barcodes: PathBuf,

    /// Sample sheet to resolve against the barcodes
    #[arg(short = 's', long)]
    pub sample_sheet: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct JsonCollision<'a> {
    sequence: &'a str,
    count: usize,
    barcodes: &'a [String],
}

#[derive(Serialize)]
struct JsonSample<'a> {
    #[serde(flatten)]
    sample: &'a ResolvedSample,
    forward_sequences: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reverse_sequences: Option<usize>,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    barcodes: usize,
    ambiguous: bool,
    collisions: Vec<JsonCollision<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<Vec<JsonSample<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_collisions: Option<Vec<JsonCollision<'a>>>,
}

/// Execute check subcommand
///
/// The report is printed before an ambiguous barcode set is turned into an error,
/// so the collisions are always visible.
///
/// # Errors
///
/// Returns an error if the barcode file or sample sheet is invalid,
/// `CatalogError::Ambiguous` if any sequence is shared between barcodes, or
/// `SampleSheetError::OverlappingSamples` if resolved samples share a barcode.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let catalog = BarcodeCatalog::load(&args.barcodes)?;
    let report = check_ambiguity(&catalog)?;

    let samples = match &args.sample_sheet {
        Some(path) => {
            let entries = sample_sheet::load(path)?;
            Some(sample_sheet::resolve(&entries, &catalog)?)
        }
        None => None,
    };

    let overlap = samples.as_deref().map(sample_sheet::check_sample_overlap);
    let resolved = samples.as_deref().zip(overlap.as_ref());

    match args.format {
        OutputFormat::Text => print_text(&catalog, &report, resolved),
        OutputFormat::Json => print_json(&catalog, &report, resolved)?,
        OutputFormat::Tsv => print_tsv(&report, resolved),
    }

    if !report.is_empty() {
        return Err(CatalogError::Ambiguous {
            count: report.len(),
        }
        .into());
    }
    if let Some(overlap) = overlap.filter(|o| !o.is_empty()) {
        return Err(SampleSheetError::OverlappingSamples {
            count: overlap.len(),
        }
        .into());
    }
    Ok(())
}

fn collisions(report: &AmbiguityReport) -> Vec<JsonCollision<'_>> {
    report
        .collisions
        .iter()
        .map(|(sequence, names)| JsonCollision {
            sequence,
            count: names.len(),
            barcodes: names,
        })
        .collect()
}

fn print_text(
    catalog: &BarcodeCatalog,
    report: &AmbiguityReport,
    resolved: Option<(&[ResolvedSample], &AmbiguityReport)>,
) {
    println!("Barcodes: {}", catalog.len());

    if report.is_empty() {
        println!("No ambiguous sequences");
    } else {
        println!("Ambiguous sequences: {}", report.len());
        for (sequence, names) in &report.collisions {
            println!("  {sequence} ({}): {}", names.len(), names.join(", "));
        }
    }

    if let Some((samples, overlap)) = resolved {
        println!();
        println!("Samples: {}", samples.len());
        for sample in samples {
            print!(
                "  {}: forward {} ({} sequences)",
                sample.name,
                sample.forward_barcodes,
                sample.forward.len()
            );
            if let (Some(barcodes), Some(set)) = (&sample.reverse_barcodes, &sample.reverse) {
                print!(", reverse {barcodes} ({} sequences)", set.len());
            }
            println!();
        }
        if !overlap.is_empty() {
            println!("Barcodes shared between samples: {}", overlap.len());
            for (sequence, names) in &overlap.collisions {
                println!("  {sequence} ({}): {}", names.len(), names.join(", "));
            }
        }
    }
}

fn print_json(
    catalog: &BarcodeCatalog,
    report: &AmbiguityReport,
    resolved: Option<(&[ResolvedSample], &AmbiguityReport)>,
) -> anyhow::Result<()> {
    let output = JsonCheck {
        barcodes: catalog.len(),
        ambiguous: !report.is_empty(),
        collisions: collisions(report),
        samples: resolved.map(|(samples, _)| {
            samples
                .iter()
                .map(|sample| JsonSample {
                    sample,
                    forward_sequences: sample.forward.len(),
                    reverse_sequences: sample.reverse.as_ref().map(|r| r.len()),
                })
                .collect()
        }),
        sample_collisions: resolved.map(|(_, overlap)| collisions(overlap)),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(report: &AmbiguityReport, resolved: Option<(&[ResolvedSample], &AmbiguityReport)>) {
    println!("sequence\tcount\tbarcodes");
    print!("{report}");

    if let Some((samples, overlap)) = resolved {
        println!();
        println!("sample\tforward_barcodes\treverse_barcodes\tforward_sequences\treverse_sequences");
        for sample in samples {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                sample.name,
                sample.forward_barcodes,
                sample.reverse_barcodes.as_deref().unwrap_or("-"),
                sample.forward.len(),
                sample.reverse.as_ref().map_or(0, |r| r.len())
            );
        }
        if !overlap.is_empty() {
            println!();
            println!("sequence\tcount\tsamples");
            print!("{overlap}");
        }
    }
}
