use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;

use crate::core::{ContigCache, ContigScheme};
use crate::merge::RangeMergeEngine;
use crate::source::{SourceRef, TextResolver};

/// Contig ordering applied to the merged stream.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum SchemeChoice {
    /// Human chromosomes in string order (chr1, chr10, chr11, ...)
    #[default]
    Lexicographic,
    /// Human chromosomes in numerical order (chr1, chr2, ..., chrX, chrY, chrM)
    Numerical,
    /// Unprefixed names in numerical order (1, 2, ..., X, Y, MT)
    Hg,
}

impl SchemeChoice {
    fn build(self) -> ContigScheme {
        match self {
            Self::Lexicographic => ContigScheme::lexicographic(),
            Self::Numerical => ContigScheme::numerical(),
            Self::Hg => ContigScheme::hg(),
        }
    }
}

/// Where the partitions come from: positional files or a JSON manifest.
#[derive(Args)]
pub struct SourceArgs {
    /// Partition files (tab-separated, optionally gzip-compressed),
    /// each sorted by chromosome and position
    pub files: Vec<PathBuf>,

    /// JSON manifest of partition references, carrying per-partition
    /// ranges, aliases and tags
    #[arg(long, conflicts_with = "files")]
    pub manifest: Option<PathBuf>,

    /// Contig ordering scheme seeding the merge
    #[arg(long, value_enum, default_value = "lexicographic")]
    pub scheme: SchemeChoice,
}

#[derive(Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Jump to CHROM:POS before streaming
    #[arg(short, long)]
    pub seek: Option<String>,

    /// Keep the synthetic progress rows in the output
    #[arg(long)]
    pub progress: bool,

    /// Comma-separated column indices to keep (0-based; chromosome and
    /// position are always kept)
    #[arg(long)]
    pub select: Option<String>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Build the partition list from positional files or a manifest.
///
/// # Errors
///
/// Returns an error when neither files nor a manifest were given, or when
/// the manifest cannot be read or parsed.
pub fn load_sources(args: &SourceArgs) -> anyhow::Result<Vec<SourceRef>> {
    if let Some(path) = &args.manifest {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open manifest {}: {e}", path.display()))?;
        let sources: Vec<SourceRef> = serde_json::from_reader(file)
            .map_err(|e| anyhow::anyhow!("malformed manifest {}: {e}", path.display()))?;
        return Ok(sources);
    }
    if args.files.is_empty() {
        anyhow::bail!("no partitions given; pass files or --manifest");
    }
    Ok(args
        .files
        .iter()
        .map(|p| SourceRef::new(p.to_string_lossy().into_owned()))
        .collect())
}

/// Build the merge engine the subcommands share.
///
/// # Errors
///
/// Returns an error when the source list is empty.
pub fn build_engine(args: &SourceArgs) -> anyhow::Result<RangeMergeEngine> {
    let sources = load_sources(args)?;
    // engine and cursors must order contigs identically, so both get the
    // same scheme
    let scheme = args.scheme.build();
    let resolver = TextResolver::with_scheme(scheme.clone());
    Ok(RangeMergeEngine::with_cache(
        sources,
        Box::new(resolver),
        ContigCache::with_scheme(scheme),
    )?)
}

fn parse_seek(spec: &str) -> anyhow::Result<(String, i64)> {
    let Some((chr, pos)) = spec.rsplit_once(':') else {
        anyhow::bail!("invalid --seek '{spec}', expected CHROM:POS");
    };
    let pos: i64 = pos
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid position in --seek '{spec}', expected CHROM:POS"))?;
    Ok((chr.to_string(), pos))
}

/// Execute the merge subcommand.
///
/// # Errors
///
/// Returns an error when a partition cannot be opened or read, or when
/// the output cannot be written.
pub fn run(args: &MergeArgs, verbose: bool) -> anyhow::Result<()> {
    let mut engine = build_engine(&args.sources)?;
    if let Some(spec) = &args.select {
        let cols = spec
            .split(',')
            .map(|c| c.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| anyhow::anyhow!("invalid --select '{spec}', expected indices like 2,3"))?;
        engine = engine.with_select(cols);
    }

    let mut out: BufWriter<Box<dyn Write>> = match &args.output {
        Some(path) => BufWriter::new(Box::new(File::create(path)?)),
        None => BufWriter::new(Box::new(std::io::stdout().lock())),
    };

    writeln!(out, "{}", engine.header()?)?;
    if let Some(spec) = &args.seek {
        let (chr, pos) = parse_seek(spec)?;
        engine.seek(&chr, pos)?;
    }

    let mut rows = 0usize;
    while let Some(row) = engine.next_row()? {
        if row.is_progress && !args.progress {
            continue;
        }
        writeln!(out, "{row}")?;
        rows += 1;
    }
    out.flush()?;

    if verbose {
        eprintln!("Merged {rows} rows");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seek() {
        assert_eq!(parse_seek("chr2:100").unwrap(), ("chr2".to_string(), 100));
        assert!(parse_seek("chr2").is_err());
        assert!(parse_seek("chr2:abc").is_err());
    }

    #[test]
    fn test_load_sources_requires_input() {
        let args = SourceArgs {
            files: Vec::new(),
            manifest: None,
            scheme: SchemeChoice::Lexicographic,
        };
        assert!(load_sources(&args).is_err());
    }
}
