use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mpegts_toolkit::{constants::DEFAULT_EPG_THRESHOLD, logging};
use mpegts_toolkit::{filter, write_epg, EpgOptions, FileSource, SplitOptions};

#[derive(Parser)]
#[clap(version, about = "EPG extraction and program splitting for TS captures")]
struct Opt {
    /// Debug-level logging (RUST_LOG overrides)
    #[clap(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the EPG of the capture as JSON lines
    Epg {
        /// input file path
        inpath: PathBuf,

        /// output file path, `-` for stdout
        #[clap(default_value = "-")]
        outpath: String,

        /// Drop entries seen this many times or fewer
        #[clap(long, default_value_t = DEFAULT_EPG_THRESHOLD)]
        threshold: u32,
    },
    /// Keep only the first program's streams
    Split {
        /// input file path
        inpath: PathBuf,

        /// output file path
        outpath: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    logging::init(opt.verbose);

    match opt.command {
        Command::Epg { inpath, outpath, threshold } => {
            let source = FileSource::new(&inpath);
            let options = EpgOptions { threshold };
            let mut sink: Box<dyn Write> = if outpath == "-" {
                Box::new(BufWriter::new(io::stdout().lock()))
            } else {
                let file = File::create(&outpath).with_context(|| format!("creating {outpath}"))?;
                Box::new(BufWriter::new(file))
            };
            let result = write_epg(&source, &mut sink, &options);
            let flushed = sink.flush();
            result.with_context(|| format!("extracting EPG from {}", inpath.display()))?;
            flushed.context("flushing EPG output")?;
        }
        Command::Split { inpath, outpath } => {
            filter(&inpath, &outpath, &SplitOptions::default())
                .with_context(|| format!("splitting {} into {}", inpath.display(), outpath.display()))?;
        }
    }
    Ok(())
}
