use crate::clv::Strand;
use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="polyclv",
          version=&**FULL_VERSION,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Cleavage site caller")]
    Call(CallArgs),
    #[clap(about = "Polyadenylation signal search")]
    Search(SearchArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("call")))]
#[command(arg_required_else_help(true))]
pub struct CallArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genome")]
    #[clap(help = "Path to reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "contigs")]
    #[clap(help = "BAM file with contigs aligned to the genome")]
    #[clap(value_name = "CONTIGS")]
    #[arg(value_parser = check_file_exists)]
    pub contigs_path: PathBuf,

    #[clap(short = 'r')]
    #[clap(long = "reads")]
    #[clap(help = "Indexed BAM file with reads aligned to the contigs")]
    #[clap(value_name = "READS")]
    #[arg(value_parser = check_file_exists)]
    pub reads_path: Option<PathBuf>,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "hexamer-window")]
    #[clap(value_name = "WINDOW")]
    #[clap(help = "Number of bases next to a cleavage site searched for a polyadenylation signal")]
    #[clap(default_value = "50")]
    #[arg(value_parser = window_in_range)]
    pub hexamer_window: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-contig-mapq")]
    #[clap(value_name = "MAPQ")]
    #[clap(help = "Minimum mapping quality of a contig")]
    #[clap(default_value = "0")]
    pub min_contig_mapq: u8,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("search")))]
#[command(arg_required_else_help(true))]
pub struct SearchArgs {
    #[clap(required = true)]
    #[clap(short = 's')]
    #[clap(long = "strand")]
    #[clap(help = "Strand of the cleavage site (+ or -)")]
    #[clap(value_name = "STRAND")]
    #[clap(allow_hyphen_values = true)]
    pub strand: Strand,

    #[clap(required = true)]
    #[clap(long = "clv")]
    #[clap(help = "Genome coordinate of the cleavage site")]
    #[clap(value_name = "CLV")]
    pub clv: i64,

    #[clap(required = true)]
    #[clap(long = "seq")]
    #[clap(help = "Sequence ending (+) or starting (-) at the cleavage site")]
    #[clap(value_name = "SEQ")]
    pub seq: String,

    #[clap(long = "window")]
    #[clap(value_name = "WINDOW")]
    #[clap(help = "Number of bases next to the cleavage site to search")]
    #[clap(default_value = "50")]
    #[arg(value_parser = window_in_range)]
    pub window: usize,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn window_in_range(s: &str) -> Result<usize> {
    const HEXAMER_LEN: usize = 6;
    let window: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid window size", s))?;
    if window >= HEXAMER_LEN {
        Ok(window)
    } else {
        Err(format!("Window must span at least {} bases", HEXAMER_LEN))
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}
