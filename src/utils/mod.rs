mod bam_utils;
mod io_utils;
mod readers;
mod util;

pub use bam_utils::{get_bam_header, is_bam_mapped, is_bam_indexed};
pub use io_utils::create_writer;
pub use readers::open_genome_reader;
pub use util::{handle_error_and_exit, Result};
