//! Defines the `TsvWriter` struct for writing cleavage site records as tab-separated rows.
//!

use crate::clv::{ClvRecord, HEADER};
use crate::utils::Result;
use flate2::{write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output stream, kept concrete so the gzip trailer can be written and checked.
enum Output {
    Plain(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl Output {
    fn as_write(&mut self) -> &mut dyn Write {
        match self {
            Output::Plain(writer) => writer,
            Output::Gzip(writer) => writer,
        }
    }
}

/// Structure for writing cleavage site records to a TSV file.
pub struct TsvWriter {
    /// Buffered output, gzip compressed when the path asks for it.
    output: Output,
    num_records: usize,
}

impl TsvWriter {
    /// Constructs a new `TsvWriter` and writes the header line.
    ///
    /// # Arguments
    /// * `output_path` - Path of the output file; a `.gz` suffix enables gzip compression.
    pub fn new(output_path: &str) -> Result<TsvWriter> {
        fn is_gzipped(path: &Path) -> bool {
            let path_str = path.to_string_lossy().to_lowercase();
            path_str.ends_with(".gz") || path_str.ends_with(".gzip")
        }
        let path = Path::new(output_path);
        let file = File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        let output = if is_gzipped(path) {
            Output::Gzip(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            Output::Plain(BufWriter::new(file))
        };
        let mut writer = TsvWriter {
            output,
            num_records: 0,
        };
        writer.write_line(&HEADER.join("\t"))?;
        Ok(writer)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.output.as_write(), "{}", line)
            .map_err(|e| format!("Failed to write output: {}", e))
    }

    pub fn write(&mut self, record: &ClvRecord) -> Result<()> {
        self.write_line(&record.to_row().join("\t"))
            .map_err(|e| format!("{} ({})", e, record.key))?;
        self.num_records += 1;
        Ok(())
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// Flushes buffered rows and, for gzip output, writes the stream trailer.
    pub fn finish(self) -> Result<()> {
        let error = |e: std::io::Error| format!("Failed to finish output: {}", e);
        match self.output {
            Output::Plain(mut writer) => writer.flush().map_err(error),
            Output::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(|e| error(e.into_error()))?;
                encoder.finish().map(|_| ()).map_err(error)
            }
        }
    }
}
