use crate::cli::CallArgs;
use crate::clv::{
    evidence::blank, writers::TsvWriter, ClvKey, ClvRecord, ClvResolver, ClvResult,
    FastaReference, ResolverParams, Segment, SupportedClvKeys,
};
use crate::utils::{
    create_writer, get_bam_header, handle_error_and_exit, is_bam_indexed, is_bam_mapped,
    open_genome_reader, Result,
};
use crossbeam_channel::{bounded, unbounded, Sender};
use rayon::{
    iter::{IntoParallelIterator, ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use rust_htslib::bam::{self, Read};
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self},
};

#[derive(Debug, Clone)]
struct ThreadContextParams {
    genome_path: PathBuf,
    reads_path: Option<PathBuf>,
}

thread_local! {
    static CTX_PARAMS: RefCell<Option<ThreadContextParams>> = const { RefCell::new(None) };
}

/// Indexed reads-to-contigs alignments, with the contig names they refer to.
struct ReadSource {
    reader: bam::IndexedReader,
    target_names: Vec<String>,
}

impl ReadSource {
    fn new(path: &Path) -> Result<ReadSource> {
        let reader = bam::IndexedReader::from_path(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        let target_names = target_names(reader.header());
        Ok(ReadSource {
            reader,
            target_names,
        })
    }

    /// All reads aligned to the contig named `contig_name`.
    fn fetch_reads(&mut self, contig_name: &str) -> Result<Vec<Segment>> {
        let tid = match self.reader.header().tid(contig_name.as_bytes()) {
            Some(tid) => tid,
            None => return Ok(Vec::new()),
        };
        self.reader
            .fetch(bam::FetchDefinition::CompleteTid(tid as i32))
            .map_err(|e| format!("Failed to fetch reads of {}: {}", contig_name, e))?;
        let mut reads = Vec::new();
        for rec in self.reader.records() {
            let rec = rec.map_err(|e| format!("Error reading reads of {}: {}", contig_name, e))?;
            reads.push(Segment::from_hts_rec(&rec, &self.target_names).map_err(|e| e.to_string())?);
        }
        Ok(reads)
    }
}

fn target_names(header: &bam::HeaderView) -> Vec<String> {
    header
        .target_names()
        .iter()
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

fn create_thread_local_read_source() -> Option<ReadSource> {
    let path = CTX_PARAMS.with(|ctx_cell| {
        ctx_cell
            .borrow()
            .as_ref()
            .expect("Thread context parameters not initialized for BAM path")
            .reads_path
            .clone()
    })?;
    Some(ReadSource::new(&path).unwrap_or_else(|e| panic!("Failed to initialize BAM reader: {}", e)))
}

fn create_thread_local_reference() -> FastaReference {
    let path = CTX_PARAMS.with(|ctx_cell| {
        ctx_cell
            .borrow()
            .as_ref()
            .expect("Thread context parameters not initialized for genome path")
            .genome_path
            .clone()
    });
    open_genome_reader(&path)
        .and_then(|reader| FastaReference::new(reader).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            panic!(
                "Failed to initialize genome reader for path {}: {}",
                path.display(),
                e
            )
        })
}

thread_local! {
    // Reads aligned to contigs
    static THREAD_READ_SOURCE: RefCell<Option<ReadSource>> = RefCell::new(create_thread_local_read_source());
    // Reference genome
    static THREAD_REFERENCE: FastaReference = create_thread_local_reference();
}

const CHANNEL_BUFFER_SIZE: usize = 2048;

pub fn call(args: CallArgs) -> Result<()> {
    let contigs_header = get_bam_header(&args.contigs_path)?;
    if !is_bam_mapped(&contigs_header) {
        return Err("Input contig BAM is not mapped".into());
    }
    if let Some(reads_path) = &args.reads_path {
        if !is_bam_mapped(&get_bam_header(reads_path)?) {
            return Err("Input read BAM is not mapped".into());
        }
        if !is_bam_indexed(reads_path) {
            return Err(format!(
                "Input read BAM is not indexed: {}. Create the index using 'samtools index {}'",
                reads_path.display(),
                reads_path.display()
            ));
        }
    } else {
        log::warn!("No read alignments given, only suffix and blank evidence is reported");
    }
    // Fail early on a bad reference rather than in every worker
    FastaReference::new(open_genome_reader(&args.genome_path)?).map_err(|e| e.to_string())?;

    let mut tsv_writer = create_writer(&args.output_prefix, "tsv.gz", TsvWriter::new)?;

    let (sender_contig, receiver_contig) = bounded(CHANNEL_BUFFER_SIZE);
    let contigs_path = args.contigs_path.clone();
    let min_contig_mapq = args.min_contig_mapq;
    let contig_stream_thread = thread::spawn(move || {
        stream_contigs_into_channel(&contigs_path, min_contig_mapq, sender_contig)
    });

    let (sender_result, receiver_result) = bounded::<Vec<ClvRecord>>(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || -> Result<usize> {
        for records in &receiver_result {
            for record in &records {
                tsv_writer.write(record)?;
            }
        }
        let num_records = tsv_writer.num_records();
        tsv_writer.finish()?;
        Ok(num_records)
    });

    let params = ResolverParams {
        hexamer_window: args.hexamer_window,
    };
    let supported = Arc::new(SupportedClvKeys::new());

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );

    let pool = initialize_thread_pool(
        args.num_threads,
        ThreadContextParams {
            genome_path: args.genome_path.clone(),
            reads_path: args.reads_path.clone(),
        },
    )?;
    // Tail evidence of every contig is claimed before any blank end
    let (sender_blank, receiver_blank) = unbounded();
    pool.install(|| {
        receiver_contig
            .into_iter()
            .par_bridge()
            .for_each_with(&sender_result, |s, contig_result| match contig_result {
                Ok((index, contig)) => {
                    if let Some(contig) = process_contig(contig, params, &supported, s) {
                        if let Err(e) = sender_blank.send((index, contig)) {
                            log::error!("Failed to queue blank contig: {}", e);
                        }
                    }
                }
                Err(err) => log::error!("Contig processing: {:#}", err),
            });
    });
    drop(sender_blank);

    let blank_contigs = claim_blank_ends(receiver_blank.into_iter().collect(), &supported);
    log::debug!("Resolving {} contigs without tail evidence", blank_contigs.len());
    pool.install(|| {
        blank_contigs
            .into_par_iter()
            .for_each_with(&sender_result, |s, (contig, claimed)| {
                process_blank_contig(contig, claimed, params, s)
            });
    });

    // Clean-up
    drop(sender_result);
    let num_records = writer_thread
        .join()
        .map_err(|_| "Writer thread panicked".to_string())??;
    log::info!("Wrote {} cleavage sites", num_records);
    match contig_stream_thread.join() {
        Ok(Ok(num_contigs)) => log::debug!("Contig stream finished after {} contigs", num_contigs),
        Ok(Err(e)) => return Err(format!("Contig streaming failed: {}", e)),
        Err(_) => return Err("Contig stream thread panicked".into()),
    }

    Ok(())
}

/// Primary, mapped contig alignments passing the mapping quality filter.
///
/// Secondary and supplementary records repeat a contig already seen, often
/// without its sequence.
fn is_callable_contig(rec: &bam::Record, min_mapq: u8) -> bool {
    !rec.is_unmapped() && !rec.is_secondary() && !rec.is_supplementary() && rec.mapq() >= min_mapq
}

/// Streams callable contigs tagged with their input order.
///
/// Returns the number of contigs sent.
fn stream_contigs_into_channel(
    contigs_path: &Path,
    min_mapq: u8,
    sender: Sender<Result<(usize, Segment)>>,
) -> Result<usize> {
    let mut reader = bam::Reader::from_path(contigs_path)
        .map_err(|e| format!("Failed to open {}: {}", contigs_path.display(), e))?;
    let target_names = target_names(reader.header());

    let mut num_sent = 0;
    for (index, rec) in reader.records().enumerate() {
        let contig = match rec {
            Ok(rec) if !is_callable_contig(&rec, min_mapq) => continue,
            Ok(rec) => Segment::from_hts_rec(&rec, &target_names)
                .map(|contig| (index, contig))
                .map_err(|e| format!("Error at contig record {}: {}", index + 1, e)),
            Err(e) => Err(format!("Error at contig record {}: {}", index + 1, e)),
        };
        if sender.send(contig).is_err() {
            return Err("Contig channel closed early".into());
        }
        num_sent += 1;
    }
    Ok(num_sent)
}

/// Resolves the tail evidence of a contig; hands the contig back when it has none.
fn process_contig(
    contig: Segment,
    params: ResolverParams,
    supported: &SupportedClvKeys,
    sender_result: &Sender<Vec<ClvRecord>>,
) -> Option<Segment> {
    let reads = THREAD_READ_SOURCE.with(|source_cell| match source_cell.borrow_mut().as_mut() {
        Some(source) => source.fetch_reads(&contig.name),
        None => Ok(Vec::new()),
    });
    let reads = reads.unwrap_or_else(|e| handle_error_and_exit(e));

    let records = THREAD_REFERENCE.with(|reference| {
        ClvResolver::new(reference, supported, params).resolve_tails(&contig, &reads)
    });
    match records {
        Ok(Some(records)) => {
            send_records(records, sender_result);
            None
        }
        Ok(None) => Some(contig),
        Err(e) => handle_error_and_exit(format!("Error resolving contig {}: {}", contig.name, e)),
    }
}

/// Claims the ends of contigs without tail evidence in input order.
fn claim_blank_ends(
    mut contigs: Vec<(usize, Segment)>,
    supported: &SupportedClvKeys,
) -> Vec<(Segment, Vec<(ClvKey, i64)>)> {
    contigs.sort_unstable_by_key(|(index, _)| *index);
    contigs
        .into_iter()
        .map(|(_, contig)| {
            let claimed = blank::claim_candidates(&contig, supported);
            (contig, claimed)
        })
        .filter(|(_, claimed)| !claimed.is_empty())
        .collect()
}

fn process_blank_contig(
    contig: Segment,
    claimed: Vec<(ClvKey, i64)>,
    params: ResolverParams,
    sender_result: &Sender<Vec<ClvRecord>>,
) {
    let records: ClvResult<Vec<ClvRecord>> = THREAD_REFERENCE.with(|reference| {
        claimed
            .iter()
            .map(|(key, ctg_clv)| {
                blank::gen_clv_record(&contig, key, *ctg_clv, params.hexamer_window, reference)
            })
            .collect()
    });
    match records {
        Ok(records) => send_records(records, sender_result),
        Err(e) => handle_error_and_exit(format!("Error resolving contig {}: {}", contig.name, e)),
    }
}

fn send_records(records: Vec<ClvRecord>, sender_result: &Sender<Vec<ClvRecord>>) {
    if records.is_empty() {
        return;
    }
    if let Err(e) = sender_result.send(records) {
        log::error!("Failed to send records to writer thread: {}", e);
    }
}

fn initialize_thread_pool(
    num_threads: usize,
    thread_context: ThreadContextParams,
) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("polyclv-{}", i))
        .start_handler(move |_thread_index| {
            CTX_PARAMS.with(|cell| {
                *cell.borrow_mut() = Some(thread_context.clone());
            });
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .exit_handler(|_thread_index| {
            CTX_PARAMS.with(|cell| {
                *cell.borrow_mut() = None;
            });
        })
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::{Cigar, Strand};

    fn make_record(flags: u16, mapq: u8) -> bam::Record {
        let mut rec = bam::Record::new();
        rec.set_flags(flags);
        rec.set_mapq(mapq);
        rec
    }

    #[test]
    fn only_primary_mapped_contigs_are_called() {
        assert!(is_callable_contig(&make_record(0, 60), 0));
        assert!(is_callable_contig(&make_record(0x10, 60), 0));
        assert!(!is_callable_contig(&make_record(0x4, 60), 0));
        assert!(!is_callable_contig(&make_record(0x100, 60), 0));
        assert!(!is_callable_contig(&make_record(0x800, 60), 0));
        assert!(!is_callable_contig(&make_record(0, 5), 10));
    }

    fn make_contig(name: &str, start: i64) -> Segment {
        Segment {
            name: name.to_string(),
            seqname: "chr1".to_string(),
            start,
            bases: b"GAATAAACCG".to_vec(),
            ops: "10M".parse::<Cigar>().unwrap().ops,
            mapq: 60,
            ..Default::default()
        }
    }

    #[test]
    fn blank_ends_are_claimed_in_input_order() {
        let supported = SupportedClvKeys::new();
        assert!(supported.claim(&ClvKey::new("chr1", Strand::Plus, 19)));
        let contigs = vec![
            (2, make_contig("third", 10)),
            (0, make_contig("first", 10)),
            (1, make_contig("second", 30)),
        ];
        let claimed = claim_blank_ends(contigs, &supported);
        let names: Vec<_> = claimed.iter().map(|(c, _)| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(
            claimed[0].1,
            vec![(ClvKey::new("chr1", Strand::Minus, 10), 0)]
        );
        assert_eq!(claimed[1].1.len(), 2);
    }
}
