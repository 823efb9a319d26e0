use crate::cli::SearchArgs;
use crate::clv::{
    hexamer::{candidate_list, format_match},
    search as search_hexamer,
};
use crate::utils::Result;

pub fn search(args: SearchArgs) -> Result<()> {
    if !args
        .seq
        .bytes()
        .all(|b| b"ACGTN".contains(&b.to_ascii_uppercase()))
    {
        return Err(format!("Sequence contains non-nucleotide characters: {}", args.seq));
    }
    log::debug!("Candidate hexamers: {}", candidate_list());
    let hexamer = search_hexamer(args.strand, args.clv, args.seq.as_bytes(), args.window);
    log::debug!(
        "Searched {} bases on strand {} at {}",
        args.seq.len().min(args.window),
        args.strand,
        args.clv
    );
    println!("{}", format_match(&hexamer).join("\t"));
    Ok(())
}
