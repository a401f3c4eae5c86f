//! On-disk formats.
//!
//! Vectors use a headerless little-endian record file, the graph a
//! checksummed binary layout, and everything else small JSON documents. All
//! writes go through a temp file renamed into place.

/// Graph binary codec with CRC32 footer and atomic writes.
pub mod persistence;
/// JSON side files (labels, tombstones, intervals, alphas, id lists, results).
pub mod records;
/// Raw and paired vector files.
pub mod vecfile;

pub use persistence::{decode_graph, encode_graph, load_graph, save_graph};
pub use records::{
    read_alphas, read_ids, read_intervals, read_json, read_labels, read_tombstones, write_json,
    write_labels, write_results, write_tombstones,
};
pub use vecfile::{
    decode_vectors, encode_vectors, read_paired_vectors, read_vectors, write_paired_vectors,
    write_vectors,
};
