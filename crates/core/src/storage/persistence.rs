//! Graph persistence with an explicit little-endian layout.
//!
//! ```text
//! "DVG1" | u8 flags | u64 node count
//! per node:  u64 edge count
//! per edge:  u32 target | [f32 d_e | f32 d_s] | u64 range count | (f32 lo, f32 hi)*
//! "DVC1" | u32 CRC32 (LE) of every preceding byte
//! ```
//!
//! Flag bit 0 says whether the cached distance pairs are present; when they
//! are not, they are recomputed from the vector stores on load. Writes go to a
//! temp file that is renamed over the target.

use crate::error::{IndexError, Result};
use crate::graph::{AlphaInterval, AlphaRange, Edge, Graph};
use crate::vector::{DistancePair, DualSpace};
use std::fs;
use std::path::{Path, PathBuf};

/// Leading magic of a graph file.
const GRAPH_MAGIC: &[u8; 4] = b"DVG1";
/// Magic preceding the CRC32 footer.
const GRAPH_CRC_MAGIC: &[u8; 4] = b"DVC1";
const FLAG_DISTANCES: u8 = 0b0000_0001;
const HEADER_LEN: usize = 4 + 1 + 8;
const FOOTER_LEN: usize = 4 + 4;

/// Serializes `graph`, optionally with the cached distance pairs.
pub fn encode_graph(graph: &Graph, with_distances: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + FOOTER_LEN + graph.edge_count() * 32);
    out.extend_from_slice(GRAPH_MAGIC);
    out.push(if with_distances { FLAG_DISTANCES } else { 0 });
    out.extend_from_slice(&(graph.len() as u64).to_le_bytes());
    for edges in graph.lists() {
        out.extend_from_slice(&(edges.len() as u64).to_le_bytes());
        for edge in edges {
            out.extend_from_slice(&edge.target.to_le_bytes());
            if with_distances {
                out.extend_from_slice(&edge.dist.e.to_le_bytes());
                out.extend_from_slice(&edge.dist.s.to_le_bytes());
            }
            let ranges = edge.alpha.ranges();
            out.extend_from_slice(&(ranges.len() as u64).to_le_bytes());
            for range in ranges {
                out.extend_from_slice(&range.lo.to_le_bytes());
                out.extend_from_slice(&range.hi.to_le_bytes());
            }
        }
    }
    let crc = crc32fast::hash(&out);
    out.extend_from_slice(GRAPH_CRC_MAGIC);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

/// Length-checked cursor over a byte slice. Running off the end is a
/// [`IndexError::Corrupt`] error.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(IndexError::Corrupt(format!(
                "graph file truncated at byte {} (needed {} more)",
                self.pos, N
            )));
        }
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    /// Reads a count and checks that at least `count * min_item` bytes follow.
    fn count(&mut self, what: &str, min_item: usize) -> Result<usize> {
        let count = self.u64()?;
        let fits = usize::try_from(count)
            .ok()
            .filter(|&c| c.checked_mul(min_item).is_some_and(|b| b <= self.remaining()));
        fits.ok_or_else(|| {
            IndexError::Corrupt(format!(
                "{what} count {count} exceeds the {} remaining bytes",
                self.remaining()
            ))
        })
    }
}

/// Decodes a graph file image and checks it against `space`.
///
/// Fails without returning a partial graph on a bad magic, CRC mismatch,
/// truncation, node count differing from `space.len()`, out-of-range targets,
/// or malformed intervals.
pub fn decode_graph(bytes: &[u8], space: DualSpace<'_>) -> Result<Graph> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(IndexError::Corrupt(format!(
            "graph file of {} bytes is shorter than header and footer",
            bytes.len()
        )));
    }
    let (payload, footer) = bytes.split_at(bytes.len() - FOOTER_LEN);
    if &footer[..4] != GRAPH_CRC_MAGIC {
        return Err(IndexError::Corrupt("graph file has no CRC footer".into()));
    }
    let stored_crc = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);
    let computed_crc = crc32fast::hash(payload);
    if stored_crc != computed_crc {
        return Err(IndexError::Corrupt(format!(
            "graph CRC32 mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"
        )));
    }

    let mut reader = ByteReader::new(payload);
    if &reader.take::<4>()? != GRAPH_MAGIC {
        return Err(IndexError::Corrupt("graph file has a bad magic".into()));
    }
    let flags = reader.u8()?;
    if flags & !FLAG_DISTANCES != 0 {
        return Err(IndexError::Corrupt(format!("unknown graph flags {flags:#04x}")));
    }
    let with_distances = flags & FLAG_DISTANCES != 0;
    let n = reader.count("node", 8)?;
    if n != space.len() {
        return Err(IndexError::LengthMismatch {
            what: "graph nodes",
            expected: space.len(),
            actual: n,
        });
    }

    let edge_min = 4 + 8 + if with_distances { 8 } else { 0 };
    let mut lists: Vec<Vec<Edge>> = Vec::with_capacity(n);
    for source in 0..n as u32 {
        let edge_count = reader.count("edge", edge_min)?;
        let mut edges = Vec::with_capacity(edge_count);
        for _ in 0..edge_count {
            let target = reader.u32()?;
            if target as usize >= n {
                return Err(IndexError::Corrupt(format!(
                    "edge {source} -> {target} points past the {n} nodes"
                )));
            }
            let cached = if with_distances {
                Some(DistancePair::new(reader.f32()?, reader.f32()?))
            } else {
                None
            };
            let range_count = reader.count("alpha range", 8)?;
            let mut ranges = Vec::with_capacity(range_count);
            for _ in 0..range_count {
                ranges.push(AlphaRange::new(reader.f32()?, reader.f32()?));
            }
            edges.push(Edge {
                target,
                dist: cached.unwrap_or_else(|| space.pair(source, target)),
                alpha: AlphaInterval::from_ranges(ranges)?,
            });
        }
        lists.push(edges);
    }
    if reader.remaining() != 0 {
        return Err(IndexError::Corrupt(format!(
            "{} trailing bytes after the last node",
            reader.remaining()
        )));
    }

    let graph = Graph::from_lists(lists);
    graph.validate().map_err(IndexError::Corrupt)?;
    Ok(graph)
}

/// Writes `graph` to `path` atomically.
pub fn save_graph(path: impl AsRef<Path>, graph: &Graph, with_distances: bool) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_graph(graph, with_distances);
    write_atomic(path, &bytes)?;
    tracing::info!(
        "Saved graph to {} ({} nodes, {} edges, {} bytes)",
        path.display(),
        graph.len(),
        graph.edge_count(),
        bytes.len()
    );
    Ok(())
}

/// Reads and verifies the graph at `path` for the nodes of `space`.
pub fn load_graph(path: impl AsRef<Path>, space: DualSpace<'_>) -> Result<Graph> {
    let path = path.as_ref();
    let raw = fs::read(path)?;
    let graph = decode_graph(&raw, space)?;
    tracing::info!(
        "Loaded graph from {} ({} nodes, {} edges)",
        path.display(),
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644))?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
