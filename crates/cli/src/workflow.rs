//! JSON-configured build, insert, delete and query workflows.

use dualvec_core::storage::{
    load_graph, read_alphas, read_ids, read_intervals, read_json, read_labels,
    read_paired_vectors, read_tombstones, read_vectors, save_graph, write_labels,
    write_paired_vectors, write_results, write_tombstones, write_vectors,
};
use dualvec_core::{
    recall_at_k, BuildParams, DualIndex, IndexError, LabelInterval, Query, QueryParams, Result,
    SearchStats, VectorStore,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a dataset's vectors and labels live.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetFiles {
    /// Paired vector file (e-space records then s-space records), or only the
    /// e-space vectors when `s_vector_file` is given.
    pub vector_file: PathBuf,
    #[serde(default)]
    pub s_vector_file: Option<PathBuf>,
    pub label_file: PathBuf,
}

impl DatasetFiles {
    fn read_vectors(&self) -> Result<(VectorStore, VectorStore)> {
        match &self.s_vector_file {
            Some(s_path) => Ok((read_vectors(&self.vector_file)?, read_vectors(s_path)?)),
            None => read_paired_vectors(&self.vector_file),
        }
    }

    fn write_vectors(&self, e: &VectorStore, s: &VectorStore) -> Result<()> {
        match &self.s_vector_file {
            Some(s_path) => {
                write_vectors(&self.vector_file, e)?;
                write_vectors(s_path, s)
            }
            None => write_paired_vectors(&self.vector_file, e, s),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(flatten)]
    pub dataset: DatasetFiles,
    /// Output graph file.
    pub graph_file: PathBuf,
    /// Output tombstone file, all nodes live.
    pub tombstone_file: PathBuf,
    /// Store edge distance pairs in the graph file instead of recomputing them on load.
    #[serde(default = "default_true")]
    pub cache_distances: bool,
    #[serde(flatten)]
    pub params: BuildParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertConfig {
    /// Existing dataset; rewritten in place with the new nodes appended.
    #[serde(flatten)]
    pub dataset: DatasetFiles,
    pub graph_file: PathBuf,
    pub tombstone_file: PathBuf,
    /// Paired vector file of the nodes to add.
    pub new_vector_file: PathBuf,
    pub new_label_file: PathBuf,
    #[serde(default = "default_true")]
    pub cache_distances: bool,
    #[serde(flatten)]
    pub params: BuildParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteConfig {
    pub tombstone_file: PathBuf,
    /// JSON array of node ids.
    pub delete_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(flatten)]
    pub dataset: DatasetFiles,
    pub graph_file: PathBuf,
    pub tombstone_file: PathBuf,
    /// Paired vector file of the queries.
    pub query_file: PathBuf,
    /// Per-query blend weights; `alpha` applies to every query when absent.
    #[serde(default)]
    pub alpha_file: Option<PathBuf>,
    /// Per-query `[lo, hi]` label intervals; unfiltered when absent.
    #[serde(default)]
    pub interval_file: Option<PathBuf>,
    pub result_file: PathBuf,
    /// Also run the linear baseline and report recall against it.
    #[serde(default)]
    pub compute_recall: bool,
    #[serde(flatten)]
    pub params: QueryParams,
}

pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let config = read_json(path)?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn load_index(dataset: &DatasetFiles, graph_file: &Path, tombstone_file: &Path) -> Result<DualIndex> {
    let (e, s) = dataset.read_vectors()?;
    let labels = read_labels(&dataset.label_file)?;
    let tombstones = read_tombstones(tombstone_file)?;
    let graph = load_graph(graph_file, dualvec_core::DualSpace::new(&e, &s))?;
    let index = DualIndex::from_parts(e, s, labels, tombstones, graph)?;
    tracing::info!(
        "Loaded index ({} nodes, {} deleted, dimensions {}/{})",
        index.len(),
        index.tombstones().invalid_count(),
        index.e_store().dimension(),
        index.s_store().dimension()
    );
    Ok(index)
}

pub fn run_build(config: &BuildConfig) -> Result<()> {
    let (e, s) = config.dataset.read_vectors()?;
    let labels = read_labels(&config.dataset.label_file)?;
    let index = DualIndex::build(e, s, labels, &config.params)?;
    save_graph(&config.graph_file, index.graph(), config.cache_distances)?;
    write_tombstones(&config.tombstone_file, index.tombstones())?;
    Ok(())
}

pub fn run_insert(config: &InsertConfig) -> Result<()> {
    let mut index = load_index(&config.dataset, &config.graph_file, &config.tombstone_file)?;
    let (e, s) = read_paired_vectors(&config.new_vector_file)?;
    let labels = read_labels(&config.new_label_file)?;
    let (ids, stats) = index.insert(&e, &s, &labels, &config.params)?;
    tracing::info!(
        "Inserted nodes {}..{} ({} neighbors relinked)",
        ids.start,
        ids.end,
        stats.repaired
    );

    save_graph(&config.graph_file, index.graph(), config.cache_distances)?;
    write_labels(&config.dataset.label_file, index.labels())?;
    config
        .dataset
        .write_vectors(index.e_store(), index.s_store())?;
    write_tombstones(&config.tombstone_file, index.tombstones())?;
    Ok(())
}

pub fn run_delete(config: &DeleteConfig) -> Result<()> {
    let mut mask = read_tombstones(&config.tombstone_file)?;
    let ids = read_ids(&config.delete_file)?;
    let deleted = mask.delete(&ids)?;
    write_tombstones(&config.tombstone_file, &mask)?;
    tracing::info!(
        "Updated tombstones: {} of {} requested ids newly deleted, {} live nodes remain",
        deleted,
        ids.len(),
        mask.valid_count()
    );
    Ok(())
}

/// Aggregate figures of one query run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryReport {
    pub queries: usize,
    pub stats: SearchStats,
    /// Mean recall@k against the linear baseline, when requested.
    pub recall: Option<f32>,
}

pub fn run_query(config: &QueryConfig) -> Result<QueryReport> {
    let index = load_index(&config.dataset, &config.graph_file, &config.tombstone_file)?;
    let (qe, qs) = read_paired_vectors(&config.query_file)?;
    let m = qe.len();

    let alphas = match &config.alpha_file {
        Some(path) => read_alphas(path)?,
        None => vec![config.params.alpha; m],
    };
    check_per_query("query alphas", m, alphas.len())?;
    let intervals = match &config.interval_file {
        Some(path) => read_intervals(path)?,
        None => vec![LabelInterval::ALL; m],
    };
    check_per_query("query intervals", m, intervals.len())?;

    let queries: Vec<Query<'_>> = (0..m as u32)
        .map(|i| Query {
            e: qe.get(i),
            s: qs.get(i),
            alpha: alphas[i as usize],
            interval: intervals[i as usize],
        })
        .collect();

    let started = Instant::now();
    let outcomes = index.query_batch(&queries, &config.params)?;
    let elapsed = started.elapsed();

    let mut report = QueryReport {
        queries: m,
        ..QueryReport::default()
    };
    for outcome in &outcomes {
        report.stats += outcome.stats;
    }
    let qps = if elapsed.as_secs_f64() > 0.0 {
        m as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    tracing::info!(
        "Beam search answered {} queries in {}ms ({:.1} QPS, {} distance evaluations, {} expansions)",
        m,
        elapsed.as_millis(),
        qps,
        report.stats.distance_evaluations,
        report.stats.expansions
    );

    if config.compute_recall {
        let mut total = 0.0f32;
        let mut linear_stats = SearchStats::default();
        for (query, outcome) in queries.iter().zip(&outcomes) {
            let truth = index.linear_query(query, config.params.k)?;
            linear_stats += truth.stats;
            total += recall_at_k(&outcome.ids, &truth.ids);
        }
        let recall = if m == 0 { 1.0 } else { total / m as f32 };
        tracing::info!(
            "Recall@{} against linear search: {:.4} (linear scan: {} distance evaluations)",
            config.params.k,
            recall,
            linear_stats.distance_evaluations
        );
        report.recall = Some(recall);
    }

    let results: Vec<Vec<u32>> = outcomes.into_iter().map(|o| o.ids).collect();
    write_results(&config.result_file, &results)?;
    Ok(report)
}

fn check_per_query(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(IndexError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualvec_core::storage::{read_json, write_json};
    use dualvec_core::TombstoneMask;

    /// Writes a 40-node paired vector file with labels 0..40 into `dir`.
    fn write_dataset(dir: &Path) -> (PathBuf, PathBuf) {
        let e_rows: Vec<[f32; 2]> = (0..40).map(|i| [i as f32, (i % 7) as f32]).collect();
        let s_rows: Vec<[f32; 2]> = (0..40).map(|i| [(i % 5) as f32, -(i as f32)]).collect();
        let e = VectorStore::from_rows(2, &e_rows).unwrap();
        let s = VectorStore::from_rows(2, &s_rows).unwrap();
        let vectors = dir.join("base.fvecs");
        let labels = dir.join("labels.json");
        write_paired_vectors(&vectors, &e, &s).unwrap();
        write_labels(&labels, &(0..40).collect::<Vec<u64>>()).unwrap();
        (vectors, labels)
    }

    fn build_config(dir: &Path) -> BuildConfig {
        let (vectors, labels) = write_dataset(dir);
        let json = serde_json::json!({
            "vector_file": vectors,
            "label_file": labels,
            "graph_file": dir.join("index.dvg"),
            "tombstone_file": dir.join("tombstones.json"),
            "ef_spatial": 16,
            "ef_attribute": 8,
            "max_edges": 12
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_config_defaults_fill_missing_params() {
        let config: DeleteConfig =
            serde_json::from_str(r#"{"tombstone_file":"t.json","delete_file":"d.json"}"#).unwrap();
        assert_eq!(config.delete_file, PathBuf::from("d.json"));

        let dir = tempfile::tempdir().unwrap();
        let build = build_config(dir.path());
        assert_eq!(build.params.max_edges, 12);
        assert_eq!(build.params.seed, BuildParams::default().seed);
        assert!(build.cache_distances);
        assert!(build.dataset.s_vector_file.is_none());
    }

    #[test]
    fn test_build_delete_query_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_config(dir.path());
        run_build(&build).unwrap();
        assert!(build.graph_file.exists());

        let delete_file = dir.path().join("delete.json");
        write_json(&delete_file, &[3u64, 4, 4]).unwrap();
        run_delete(&DeleteConfig {
            tombstone_file: build.tombstone_file.clone(),
            delete_file,
        })
        .unwrap();
        let mask = read_tombstones(&build.tombstone_file).unwrap();
        assert_eq!(mask.invalid_count(), 2);

        // queries sit exactly on nodes 3 and 20
        let qe = VectorStore::from_rows(2, &[[3.0f32, 3.0], [20.0, 6.0]]).unwrap();
        let qs = VectorStore::from_rows(2, &[[3.0f32, -3.0], [0.0, -20.0]]).unwrap();
        let query_file = dir.path().join("queries.fvecs");
        write_paired_vectors(&query_file, &qe, &qs).unwrap();
        let result_file = dir.path().join("results.json");
        let config = QueryConfig {
            dataset: build.dataset.clone(),
            graph_file: build.graph_file.clone(),
            tombstone_file: build.tombstone_file.clone(),
            query_file,
            alpha_file: None,
            interval_file: None,
            result_file: result_file.clone(),
            compute_recall: true,
            params: QueryParams {
                beam_size: 40,
                k: 3,
                alpha: 0.5,
            },
        };
        let report = run_query(&config).unwrap();
        assert_eq!(report.queries, 2);
        assert_eq!(report.recall, Some(1.0));

        let results: Vec<Vec<u32>> = read_json(&result_file).unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].contains(&3));
        assert_eq!(results[1][0], 20);
    }

    #[test]
    fn test_insert_rewrites_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_config(dir.path());
        run_build(&build).unwrap();

        let e = VectorStore::from_rows(2, &[[100.0f32, 1.0], [101.0, 2.0]]).unwrap();
        let s = VectorStore::from_rows(2, &[[1.0f32, 1.0], [2.0, 2.0]]).unwrap();
        let new_vectors = dir.path().join("new.fvecs");
        let new_labels = dir.path().join("new_labels.json");
        write_paired_vectors(&new_vectors, &e, &s).unwrap();
        write_labels(&new_labels, &[40, 41]).unwrap();

        run_insert(&InsertConfig {
            dataset: build.dataset.clone(),
            graph_file: build.graph_file.clone(),
            tombstone_file: build.tombstone_file.clone(),
            new_vector_file: new_vectors,
            new_label_file: new_labels,
            cache_distances: false,
            params: build.params.clone(),
        })
        .unwrap();

        assert_eq!(read_labels(&build.dataset.label_file).unwrap().len(), 42);
        let mask: TombstoneMask = read_tombstones(&build.tombstone_file).unwrap();
        assert_eq!(mask.len(), 42);
        let index = load_index(&build.dataset, &build.graph_file, &build.tombstone_file).unwrap();
        assert_eq!(index.len(), 42);
        assert_eq!(index.e_store().get(41), &[101.0, 2.0]);
    }

    #[test]
    fn test_query_rejects_alpha_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_config(dir.path());
        run_build(&build).unwrap();
        let qe = VectorStore::from_rows(2, &[[0.0f32, 0.0]]).unwrap();
        let query_file = dir.path().join("q.fvecs");
        write_paired_vectors(&query_file, &qe, &qe).unwrap();
        let alpha_file = dir.path().join("alphas.json");
        write_json(&alpha_file, &[0.1f32, 0.2]).unwrap();
        let config = QueryConfig {
            dataset: build.dataset.clone(),
            graph_file: build.graph_file.clone(),
            tombstone_file: build.tombstone_file.clone(),
            query_file,
            alpha_file: Some(alpha_file),
            interval_file: None,
            result_file: dir.path().join("r.json"),
            compute_recall: false,
            params: QueryParams::default(),
        };
        assert!(matches!(
            run_query(&config),
            Err(IndexError::LengthMismatch { what: "query alphas", .. })
        ));
    }
}
