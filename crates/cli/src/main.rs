use clap::{Args as ClapArgs, Parser, Subcommand};
use dualvec_core::{config, BuildParams, QueryParams};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod workflow;

#[derive(Parser)]
#[command(
    name = "dualvec",
    version,
    about = "Dual-space blended ANN graph index"
)]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a graph from a vector file and labels
    Build {
        /// Workflow config (JSON)
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        overrides: BuildOverrides,
    },
    /// Append nodes to an existing index and rewrite its files
    Insert {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        overrides: BuildOverrides,
    },
    /// Mark node ids from a delete list as tombstoned
    Delete {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Answer a batch of queries and write their results
    Query {
        #[arg(short, long)]
        config: PathBuf,
        /// Beam capacity (overrides the config)
        #[arg(long)]
        beam_size: Option<usize>,
        /// Results per query, at most config::MAX_K (overrides the config)
        #[arg(short, long)]
        k: Option<usize>,
        /// Blend weight for queries without a per-query alpha (overrides the config)
        #[arg(long)]
        alpha: Option<f32>,
        /// Compare against linear search and report recall
        #[arg(long)]
        recall: bool,
    },
}

/// Command-line overrides for construction parameters.
#[derive(ClapArgs)]
struct BuildOverrides {
    #[arg(long)]
    ef_spatial: Option<usize>,
    #[arg(long)]
    ef_attribute: Option<usize>,
    #[arg(long)]
    max_edges: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

impl BuildOverrides {
    fn apply(&self, params: &mut BuildParams) {
        if let Some(v) = self.ef_spatial {
            params.ef_spatial = v;
        }
        if let Some(v) = self.ef_attribute {
            params.ef_attribute = v;
        }
        if let Some(v) = self.max_edges {
            params.max_edges = v;
        }
        if let Some(v) = self.seed {
            params.seed = v;
        }
    }
}

fn apply_query_overrides(
    params: &mut QueryParams,
    beam_size: Option<usize>,
    k: Option<usize>,
    alpha: Option<f32>,
) {
    if let Some(v) = beam_size {
        params.beam_size = v;
    }
    if let Some(v) = k {
        params.k = v.min(config::MAX_K);
    }
    if let Some(v) = alpha {
        params.alpha = v;
    }
}

fn init_tracing(verbose: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("dualvec_core={level}").parse()?)
        .add_directive(format!("dualvec={level}").parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn run(command: Command) -> dualvec_core::Result<()> {
    match command {
        Command::Build { config, overrides } => {
            let mut cfg: workflow::BuildConfig = workflow::load_config(&config)?;
            overrides.apply(&mut cfg.params);
            workflow::run_build(&cfg)
        }
        Command::Insert { config, overrides } => {
            let mut cfg: workflow::InsertConfig = workflow::load_config(&config)?;
            overrides.apply(&mut cfg.params);
            workflow::run_insert(&cfg)
        }
        Command::Delete { config } => {
            let cfg: workflow::DeleteConfig = workflow::load_config(&config)?;
            workflow::run_delete(&cfg)
        }
        Command::Query {
            config,
            beam_size,
            k,
            alpha,
            recall,
        } => {
            let mut cfg: workflow::QueryConfig = workflow::load_config(&config)?;
            apply_query_overrides(&mut cfg.params, beam_size, k, alpha);
            cfg.compute_recall |= recall;
            let report = workflow::run_query(&cfg)?;
            match report.recall {
                Some(recall) => tracing::info!(
                    "Answered {} queries ({} distance evaluations, recall {:.4})",
                    report.queries,
                    report.stats.distance_evaluations,
                    recall
                ),
                None => tracing::info!(
                    "Answered {} queries ({} distance evaluations)",
                    report.queries,
                    report.stats.distance_evaluations
                ),
            }
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose, args.json_logs)?;

    if let Err(e) = run(args.command) {
        tracing::error!("Workflow failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_query_overrides() {
        let args = Args::parse_from([
            "dualvec", "-v", "query", "--config", "q.json", "-k", "5", "--alpha", "0.25",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Query {
                config, k, alpha, beam_size, recall,
            } => {
                assert_eq!(config, PathBuf::from("q.json"));
                assert_eq!(k, Some(5));
                assert_eq!(alpha, Some(0.25));
                assert_eq!(beam_size, None);
                assert!(!recall);
            }
            _ => panic!("expected query subcommand"),
        }
    }

    #[test]
    fn test_build_overrides_apply() {
        let args = Args::parse_from(["dualvec", "build", "-c", "b.json", "--max-edges", "7"]);
        let Command::Build { overrides, .. } = args.command else {
            panic!("expected build subcommand");
        };
        let mut params = BuildParams::default();
        overrides.apply(&mut params);
        assert_eq!(params.max_edges, 7);
        assert_eq!(params.ef_spatial, config::DEFAULT_EF_SPATIAL);
    }

    #[test]
    fn test_query_overrides_clamp_k() {
        let mut params = QueryParams::default();
        apply_query_overrides(&mut params, Some(8), Some(config::MAX_K + 5), None);
        assert_eq!(params.beam_size, 8);
        assert_eq!(params.k, config::MAX_K);
        assert_eq!(params.alpha, config::DEFAULT_ALPHA);
    }
}
