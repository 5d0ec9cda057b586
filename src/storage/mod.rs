//! Results persistence module

use crate::cluster::metrics::{summarize_communities, GraphStats, PartitionQuality};
use crate::cluster::Partition;
use crate::data::SparseMatrix;
use crate::error::WriteError;
use crate::pipeline::{Detection, SweepPoint};
use itertools::Itertools;
use serde_json::{json, to_string_pretty, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write one CSV row per community: comma-separated matrix indices, no
/// header. An existing file is truncated; no communities give an empty file.
pub fn write_communities<P: AsRef<Path>>(partition: &Partition, path: P) -> Result<(), WriteError> {
    let path = path.as_ref();
    log::info!("Saving {} communities to {}", partition.len(), path.display());

    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);

    for community in partition.iter() {
        writeln!(writer, "{}", community.members.iter().join(",")).map_err(io_error(path))?;
    }

    writer.flush().map_err(io_error(path))?;

    Ok(())
}

fn write_json(value: &Value, path: &Path) -> Result<(), WriteError> {
    let text = to_string_pretty(value).map_err(|source| WriteError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file = File::create(path).map_err(io_error(path))?;
    file.write_all(text.as_bytes()).map_err(io_error(path))?;

    Ok(())
}

/// Save a JSON summary of one run: matrix, filter, graph and partition
pub fn save_summary<P: AsRef<Path>>(
    matrix: &SparseMatrix,
    detection: &Detection,
    quality: &PartitionQuality,
    path: P,
) -> Result<(), WriteError> {
    let path = path.as_ref();
    log::info!("Saving run summary to {}", path.display());

    let partition = &detection.partition;
    let sizes: Vec<usize> = partition.iter().map(|c| c.size).collect();

    let summary = json!({
        "matrix": {
            "rows": matrix.shape.0,
            "cols": matrix.shape.1,
            "non_zero": matrix.nnz(),
        },
        "threshold": detection.threshold,
        "retained_entries": detection.retained_entries,
        "weight_distribution": detection.distribution,
        "graph_stats": GraphStats::of(&detection.graph),
        "partition_stats": {
            "community_count": partition.len(),
            "total_clustered_nodes": partition.node_count(),
            "largest_community_size": sizes.first().copied().unwrap_or(0),
            "smallest_community_size": sizes.last().copied().unwrap_or(0),
            "avg_community_size": partition.node_count() as f64 /
                                  if partition.is_empty() { 1.0 } else { partition.len() as f64 },
            "quality": quality,
        },
        "communities": summarize_communities(&detection.graph, partition),
    });

    write_json(&summary, path)
}

/// Save the metrics of a threshold sweep
pub fn save_sweep<P: AsRef<Path>>(points: &[SweepPoint], path: P) -> Result<(), WriteError> {
    let path = path.as_ref();
    log::info!("Saving sweep over {} thresholds to {}", points.len(), path.display());

    write_json(&json!({ "thresholds": points }), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Community;
    use std::fs;
    use tempfile::tempdir;

    fn community(id: u32, members: Vec<u32>) -> Community {
        Community {
            id,
            size: members.len(),
            members,
        }
    }

    #[test]
    fn writes_one_row_per_community() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("communities.csv");
        let partition = Partition {
            communities: vec![community(0, vec![1, 4, 7]), community(1, vec![2])],
        };

        write_communities(&partition, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1,4,7\n2\n");
    }

    #[test]
    fn empty_partition_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("communities.csv");
        fs::write(&path, "stale,rows\n").unwrap();

        write_communities(&Partition::default(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn unwritable_path_is_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("communities.csv");

        let err = write_communities(&Partition::default(), &path).unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
    }
}
