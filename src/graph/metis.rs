use super::{dedup_arcs, CsrGraph, LoadOptions};
use anyhow::{bail, ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loads a graph in METIS text format.
///
/// The first non-comment line is the header `n m [fmt]`; line i + 1 then
/// lists the 1-based neighbor ids of vertex i. Lines starting with `%` are
/// comments; empty adjacency lines still advance the current vertex.
/// Self-loops are dropped. For undirected builds each edge, which the format
/// lists at both endpoints, is kept once.
pub fn load_metis(path: &Path, options: LoadOptions, pl: &mut impl ProgressLog) -> Result<CsrGraph> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let directed = !options.undirected;

    pl.item_name("line");
    pl.start(format!("Parsing METIS graph {}...", path.display()));

    let mut header_parsed = false;
    let mut num_vertices: u32 = 0;
    let mut from: u32 = 0;
    let mut arcs: Vec<(u32, u32)> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_number + 1))?;
        pl.light_update();
        if line.starts_with('%') {
            continue;
        }
        if !header_parsed {
            if line.trim().is_empty() {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            ensure!(
                tokens.len() >= 2,
                "header needs at least vertex and edge counts (line {})",
                line_number + 1
            );
            num_vertices = tokens[0]
                .parse()
                .with_context(|| format!("non-numeric vertex count {:?}", tokens[0]))?;
            header_parsed = true;
        } else {
            if !line.trim().is_empty() {
                ensure!(
                    from < num_vertices,
                    "more adjacency lines than the {} declared vertices",
                    num_vertices
                );
                for token in line.split_whitespace() {
                    let id: u32 = token
                        .parse()
                        .with_context(|| format!("non-numeric neighbor id {:?} on line {}", token, line_number + 1))?;
                    // Ids in the file are one-based.
                    ensure!(id >= 1 && id <= num_vertices, "neighbor id {} out of range", id);
                    let to = id - 1;
                    if from == to {
                        continue;
                    }
                    if options.transpose {
                        if directed || to <= from {
                            arcs.push((to, from));
                        }
                    } else if directed || from <= to {
                        arcs.push((from, to));
                    }
                }
            }
            from += 1;
        }
    }
    pl.done();

    if !header_parsed {
        bail!("no header line found");
    }
    if options.dedup_parallel {
        dedup_arcs(&mut arcs);
    }

    Ok(CsrGraph::from_arc_list(num_vertices, &arcs, directed))
}
