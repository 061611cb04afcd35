use super::{dedup_arcs, CsrGraph, LoadOptions};
use anyhow::{bail, ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loads a graph in DIMACS shortest-path text format.
///
/// Comment lines start with `c` (or `%`), the header is `p sp n m`, and arc
/// lines are `a u v w` with 1-based endpoints; weights are ignored.
pub fn load_dimacs(
    path: &Path,
    options: LoadOptions,
    pl: &mut impl ProgressLog,
) -> Result<CsrGraph> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let directed = !options.undirected;

    pl.item_name("line");
    pl.start(format!("Parsing DIMACS graph {}...", path.display()));

    let mut header_parsed = false;
    let mut num_vertices: u32 = 0;
    let mut expected_num_arcs: usize = 0;
    let mut num_self_loops = 0usize;
    let mut arcs: Vec<(u32, u32)> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_number + 1))?;
        pl.light_update();
        if line.trim().is_empty() || line.starts_with('%') || line.starts_with('c') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if !header_parsed {
            ensure!(
                tokens.len() >= 4 && tokens[0] == "p",
                "expected header `p sp n m`, got {:?} (line {})",
                line,
                line_number + 1
            );
            num_vertices = tokens[2]
                .parse()
                .with_context(|| format!("non-numeric vertex count {:?}", tokens[2]))?;
            expected_num_arcs = tokens[3]
                .parse()
                .with_context(|| format!("non-numeric arc count {:?}", tokens[3]))?;
            header_parsed = true;
        } else {
            ensure!(
                tokens.len() >= 4 && tokens[0] == "a",
                "expected arc line `a u v w`, got {:?} (line {})",
                line,
                line_number + 1
            );
            let mut from: u32 = tokens[1]
                .parse::<u32>()
                .with_context(|| format!("non-numeric vertex id {:?}", tokens[1]))?
                .checked_sub(1)
                .with_context(|| "vertex ids are one-based".to_string())?;
            let mut to: u32 = tokens[2]
                .parse::<u32>()
                .with_context(|| format!("non-numeric vertex id {:?}", tokens[2]))?
                .checked_sub(1)
                .with_context(|| "vertex ids are one-based".to_string())?;
            if options.transpose {
                std::mem::swap(&mut from, &mut to);
            }
            ensure!(from < num_vertices, "vertex id {} out of range", from + 1);
            ensure!(to < num_vertices, "vertex id {} out of range", to + 1);
            if from == to {
                num_self_loops += 1;
                continue;
            }
            if !directed && from > to {
                continue;
            }
            arcs.push((from, to));
        }
    }
    pl.done();

    if !header_parsed {
        bail!("no header line found");
    }
    log::info!(
        "{} of {} expected arcs parsed; {} self-loops ignored",
        arcs.len(),
        expected_num_arcs,
        num_self_loops
    );
    if options.dedup_parallel {
        dedup_arcs(&mut arcs);
    }

    Ok(CsrGraph::from_arc_list(num_vertices, &arcs, directed))
}
