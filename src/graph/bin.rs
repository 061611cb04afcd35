use super::{CsrGraph, MAX_VERTEX_ID};
use dsi_progress_logger::ProgressLog;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAGIC: u32 = 0x1234_1234;

const TAG_VERTEX_META: u8 = 0;
const TAG_ARC: u8 = 2;

/// Structural errors of the binary graph format.
#[derive(Error, Debug)]
pub enum GraphFileError {
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    #[error("unknown entity tag {0}")]
    UnknownEntity(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The on-disk header. Laid out as the C struct it originates from: magic,
/// directedness byte padded to four, then vertex, arc, and the three
/// metadata-size fields as little-endian 64-bit words (48 bytes in total).
struct FileHeader {
    directed: bool,
    num_vertices: u64,
    num_arcs: u64,
    graph_meta_size: u64,
    vertex_meta_size: u64,
    arc_meta_size: u64,
}

fn read_u32(reader: &mut impl Read) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_u8(reader: &mut impl Read) -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn skip(reader: &mut impl Read, num_bytes: u64) -> std::io::Result<()> {
    std::io::copy(&mut reader.take(num_bytes), &mut std::io::sink())?;
    Ok(())
}

impl FileHeader {
    fn read(reader: &mut impl Read) -> Result<Self, GraphFileError> {
        let magic = read_u32(reader)?;
        if magic != MAGIC {
            return Err(GraphFileError::BadMagic(magic));
        }
        let directed = read_u8(reader)? != 0;
        skip(reader, 3)?;
        Ok(FileHeader {
            directed,
            num_vertices: read_u64(reader)?,
            num_arcs: read_u64(reader)?,
            graph_meta_size: read_u64(reader)?,
            vertex_meta_size: read_u64(reader)?,
            arc_meta_size: read_u64(reader)?,
        })
    }

    fn write(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writer.write_all(&MAGIC.to_le_bytes())?;
        writer.write_all(&[self.directed as u8, 0, 0, 0])?;
        writer.write_all(&self.num_vertices.to_le_bytes())?;
        writer.write_all(&self.num_arcs.to_le_bytes())?;
        writer.write_all(&self.graph_meta_size.to_le_bytes())?;
        writer.write_all(&self.vertex_meta_size.to_le_bytes())?;
        writer.write_all(&self.arc_meta_size.to_le_bytes())?;
        Ok(())
    }
}

/// The on-disk name appends `.gr` to the given path.
fn gr_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gr");
    PathBuf::from(name)
}

/// Reads a binary graph from `<path>.gr`.
///
/// The file is a header followed by a stream of tagged entities; metadata
/// entities are skipped using the sizes declared in the header. Directedness
/// comes from the header, and undirected files store each edge once with the
/// smaller endpoint first.
pub fn read_binary(path: &Path, pl: &mut impl ProgressLog) -> Result<CsrGraph, GraphFileError> {
    let mut reader = BufReader::new(File::open(gr_path(path))?);
    let header = FileHeader::read(&mut reader)?;
    assert!(
        header.num_vertices <= MAX_VERTEX_ID as u64,
        "vertex count {} does not fit 30-bit ids",
        header.num_vertices
    );
    skip(&mut reader, header.graph_meta_size)?;

    pl.item_name("arc");
    pl.expected_updates(Some(header.num_arcs as usize));
    pl.start(format!("Reading binary graph {}...", gr_path(path).display()));

    let mut arcs = Vec::with_capacity(header.num_arcs as usize);
    while (arcs.len() as u64) < header.num_arcs {
        match read_u8(&mut reader)? {
            TAG_ARC => {
                let from = read_u32(&mut reader)?;
                let to = read_u32(&mut reader)?;
                skip(&mut reader, header.arc_meta_size)?;
                arcs.push((from, to));
                pl.light_update();
            }
            TAG_VERTEX_META => skip(&mut reader, header.vertex_meta_size)?,
            tag => return Err(GraphFileError::UnknownEntity(tag)),
        }
    }
    pl.done();

    Ok(CsrGraph::from_arc_list(
        header.num_vertices as u32,
        &arcs,
        header.directed,
    ))
}

/// Writes a graph to `<path>.gr`, one tagged entity per input arc.
///
/// Directed graphs emit every forward arc; undirected graphs emit each edge
/// once, smaller endpoint first, so that [`read_binary`] accepts the file.
pub fn write_binary(graph: &CsrGraph, path: &Path) -> Result<(), GraphFileError> {
    let directed = graph.is_directed();
    let mut num_arcs = 0u64;
    for u in 0..graph.num_vertices() as u32 {
        for arc in graph.forward_arcs(u) {
            if directed || u < arc.other_vertex() {
                num_arcs += 1;
            }
        }
    }

    let mut writer = BufWriter::new(File::create(gr_path(path))?);
    FileHeader {
        directed,
        num_vertices: graph.num_vertices() as u64,
        num_arcs,
        graph_meta_size: 0,
        vertex_meta_size: 0,
        arc_meta_size: 0,
    }
    .write(&mut writer)?;

    for u in 0..graph.num_vertices() as u32 {
        for arc in graph.forward_arcs(u) {
            if directed || u < arc.other_vertex() {
                writer.write_all(&[TAG_ARC])?;
                writer.write_all(&u.to_le_bytes())?;
                writer.write_all(&arc.other_vertex().to_le_bytes())?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
