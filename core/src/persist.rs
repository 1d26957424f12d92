use crate::error::{ConstructionError, Result};
use crate::index::{Index, SparseVector, TermVectorSpace};
use crate::listing::ListingRecord;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Leading bytes of every artifact file.
pub const MAGIC: &[u8; 8] = b"RECSIDX\0";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub version: u32,
    pub num_listings: u64,
    pub num_terms: u64,
    pub created_at: String,
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    meta: ArtifactMeta,
    terms: &'a [String],
    idf: &'a [f64],
    vectors: &'a [SparseVector],
    listings: &'a [ListingRecord],
}

#[derive(Deserialize)]
struct ArtifactOwned {
    meta: ArtifactMeta,
    terms: Vec<String>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
    listings: Vec<ListingRecord>,
}

/// Write the complete index to a single artifact file.
pub fn save_artifact(path: &Path, index: &Index) -> Result<ArtifactMeta> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let meta = ArtifactMeta {
        version: FORMAT_VERSION,
        num_listings: index.len() as u64,
        num_terms: index.space().dimensions() as u64,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
    };
    let artifact = ArtifactRef {
        meta: meta.clone(),
        terms: index.space().terms(),
        idf: index.space().idf_weights(),
        vectors: index.vectors(),
        listings: index.listings(),
    };
    let mut f = BufWriter::new(File::create(path)?);
    f.write_all(MAGIC)?;
    bincode::serialize_into(&mut f, &artifact).map_err(|e| match *e {
        bincode::ErrorKind::Io(io) => ConstructionError::Io(io),
        other => ConstructionError::CorruptArtifact(format!("encode failed: {other}")),
    })?;
    f.flush()?;
    tracing::info!(path = %path.display(), num_listings = meta.num_listings, num_terms = meta.num_terms, "saved artifact");
    Ok(meta)
}

/// Read an artifact back into an [`Index`] without recomputing any weight.
pub fn load_artifact(path: &Path) -> Result<Index> {
    let buf = read_file(path)?;
    let payload = check_magic(&buf)?;
    let artifact: ArtifactOwned = bincode::deserialize(payload)
        .map_err(|e| ConstructionError::CorruptArtifact(format!("decode failed: {e}")))?;
    check_version(&artifact.meta)?;

    let meta = &artifact.meta;
    if meta.num_terms != artifact.terms.len() as u64 {
        return Err(ConstructionError::CorruptArtifact(format!(
            "header declares {} terms, found {}", meta.num_terms, artifact.terms.len()
        )));
    }
    if meta.num_listings != artifact.listings.len() as u64 {
        return Err(ConstructionError::CorruptArtifact(format!(
            "header declares {} listings, found {}", meta.num_listings, artifact.listings.len()
        )));
    }
    if artifact.idf.iter().any(|w| !w.is_finite()) {
        return Err(ConstructionError::CorruptArtifact("non-finite idf weight".into()));
    }

    let space = TermVectorSpace::from_parts(artifact.terms, artifact.idf)?;
    let index = Index::from_parts(space, artifact.vectors, artifact.listings)?;
    tracing::info!(path = %path.display(), num_listings = index.len(), num_terms = index.space().dimensions(), "loaded artifact");
    Ok(index)
}

/// Load only the artifact header.
pub fn read_artifact_meta(path: &Path) -> Result<ArtifactMeta> {
    let buf = read_file(path)?;
    let payload = check_magic(&buf)?;
    // The header is the first field of the payload, so decoding it alone is valid.
    let meta: ArtifactMeta = bincode::deserialize(payload)
        .map_err(|e| ConstructionError::CorruptArtifact(format!("decode header failed: {e}")))?;
    check_version(&meta)?;
    Ok(meta)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(ConstructionError::SourceNotFound(path.to_path_buf()));
    }
    let mut f = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn check_magic(buf: &[u8]) -> Result<&[u8]> {
    match buf.strip_prefix(MAGIC.as_slice()) {
        Some(payload) => Ok(payload),
        None => Err(ConstructionError::CorruptArtifact("missing artifact magic".into())),
    }
}

fn check_version(meta: &ArtifactMeta) -> Result<()> {
    if meta.version != FORMAT_VERSION {
        return Err(ConstructionError::CorruptArtifact(format!(
            "unsupported artifact version {} (expected {FORMAT_VERSION})", meta.version
        )));
    }
    Ok(())
}
