use crate::error::{ConstructionError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Score reported for a listing that carries no popularity value.
pub const DEFAULT_POPULARITY: f64 = 0.5;

/// One row of the ingestion source, before the text blob is resolved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    pub listing_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub text_blob: Option<String>,
}

/// A catalog entry as held by the index. Never mutated after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_id: String,
    pub title: String,
    pub category: String,
    pub text_blob: String,
    pub popularity: Option<f64>,
}

impl ListingRecord {
    pub fn new(listing_id: impl Into<String>, title: impl Into<String>, category: impl Into<String>, text_blob: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            title: title.into(),
            category: category.into(),
            text_blob: text_blob.into(),
            popularity: None,
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    /// Resolve a raw row. A supplied non-empty `text_blob` wins; otherwise the
    /// blob is title, description and tags joined by single spaces.
    pub fn from_raw(raw: RawListing, source: &Path) -> Result<Self> {
        let listing_id = raw.listing_id.trim().to_string();
        if listing_id.is_empty() {
            return Err(ConstructionError::malformed(source, "row without listing_id"));
        }
        if let Some(p) = raw.popularity {
            if !popularity_in_range(p) {
                return Err(ConstructionError::malformed(source, format!("listing {listing_id}: popularity {p} outside [0, 1]")));
            }
        }
        let text_blob = match raw.text_blob {
            Some(blob) if !blob.is_empty() => blob,
            _ => [raw.title.as_str(), raw.description.as_str(), raw.tags.as_str()].join(" "),
        };
        Ok(Self { listing_id, title: raw.title, category: raw.category, text_blob, popularity: raw.popularity })
    }

    pub fn popularity_or_default(&self) -> f64 {
        self.popularity.unwrap_or(DEFAULT_POPULARITY)
    }
}

/// Popularity is a score in [0, 1]; NaN and infinities fall outside it.
pub fn popularity_in_range(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

/// Load listing records from a `.csv`, `.json` or `.jsonl` file, or from every
/// such file under a directory (visited in file-name order).
pub fn load_listings(input: &Path) -> Result<Vec<ListingRecord>> {
    if !input.exists() {
        return Err(ConstructionError::SourceNotFound(input.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && source_kind(p).is_some() {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(input.to_path_buf());
    }

    let mut listings = Vec::new();
    for file in files {
        let rows = match source_kind(&file) {
            Some(SourceKind::Jsonl) => read_jsonl(&file)?,
            Some(SourceKind::Json) => read_json(&file)?,
            // Unknown extensions on an explicitly named file are read as CSV.
            Some(SourceKind::Csv) | None => read_csv(&file)?,
        };
        tracing::debug!(file = %file.display(), rows = rows.len(), "read listing source");
        for raw in rows {
            listings.push(ListingRecord::from_raw(raw, &file)?);
        }
    }
    Ok(listings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Csv,
    Json,
    Jsonl,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => Some(SourceKind::Csv),
        Some("json") => Some(SourceKind::Json),
        Some("jsonl") => Some(SourceKind::Jsonl),
        _ => None,
    }
}

fn read_csv(file: &Path) -> Result<Vec<RawListing>> {
    let mut reader = csv::Reader::from_path(file).map_err(|e| ConstructionError::malformed(file, e))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<RawListing>() {
        rows.push(record.map_err(|e| ConstructionError::malformed(file, e))?);
    }
    Ok(rows)
}

fn read_jsonl(file: &Path) -> Result<Vec<RawListing>> {
    let reader = BufReader::new(File::open(file)?);
    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let raw: RawListing = serde_json::from_str(&line)
            .map_err(|e| ConstructionError::malformed(file, format!("line {}: {e}", lineno + 1)))?;
        rows.push(raw);
    }
    Ok(rows)
}

fn read_json(file: &Path) -> Result<Vec<RawListing>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(|e| ConstructionError::malformed(file, e))?;
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => return Err(ConstructionError::malformed(file, "expected an object or an array of objects")),
    };
    values
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(|e| ConstructionError::malformed(file, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn blob_is_computed_when_absent() {
        let raw = RawListing {
            listing_id: "L1".into(),
            title: "Road bike".into(),
            description: "lightly used".into(),
            tags: "cycling".into(),
            ..Default::default()
        };
        let rec = ListingRecord::from_raw(raw, Path::new("mem")).unwrap();
        assert_eq!(rec.text_blob, "Road bike lightly used cycling");
        assert_eq!(rec.popularity_or_default(), DEFAULT_POPULARITY);
    }

    #[test]
    fn supplied_blob_wins() {
        let raw = RawListing { listing_id: "L1".into(), title: "ignored".into(), text_blob: Some("custom blob".into()), ..Default::default() };
        let rec = ListingRecord::from_raw(raw, Path::new("mem")).unwrap();
        assert_eq!(rec.text_blob, "custom blob");
    }

    #[test]
    fn empty_id_is_rejected() {
        let raw = RawListing { listing_id: "  ".into(), ..Default::default() };
        let err = ListingRecord::from_raw(raw, Path::new("mem")).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedSource { .. }));
    }

    fn with_popularity(p: f64) -> RawListing {
        RawListing { listing_id: "L1".into(), title: "lamp".into(), popularity: Some(p), ..Default::default() }
    }

    #[test]
    fn popularity_above_one_is_rejected() {
        let err = ListingRecord::from_raw(with_popularity(7.5), Path::new("mem")).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedSource { .. }));
    }

    #[test]
    fn negative_popularity_is_rejected() {
        let err = ListingRecord::from_raw(with_popularity(-2.0), Path::new("mem")).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedSource { .. }));
    }

    #[test]
    fn non_finite_popularity_is_rejected() {
        assert!(ListingRecord::from_raw(with_popularity(f64::NAN), Path::new("mem")).is_err());
        assert!(ListingRecord::from_raw(with_popularity(f64::INFINITY), Path::new("mem")).is_err());
    }

    #[test]
    fn popularity_bounds_are_inclusive() {
        assert_eq!(ListingRecord::from_raw(with_popularity(0.0), Path::new("mem")).unwrap().popularity, Some(0.0));
        assert_eq!(ListingRecord::from_raw(with_popularity(1.0), Path::new("mem")).unwrap().popularity, Some(1.0));
    }

    #[test]
    fn out_of_range_popularity_in_csv_fails_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        fs::write(
            &path,
            "listing_id,title,description,tags,category,popularity\n\
             A,Amp,tube amp,music,Audio,7.5\n\
             B,Lessons,guitar,music,Services,-2\n",
        )
        .unwrap();
        let err = load_listings(&path).unwrap_err();
        assert!(matches!(err, ConstructionError::MalformedSource { .. }));
    }

    #[test]
    fn reads_csv_with_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        fs::write(
            &path,
            "listing_id,title,description,tags,category,popularity\n\
             A,Vintage amp,tube amp,music,Audio,0.9\n\
             B,Guitar lessons,,music,Services,\n",
        )
        .unwrap();
        let listings = load_listings(&path).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].popularity, Some(0.9));
        assert_eq!(listings[1].popularity, None);
        assert_eq!(listings[1].text_blob, "Guitar lessons  music");
    }

    #[test]
    fn reads_directory_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jsonl"), "{\"listing_id\":\"B\",\"title\":\"second\"}\n\n").unwrap();
        fs::write(dir.path().join("a.json"), "[{\"listing_id\":\"A\",\"title\":\"first\"}]").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a listing").unwrap();
        let ids: Vec<String> = load_listings(dir.path()).unwrap().into_iter().map(|l| l.listing_id).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn missing_source_is_reported() {
        let err = load_listings(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ConstructionError::SourceNotFound(_)));
    }
}
