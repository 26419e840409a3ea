//! Research Object bundle export.
//!
//! A bundle is a zip archive: an uncompressed `mimetype` entry first,
//! then `.ro/manifest.json` listing the aggregated resources, the
//! investigation as JSON and one JSON file per study.

use std::io::{Cursor, Write};

use serde_json::json;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use isahub_core::now_rfc3339;

use crate::model::{Investigation, Study};

/// Media type of a Research Object bundle.
pub const RO_BUNDLE_CONTENT_TYPE: &str = "application/vnd.wf4ever.robundle+zip";

const MANIFEST_PATH: &str = ".ro/manifest.json";
const BUNDLE_CONTEXT: &str = "https://w3id.org/bundle/context";

#[derive(Debug, Error)]
#[error("bundle export failed: {0}")]
pub struct ExportError(pub String);

impl From<zip::result::ZipError> for ExportError {
    fn from(e: zip::result::ZipError) -> Self {
        ExportError(e.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError(e.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError(e.to_string())
    }
}

/// Packs an investigation and its studies into an RO bundle archive.
pub trait BundleExporter: Send + Sync {
    fn export(&self, investigation: &Investigation, studies: &[Study]) -> Result<Vec<u8>, ExportError>;
}

/// Download file name of an investigation's bundle.
pub fn bundle_filename(investigation_id: &str) -> String {
    format!("investigation-{}.ro.zip", investigation_id)
}

/// Writes bundles with the `zip` crate.
#[derive(Debug, Default)]
pub struct ZipBundleExporter;

impl BundleExporter for ZipBundleExporter {
    fn export(&self, investigation: &Investigation, studies: &[Study]) -> Result<Vec<u8>, ExportError> {
        let mut entries = vec![(
            "investigation.json".to_string(),
            serde_json::to_vec_pretty(investigation)?,
        )];
        for study in studies {
            entries.push((
                format!("studies/{}.json", study.id),
                serde_json::to_vec_pretty(study)?,
            ));
        }

        let manifest = json!({
            "@context": [BUNDLE_CONTEXT],
            "id": "/",
            "createdOn": now_rfc3339(),
            "aggregates": entries
                .iter()
                .map(|(path, _)| json!({"uri": format!("/{}", path), "mediatype": "application/json"}))
                .collect::<Vec<_>>(),
        });

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        // mimetype must come first and stay uncompressed
        zip.start_file(
            "mimetype",
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )?;
        zip.write_all(RO_BUNDLE_CONTENT_TYPE.as_bytes())?;

        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(MANIFEST_PATH, deflated)?;
        zip.write_all(&serde_json::to_vec_pretty(&manifest)?)?;
        for (path, body) in entries {
            zip.start_file(path, deflated)?;
            zip.write_all(&body)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use zip::ZipArchive;

    use super::*;
    use crate::model::Policy;

    fn investigation() -> Investigation {
        Investigation {
            id: "i1".into(),
            title: "Growth curves".into(),
            description: None,
            project_ids: vec!["p1".into()],
            contributor_id: "owner".into(),
            creator_ids: vec![],
            other_creators: None,
            policy: Policy::default(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
            updated_at: "2024-01-01T00:00:00+00:00".into(),
        }
    }

    fn study(id: &str) -> Study {
        Study {
            id: id.into(),
            investigation_id: "i1".into(),
            title: format!("Study {}", id),
            description: None,
            contributor_id: "owner".into(),
            created_at: "2024-01-02T00:00:00+00:00".into(),
            updated_at: "2024-01-02T00:00:00+00:00".into(),
        }
    }

    fn read(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_bundle_layout() {
        let bytes = ZipBundleExporter
            .export(&investigation(), &[study("s1"), study("s2")])
            .unwrap();
        assert!(bytes.len() > 10);

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 5);
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }
        assert_eq!(read(&mut archive, "mimetype"), RO_BUNDLE_CONTENT_TYPE);

        let manifest: serde_json::Value =
            serde_json::from_str(&read(&mut archive, ".ro/manifest.json")).unwrap();
        let uris: Vec<&str> = manifest["aggregates"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["uri"].as_str().unwrap())
            .collect();
        assert_eq!(
            uris,
            vec!["/investigation.json", "/studies/s1.json", "/studies/s2.json"]
        );

        let inv: Investigation =
            serde_json::from_str(&read(&mut archive, "investigation.json")).unwrap();
        assert_eq!(inv, investigation());
        let s: Study = serde_json::from_str(&read(&mut archive, "studies/s2.json")).unwrap();
        assert_eq!(s.title, "Study s2");
    }

    #[test]
    fn test_bundle_without_studies() {
        let bytes = ZipBundleExporter.export(&investigation(), &[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
    }

    #[test]
    fn test_bundle_filename() {
        assert_eq!(bundle_filename("abc"), "investigation-abc.ro.zip");
    }
}
