use anyhow::{Context, Result};
use featsync_error::FeatsyncError;
use std::io::{Cursor, Read, Write};
use std::path::Path;

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Parts of an OPC package, written in insertion order.
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.parts.push((name.into(), content.into()));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts: zip::write::FileOptions<()> = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);
        for (name, content) in &self.parts {
            zip.start_file(name.as_str(), opts)
                .with_context(|| format!("start part {name}"))?;
            zip.write_all(content)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
    }
}

/// Content of one part of a saved package.
pub fn read_part(package: &[u8], name: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(package))
        .map_err(|e| FeatsyncError::malformed_input(format!("not a zip package: {e}")))?;
    let mut file = archive
        .by_name(name)
        .map_err(|_| FeatsyncError::not_found(format!("no part {name}")))?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}
