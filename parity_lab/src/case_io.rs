use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cpu::ZetaCase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSet {
    pub label: String,
    pub cases: Vec<ZetaCase>,
}

impl CaseSet {
    pub fn new(label: impl Into<String>, cases: Vec<ZetaCase>) -> Self {
        Self {
            label: label.into(),
            cases,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Accepts either labeled sets or a bare array of cases.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Sets(Vec<CaseSet>),
    Bare(Vec<ZetaCase>),
}

/// Writes labeled case sets to JSON so other runners can consume them.
pub fn export_case_sets_to_json<P: AsRef<Path>>(sets: &[CaseSet], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(sets).context("failed to serialize case sets")?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write cases JSON to {}", path.as_ref().display()))?;
    Ok(())
}

pub fn import_case_sets_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<CaseSet>> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read cases JSON {}", path.as_ref().display()))?;
    parse_case_sets(&text)
        .with_context(|| format!("malformed cases JSON {}", path.as_ref().display()))
}

pub fn parse_case_sets(text: &str) -> Result<Vec<CaseSet>> {
    let document: Document = serde_json::from_str(text)?;
    Ok(match document {
        Document::Sets(sets) => sets,
        Document::Bare(cases) => vec![CaseSet::new("imported", cases)],
    })
}
