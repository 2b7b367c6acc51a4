use parity_core::{ParityError, Transcript, TranscriptEntry};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory holding all parity state for a project: `{root}/.parity/`
pub fn parity_dir(root: &Path) -> PathBuf {
    root.join(".parity")
}

/// Default baseline location: `{root}/.parity/baseline.json`
pub fn default_baseline_path(root: &Path) -> PathBuf {
    parity_dir(root).join("baseline.json")
}

/// Run event log location: `{root}/.parity/runs/events.jsonl`
pub fn run_log_path(root: &Path) -> PathBuf {
    parity_dir(root).join("runs").join("events.jsonl")
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

// ── Transcripts ──

/// File name for a saved transcript: `{source}-seed{seed}.json`.
pub fn transcript_file_name(t: &Transcript) -> String {
    match t.metadata.seed {
        Some(seed) => format!("{}-seed{seed}.json", t.source),
        None => {
            let short: String = t.id.chars().take(8).collect();
            format!("{}-{short}.json", t.source)
        }
    }
}

/// Save the entries of a transcript as a JSON array for offline diffing.
pub fn save_transcript(dir: &Path, t: &Transcript) -> anyhow::Result<PathBuf> {
    let path = dir.join(transcript_file_name(t));
    let data = serde_json::to_string_pretty(&t.entries)?;
    write_atomic(&path, data.as_bytes())?;
    Ok(path)
}

/// Load a JSON array of transcript entries. Unknown or missing fields and
/// non-contiguous indices are rejected.
pub fn load_transcript_entries(path: &Path) -> Result<Vec<TranscriptEntry>, ParityError> {
    let content = fs::read_to_string(path)?;
    parse_transcript_entries(&content)
}

pub fn parse_transcript_entries(content: &str) -> Result<Vec<TranscriptEntry>, ParityError> {
    let entries: Vec<TranscriptEntry> =
        serde_json::from_str(content).map_err(|e| ParityError::MalformedTranscript {
            reason: e.to_string(),
        })?;
    if let Some((i, e)) = entries.iter().enumerate().find(|(i, e)| e.index != *i) {
        return Err(ParityError::MalformedTranscript {
            reason: format!("entry at position {i} has index {}", e.index),
        });
    }
    Ok(entries)
}
