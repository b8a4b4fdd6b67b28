use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::app::NoteService;

pub fn handle_add(
    service: &mut NoteService,
    id: String,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("Either --text or --file is required"),
    };

    if text.trim().is_empty() {
        bail!("Note text is empty");
    }

    service.add_note(&id, &text)?;
    println!("Added note '{}'", id);
    Ok(())
}

pub fn handle_search(service: &NoteService, query: String, top_k: Option<usize>) -> Result<()> {
    let hits = match service.search(&query, top_k) {
        Ok(hits) => hits,
        Err(e) if e.is_provider_unavailable() => {
            bail!("{}. Enable dense search in config.yaml or check the model cache", e)
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

pub fn handle_list(service: &NoteService) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&service.note_ids())?);
    Ok(())
}

pub fn handle_remove(service: &mut NoteService, id: String) -> Result<()> {
    service.remove_note(&id)?;
    println!("Removed note '{}'", id);
    Ok(())
}

pub fn handle_rebuild(service: &mut NoteService) -> Result<()> {
    let report = service.rebuild()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn handle_stats(service: &NoteService) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&service.stats())?);
    Ok(())
}
