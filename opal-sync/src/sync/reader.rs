//! Remote reader: every record in the notes API, as `Note`s.

use crate::error::Result;
use crate::notes::model::NOTE_EXTENSION;
use crate::notes::{FileStore, Note, NoteFile, listing, title};
use crate::remote::NotesApi;
use std::collections::{BTreeSet, HashMap, HashSet};

/// List remote notes, giving each one a distinct file name in `folder`.
///
/// The first record carrying a title keeps it. A record without a title, or
/// whose title an earlier record already claimed, keeps the name of the local
/// file already synced to it; otherwise it gets a ` (n)` name (derived from its
/// content when untitled) that collides with neither a local file in `folder`
/// nor a name handed out earlier in this listing.
pub async fn list_notes(api: &dyn NotesApi, store: &dyn FileStore, folder: &str) -> Result<Vec<Note>> {
    let files = listing::list_folder_files(store, folder).await?;
    let records = api.list_records().await?;

    let mut existing: BTreeSet<String> = files.iter().map(|file| file.name.clone()).collect();
    let mut claimed = HashSet::new();
    let keeps_title: Vec<bool> = records
        .iter()
        .map(|record| match titled(record.title.as_deref()) {
            Some(title) => {
                let name = file_name(title);
                existing.insert(name.clone());
                claimed.insert(name)
            }
            None => false,
        })
        .collect();

    let synced = if keeps_title.contains(&false) {
        synced_basenames(store, &files).await
    } else {
        HashMap::new()
    };

    let notes = records
        .into_iter()
        .zip(keeps_title)
        .map(|(record, keeps)| {
            let own_title = titled(record.title.as_deref()).map(str::to_string);
            let title = match (own_title, keeps) {
                (Some(title), true) => title,
                (own_title, _) => match synced.get(&record.id) {
                    Some(basename) if !claimed.contains(&file_name(basename)) => basename.clone(),
                    _ => {
                        let name = match &own_title {
                            Some(title) => title::unique_file_name(title, &existing),
                            None => title::resolve_title(&record.content, &existing),
                        };
                        existing.insert(name.clone());
                        let resolved = name
                            .strip_suffix(&format!(".{}", NOTE_EXTENSION))
                            .unwrap_or(&name)
                            .to_string();
                        log::debug!("[REMOTE] Record {} named '{}'", record.id, resolved);
                        resolved
                    }
                },
            };
            Note::from_record(record, title)
        })
        .collect::<Vec<_>>();

    log::info!("[REMOTE] {} notes in remote store", notes.len());
    Ok(notes)
}

/// The trimmed title, when the record has a non-blank one
fn titled(title: Option<&str>) -> Option<&str> {
    title.map(str::trim).filter(|t| !t.is_empty())
}

fn file_name(basename: &str) -> String {
    format!("{}.{}", basename, NOTE_EXTENSION)
}

/// Remote id → basename of the local file whose frontmatter carries it
async fn synced_basenames(store: &dyn FileStore, files: &[NoteFile]) -> HashMap<String, String> {
    let mut synced = HashMap::new();
    for file in files {
        match store.frontmatter(&file.path).await {
            Ok(Some(fm)) => {
                if let Some(id) = fm.id() {
                    synced.entry(id).or_insert_with(|| file.basename.clone());
                }
            }
            Ok(None) => {}
            Err(e) => log::debug!("[REMOTE] Skipping {} while matching ids: {}", file.path, e),
        }
    }
    synced
}
