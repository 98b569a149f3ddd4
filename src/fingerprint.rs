use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::chunking::{file_extension, relative_path, walk_candidate_files, Loader};

/// SHA-256 over every allow-listed file under `root`: its relative path,
/// byte length and contents, in walk order.
///
/// Two snapshots with the same fingerprint chunk identically, so an index
/// built from one can answer questions about the other.
pub fn repository_fingerprint(root: &Path) -> String {
    let mut hasher = Sha256::new();
    let mut files = 0usize;

    for path in walk_candidate_files(root) {
        let indexable = file_extension(&path)
            .and_then(|ext| Loader::for_extension(&ext))
            .is_some();
        if !indexable {
            continue;
        }

        hasher.update(relative_path(root, &path).as_bytes());
        hasher.update([0u8]);
        if let Err(e) = hash_file(&path, &mut hasher) {
            tracing::warn!("Fingerprint could not read {}: {e}", path.display());
            // Unreadable files still change the digest by name
            hasher.update(b"\xffunreadable");
        }
        files += 1;
    }

    let digest = format!("{:x}", hasher.finalize());
    tracing::debug!("Fingerprinted {files} files under {}: {digest}", root.display());
    digest
}

/// Length then contents, streamed so large files never sit in memory.
fn hash_file(path: &Path, hasher: &mut Sha256) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    hasher.update(file.metadata()?.len().to_le_bytes());
    std::io::copy(&mut file, hasher)?;
    Ok(())
}
