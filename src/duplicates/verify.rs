//! Optional byte-for-byte confirmation of hash-equal groups.
//!
//! Hash equality is normally taken as proof of duplication. When the scan is
//! configured with `verify`, each group is additionally split into classes of
//! files whose bytes really are identical. Classes with fewer than two
//! members are dropped, and files that cannot be read are excluded.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use super::groups::DuplicateGroup;
use crate::scanner::hasher::{read_block, MAX_BLOCK_SIZE};
use crate::scanner::HashError;

/// Compare two files byte by byte.
///
/// # Errors
///
/// Returns a [`HashError`] naming whichever file failed first.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, HashError> {
    let mut left = BufReader::new(File::open(a).map_err(blame(a))?);
    let mut right = BufReader::new(File::open(b).map_err(blame(b))?);
    let mut left_buf = vec![0u8; MAX_BLOCK_SIZE];
    let mut right_buf = vec![0u8; MAX_BLOCK_SIZE];

    loop {
        let l = read_block(&mut left, &mut left_buf).map_err(blame(a))?;
        let r = read_block(&mut right, &mut right_buf).map_err(blame(b))?;
        if l != r || left_buf[..l] != right_buf[..r] {
            return Ok(false);
        }
        if l < MAX_BLOCK_SIZE {
            return Ok(true);
        }
    }
}

fn blame(path: &Path) -> impl Fn(io::Error) -> HashError + '_ {
    move |e| HashError::from_io(path.to_path_buf(), e)
}

/// Split one group into byte-identical classes.
///
/// Returns the surviving groups (same key, 2+ members) and the files that
/// could not be read.
#[must_use]
pub fn confirm_group(group: DuplicateGroup) -> (Vec<DuplicateGroup>, Vec<HashError>) {
    let mut classes: Vec<Vec<PathBuf>> = Vec::new();
    let mut errors = Vec::new();

    'paths: for path in group.paths {
        if let Err(e) = File::open(&path) {
            log::warn!("Verification skipped {}: {}", path.display(), e);
            errors.push(HashError::from_io(path, e));
            continue;
        }
        let mut i = 0;
        while i < classes.len() {
            match files_equal(&classes[i][0], &path) {
                Ok(true) => {
                    classes[i].push(path);
                    continue 'paths;
                }
                Ok(false) => i += 1,
                Err(e) if e.path() == path.as_path() => {
                    log::warn!("Verification failed: {}", e);
                    errors.push(e);
                    continue 'paths;
                }
                Err(e) => {
                    // The class reference went bad; the next member takes over.
                    log::warn!("Verification failed: {}", e);
                    errors.push(e);
                    classes[i].remove(0);
                    if classes[i].is_empty() {
                        classes.remove(i);
                    }
                }
            }
        }
        classes.push(vec![path]);
    }

    if classes.len() > 1 {
        log::warn!(
            "Hash collision for {}: {} distinct contents",
            group.key.size,
            classes.len()
        );
    }

    let groups = classes
        .into_iter()
        .filter(|class| class.len() > 1)
        .map(|class| DuplicateGroup::new(group.key.clone(), class))
        .collect();
    (groups, errors)
}

/// Confirm every group, preserving key order.
#[must_use]
pub fn confirm_groups(groups: Vec<DuplicateGroup>) -> (Vec<DuplicateGroup>, Vec<HashError>) {
    let mut confirmed = Vec::with_capacity(groups.len());
    let mut errors = Vec::new();
    for group in groups {
        let (kept, failed) = confirm_group(group);
        confirmed.extend(kept);
        errors.extend(failed);
    }
    (confirmed, errors)
}
