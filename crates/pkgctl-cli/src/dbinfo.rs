//! The one on-disk artifact this driver reads directly rather than
//! delegating to the back-end: `<dbpath>/<repo>/.lastupdate` (spec §6),
//! a 14-character `YYYYMMDDHHMMSS` timestamp written by a prior sync.
//! Grounded on `original_source/src/pacman/db.c`'s `db_getlastupdate`.

use std::path::Path;

/// Read the last-sync timestamp for `repo`. Returns `None` if the file is
/// missing, unreadable, or not a well-formed 14-digit timestamp — the same
/// "not there yet" treatment the original gives a database that has never
/// been synced.
#[must_use]
pub fn read_lastupdate(db_path: &str, repo: &str) -> Option<String> {
    let path = Path::new(db_path).join(repo).join(".lastupdate");
    let contents = std::fs::read_to_string(path).ok()?;
    let ts = contents.trim();
    (ts.len() == 14 && ts.chars().all(|c| c.is_ascii_digit())).then(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_well_formed_timestamp() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join("core");
        std::fs::create_dir_all(&repo_dir).unwrap();
        let mut f = std::fs::File::create(repo_dir.join(".lastupdate")).unwrap();
        f.write_all(b"20260115093000").unwrap();
        assert_eq!(
            read_lastupdate(dir.path().to_str().unwrap(), "core"),
            Some("20260115093000".to_string())
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(read_lastupdate(dir.path().to_str().unwrap(), "core"), None);
    }

    #[test]
    fn malformed_timestamp_is_none() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join("core");
        std::fs::create_dir_all(&repo_dir).unwrap();
        let mut f = std::fs::File::create(repo_dir.join(".lastupdate")).unwrap();
        f.write_all(b"not-a-timestamp").unwrap();
        assert_eq!(read_lastupdate(dir.path().to_str().unwrap(), "core"), None);
    }
}
