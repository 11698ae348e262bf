//! Pure helpers behind the file/path browser.
//!
//! The interactive descend/select loop lives in the frontend; what
//! lives here is the part worth testing, the listing order and the
//! create-mode path composition.

use shepherd_api::DirItem;

/// Extension carried by vault files.
pub const VAULT_EXT: &str = ".shpd";

/// File name used when the user types nothing in create mode.
pub const DEFAULT_VAULT_FILE: &str = "vault.shpd";

/// Sort a listing for display: directories before files, then by name,
/// case-insensitively with a deterministic case tiebreak.
pub fn sort_listing(items: &mut [DirItem]) {
    items.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Compose the final vault path in create mode: the chosen directory
/// joined with the typed file name, suffixed with [`VAULT_EXT`] exactly
/// once. An empty name falls back to [`DEFAULT_VAULT_FILE`].
#[must_use]
pub fn compose_create_path(dir: &str, typed_name: &str) -> String {
    let file = if typed_name.is_empty() {
        DEFAULT_VAULT_FILE.to_owned()
    } else if typed_name.ends_with(VAULT_EXT) {
        typed_name.to_owned()
    } else {
        format!("{typed_name}{VAULT_EXT}")
    };

    if dir.ends_with('/') {
        format!("{dir}{file}")
    } else {
        format!("{dir}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, is_dir: bool) -> DirItem {
        DirItem {
            name: name.to_owned(),
            path: format!("/home/u/{name}"),
            is_dir,
        }
    }

    #[test]
    fn directories_sort_before_files() {
        let mut items = vec![item("B", true), item("a", false), item("A", true)];
        sort_listing(&mut items);
        let order: Vec<(&str, bool)> = items.iter().map(|i| (i.name.as_str(), i.is_dir)).collect();
        assert_eq!(order, vec![("A", true), ("B", true), ("a", false)]);
    }

    #[test]
    fn names_sort_case_insensitively() {
        let mut items = vec![
            item("work.shpd", false),
            item("Backup.shpd", false),
            item("archive.shpd", false),
        ];
        sort_listing(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["archive.shpd", "Backup.shpd", "work.shpd"]);
    }

    #[test]
    fn case_tiebreak_is_deterministic() {
        let mut items = vec![item("vault", true), item("Vault", true)];
        sort_listing(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Vault", "vault"]);
    }

    #[test]
    fn compose_appends_extension() {
        assert_eq!(compose_create_path("/home/u", "vault"), "/home/u/vault.shpd");
    }

    #[test]
    fn compose_does_not_double_extension() {
        assert_eq!(
            compose_create_path("/home/u", "vault.shpd"),
            "/home/u/vault.shpd"
        );
    }

    #[test]
    fn compose_handles_trailing_slash() {
        assert_eq!(compose_create_path("/home/u/", "work"), "/home/u/work.shpd");
    }

    #[test]
    fn compose_defaults_empty_name() {
        assert_eq!(compose_create_path("/home/u", ""), "/home/u/vault.shpd");
    }
}
