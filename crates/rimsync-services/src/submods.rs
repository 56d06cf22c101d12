//! Target path resolution for logical files of a mod and its submodules.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rimsync_core::{LogicalFile, NamingOption};
use rimsync_domain::Issue;

use crate::issues::{issue, IssueKind};
use crate::util::path_key;

#[derive(Debug, Clone, Default)]
pub struct TargetPlan {
    /// One target per input file, same order.
    pub targets: Vec<PathBuf>,
    pub warnings: Vec<Issue>,
}

/// Decorate a file name with `tag` as prefix (`tag_name.xml`) or suffix
/// (`name_tag.xml`).
pub fn decorate_file_name(name: &str, tag: &str, naming: NamingOption) -> String {
    match naming {
        NamingOption::None => name.to_string(),
        NamingOption::Prefix => format!("{tag}_{name}"),
        NamingOption::Suffix => match name.rfind('.') {
            Some(dot) if dot > 0 => format!("{}_{tag}{}", &name[..dot], &name[dot..]),
            _ => format!("{name}_{tag}"),
        },
    }
}

/// True if `name` already carries `tag` in the given position.
pub fn has_tag(name: &str, tag: &str, naming: NamingOption) -> bool {
    let name = name.to_lowercase();
    let tag = tag.to_lowercase();
    match naming {
        NamingOption::None => false,
        NamingOption::Prefix => name.starts_with(&format!("{tag}_")),
        NamingOption::Suffix => {
            let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&name);
            stem.ends_with(&format!("_{tag}"))
        }
    }
}

/// `Misc.xml` → `Misc_2.xml`
pub fn numbered(path: &Path, n: usize) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let numbered = decorate_file_name(&name, &n.to_string(), NamingOption::Suffix);
    path.with_file_name(numbered)
}

/// Compute unique target paths below `lang_root` (`.../Languages/<lang>`).
///
/// Main-mod files keep their names; submodule files are decorated with the
/// submodule tag. Two submodule roots sharing an id get `id_2`, `id_3`, ...
/// and any remaining clash gets a numeric suffix, both with a warning.
pub fn resolve_targets(files: &[LogicalFile], naming: NamingOption, lang_root: &Path) -> TargetPlan {
    let mut plan = TargetPlan::default();
    let mut tags: HashMap<PathBuf, String> = HashMap::new();
    let mut taken_tags: HashSet<String> = HashSet::new();
    let mut taken_paths: HashSet<String> = HashSet::new();

    for file in files {
        let tag = file.submodule.as_ref().map(|sub| {
            tags.entry(sub.root.clone())
                .or_insert_with(|| {
                    let mut tag = sub.id.clone();
                    let mut n = 2;
                    while !taken_tags.insert(tag.to_lowercase()) {
                        tag = format!("{}_{n}", sub.id);
                        n += 1;
                    }
                    if tag != sub.id {
                        plan.warnings.push(issue(
                            IssueKind::NamingCollision,
                            &sub.root,
                            format!("submodule id '{}' is used twice; tagging as '{tag}'", sub.id),
                        ));
                    }
                    tag
                })
                .clone()
        });

        let name = file
            .rel_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match &tag {
            Some(tag) => decorate_file_name(&name, tag, naming),
            None => name,
        };
        let rel = match file.rel_path.parent() {
            Some(parent) => parent.join(&name),
            None => PathBuf::from(&name),
        };
        let base = lang_root.join(file.category.rel_dir()).join(rel);

        let mut target = base.clone();
        let mut n = 2;
        while !taken_paths.insert(path_key(&target)) {
            target = numbered(&base, n);
            n += 1;
        }
        if target != base {
            plan.warnings.push(issue(
                IssueKind::NamingCollision,
                &base,
                format!("{} also maps here; writing {}", file.owner_id(), target.display()),
            ));
        }
        plan.targets.push(target);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rimsync_core::{Category, SubmoduleRef};

    fn keyed(sub: Option<(&str, &str)>, rel: &str) -> LogicalFile {
        LogicalFile {
            mod_id: "CoreExpanded".into(),
            submodule: sub.map(|(id, root)| SubmoduleRef {
                id: id.into(),
                root: PathBuf::from(root),
            }),
            category: Category::Keyed,
            rel_path: PathBuf::from(rel),
            source_path: PathBuf::from(rel),
        }
    }

    fn names(plan: &TargetPlan, root: &Path) -> Vec<String> {
        plan.targets
            .iter()
            .map(|t| t.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn prefix_and_suffix_decorate_submodules_only() {
        let root = Path::new("L");
        let files = [keyed(None, "Misc.xml"), keyed(Some(("Balance", "Mods/Balance")), "ui/Misc.xml")];
        let p = resolve_targets(&files, NamingOption::Prefix, root);
        assert_eq!(names(&p, root), vec!["Keyed/Misc.xml", "Keyed/ui/Balance_Misc.xml"]);
        let s = resolve_targets(&files, NamingOption::Suffix, root);
        assert_eq!(names(&s, root), vec!["Keyed/Misc.xml", "Keyed/ui/Misc_Balance.xml"]);
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn shared_submodule_ids_get_numbered_tags() {
        let root = Path::new("L");
        let files = [
            keyed(Some(("Extra", "Mods/Extra")), "Misc.xml"),
            keyed(Some(("extra", "1.5/Mods/extra")), "Misc.xml"),
        ];
        let p = resolve_targets(&files, NamingOption::Suffix, root);
        assert_eq!(names(&p, root), vec!["Keyed/Misc_Extra.xml", "Keyed/Misc_extra_2.xml"]);
        assert_eq!(p.warnings.len(), 1);
        assert_eq!(p.warnings[0].kind, "naming_collision");
    }

    #[test]
    fn remaining_clashes_are_numbered() {
        let root = Path::new("L");
        // main file already named like the decorated submodule file
        let files = [
            keyed(None, "Misc_Balance.xml"),
            keyed(Some(("Balance", "Mods/Balance")), "Misc.xml"),
            keyed(Some(("Balance", "Mods/Balance")), "MISC.xml"),
        ];
        let p = resolve_targets(&files, NamingOption::Suffix, root);
        assert_eq!(
            names(&p, root),
            vec!["Keyed/Misc_Balance.xml", "Keyed/Misc_Balance_2.xml", "Keyed/MISC_Balance_3.xml"]
        );
        assert_eq!(p.warnings.len(), 2);
        let p = resolve_targets(&files, NamingOption::None, root);
        assert_eq!(
            names(&p, root),
            vec!["Keyed/Misc_Balance.xml", "Keyed/Misc.xml", "Keyed/MISC_2.xml"]
        );
    }

    #[test]
    fn tag_detection() {
        assert!(has_tag("Balance_Misc.xml", "balance", NamingOption::Prefix));
        assert!(has_tag("Misc_Balance.xml", "Balance", NamingOption::Suffix));
        assert!(!has_tag("Misc_Balance.xml", "Balance", NamingOption::Prefix));
        assert_eq!(numbered(Path::new("a/Misc.xml"), 3), PathBuf::from("a/Misc_3.xml"));
    }
}
