//! Capability catalog
//!
//! The declarative table of API surface points to instrument. A document is
//! loaded once and normalized into a flat list of [`CatalogEntry`] values,
//! each with explicit targets, names, label and options, so the initializer
//! runs one loop with no shape sniffing.
//!
//! Target precedence for method and getter entries: the group's `targets`
//! list, then the entry's own `target`, then the group's single `target`.
//! Label precedence: the entry's `api`, then the group's, then
//! [`FALLBACK_API`].

mod document;

use crate::error::CatalogError;
use document::{ConstructorDoc, GroupDoc, MemberDoc};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Label used when neither entry nor group names one.
pub const FALLBACK_API: &str = "unknown";

/// The catalog shipped with the crate.
pub const BUILTIN_CATALOG: &str = include_str!("default.json");

// ============================================================================
// Normalized entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Method,
    Getter,
    Constructor,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Method => "method",
            EntryKind::Getter => "getter",
            EntryKind::Constructor => "constructor",
        };
        f.write_str(name)
    }
}

/// Hook `method` on whatever a hooked method returns, under label `api`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnReturnHook {
    pub method: String,
    pub api: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_callback_arg: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_return: Option<OnReturnHook>,
    /// Hook on the resolved target, not its `prototype`.
    #[serde(rename = "static", skip_serializing_if = "std::ops::Not::not")]
    pub static_member: bool,
}

/// One normalized catalog entry.
///
/// `targets` are dotted paths resolved from the global object at
/// initialization time. Constructor entries have none; their names are
/// global bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub group: String,
    pub kind: EntryKind,
    pub targets: Vec<String>,
    pub names: Vec<String>,
    pub api: String,
    pub options: EntryOptions,
}

impl CatalogEntry {
    /// Number of `(target, name)` pairs this entry expands to.
    pub fn pair_count(&self) -> usize {
        match self.kind {
            EntryKind::Constructor => self.names.len(),
            _ => self.targets.len() * self.names.len(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The built-in browser catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let groups: Vec<GroupDoc> = serde_json::from_str(json)?;
        let mut entries = Vec::new();
        for group in groups {
            normalize_group(group, &mut entries)?;
        }
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// A catalog from already-normalized entries.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Entries in declared order: groups as listed, and within a group its
    /// methods, then props, then constructors.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group names in declared order, one per run of adjacent entries. A
    /// group the document repeats out of order is listed again.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if groups.last() != Some(&entry.group.as_str()) {
                groups.push(&entry.group);
            }
        }
        groups
    }

    /// Total `(target, name)` pairs across all entries.
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(CatalogEntry::pair_count).sum()
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn normalize_group(group: GroupDoc, out: &mut Vec<CatalogEntry>) -> Result<(), CatalogError> {
    let members = group
        .methods
        .iter()
        .map(|m| (EntryKind::Method, m))
        .chain(group.props.iter().map(|m| (EntryKind::Getter, m)));

    for (kind, member) in members {
        out.push(normalize_member(&group, kind, member)?);
    }
    for ctor in &group.constructors {
        out.push(normalize_constructor(&group, ctor));
    }
    Ok(())
}

fn normalize_member(
    group: &GroupDoc,
    kind: EntryKind,
    member: &MemberDoc,
) -> Result<CatalogEntry, CatalogError> {
    let (entry_targets, names, entry_api, options) = match member {
        MemberDoc::Name(name) => (None, vec![name.clone()], None, EntryOptions::default()),
        MemberDoc::Entry(entry) => {
            let names = match (&entry.names, &entry.name) {
                (Some(names), _) if !names.is_empty() => names.clone(),
                (_, Some(name)) => vec![name.clone()],
                _ => {
                    return Err(CatalogError::MissingName {
                        group: group.name.clone(),
                    })
                }
            };
            let api = entry.api.clone();
            let options = EntryOptions {
                wrap_callback_arg: entry.wrap_callback_arg,
                on_return: entry.on_return.as_ref().map(|hook| OnReturnHook {
                    method: hook.hook_method.clone(),
                    api: hook
                        .api
                        .clone()
                        .unwrap_or_else(|| resolve_api(api.as_deref(), group)),
                }),
                static_member: entry.is_static,
            };
            (entry.target.clone().map(|t| t.into_vec()), names, api, options)
        }
    };

    let targets = group
        .targets
        .clone()
        .or(entry_targets)
        .or_else(|| group.target.clone().map(|t| vec![t]))
        .unwrap_or_default();
    if targets.is_empty() {
        return Err(CatalogError::NoTarget {
            group: group.name.clone(),
            name: names.join(","),
        });
    }

    Ok(CatalogEntry {
        group: group.name.clone(),
        kind,
        targets,
        names,
        api: resolve_api(entry_api.as_deref(), group),
        options,
    })
}

fn normalize_constructor(group: &GroupDoc, ctor: &ConstructorDoc) -> CatalogEntry {
    CatalogEntry {
        group: group.name.clone(),
        kind: EntryKind::Constructor,
        targets: Vec::new(),
        names: vec![ctor.name.clone()],
        api: resolve_api(ctor.api.as_deref(), group),
        options: EntryOptions {
            wrap_callback_arg: ctor.wrap_callback_arg,
            ..EntryOptions::default()
        },
    }
}

fn resolve_api(entry_api: Option<&str>, group: &GroupDoc) -> String {
    entry_api
        .or(group.api.as_deref())
        .unwrap_or(FALLBACK_API)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(catalog: &'a Catalog, group: &str, name: &str) -> &'a CatalogEntry {
        catalog
            .entries()
            .iter()
            .find(|e| e.group == group && e.names.iter().any(|n| n == name))
            .unwrap()
    }

    #[test]
    fn builtin_catalog_loads_in_declared_order() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.groups(),
            vec![
                "canvas", "audio", "navigator", "screen", "window", "network", "hardware",
                "timing", "dom", "fonts", "storage", "intl", "wasm", "svg", "observers", "math",
            ]
        );
    }

    #[test]
    fn bare_names_inherit_group_targets_and_label() {
        let catalog = Catalog::builtin().unwrap();
        let osc = entry(&catalog, "audio", "createOscillator");
        assert_eq!(osc.kind, EntryKind::Method);
        assert_eq!(osc.api, "audioContext");
        assert_eq!(osc.targets.len(), 4);

        let rate = entry(&catalog, "audio", "sampleRate");
        assert_eq!(rate.kind, EntryKind::Getter);
        assert_eq!(rate.targets, osc.targets);
    }

    #[test]
    fn entry_label_overrides_group_label() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(entry(&catalog, "canvas", "readPixels").api, "webgl");
        assert_eq!(entry(&catalog, "canvas", "toDataURL").api, "canvas");
        assert_eq!(entry(&catalog, "navigator", "registerProtocolHandler").api, "navigator");
    }

    #[test]
    fn entries_without_target_fall_back_to_group_target() {
        let catalog = Catalog::builtin().unwrap();
        let battery = entry(&catalog, "navigator", "getBattery");
        assert_eq!(battery.targets, vec!["Navigator"]);
        assert_eq!(battery.api, "battery");
    }

    #[test]
    fn options_are_carried_through() {
        let catalog = Catalog::builtin().unwrap();
        let geo = entry(&catalog, "hardware", "watchPosition");
        assert_eq!(geo.options.wrap_callback_arg, Some(0));

        let media = entry(&catalog, "window", "matchMedia");
        assert_eq!(
            media.options.on_return,
            Some(OnReturnHook {
                method: "addEventListener".to_string(),
                api: "mediaQuery".to_string(),
            })
        );

        let observer = entry(&catalog, "observers", "ResizeObserver");
        assert_eq!(observer.kind, EntryKind::Constructor);
        assert!(observer.targets.is_empty());
        assert_eq!(observer.options.wrap_callback_arg, Some(0));
    }

    #[test]
    fn static_flag_marks_class_members() {
        let catalog = Catalog::builtin().unwrap();
        assert!(entry(&catalog, "timing", "now").options.static_member);
        assert!(!entry(&catalog, "timing", "getTime").options.static_member);
        assert!(entry(&catalog, "intl", "supportedLocalesOf").options.static_member);

        let json = serde_json::to_value(entry(&catalog, "timing", "now")).unwrap();
        assert_eq!(json["options"], serde_json::json!({"static": true}));
    }

    #[test]
    fn group_without_label_uses_entry_or_fallback() {
        let catalog = Catalog::from_json(
            r#"[{"name": "misc", "target": "window", "methods": ["alert", {"name": "print", "api": "printing"}]}]"#,
        )
        .unwrap();
        assert_eq!(catalog.entries()[0].api, FALLBACK_API);
        assert_eq!(catalog.entries()[1].api, "printing");
        assert_eq!(catalog.pair_count(), 2);
    }

    #[test]
    fn rejects_entries_without_names_or_targets() {
        let err = Catalog::from_json(r#"[{"name": "g", "methods": [{"target": "Math"}]}]"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingName { .. }));

        let err = Catalog::from_json(r#"[{"name": "g", "methods": ["random"]}]"#).unwrap_err();
        assert!(matches!(err, CatalogError::NoTarget { ref name, .. } if name == "random"));
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = Catalog::from_json(r#"{"canvas": {}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
        let err = Catalog::from_json(r#"[{"name": "g", "methods": [{"name": "x", "wrapArg": 1}]}]"#)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn serializes_normalized_entries() {
        let catalog = Catalog::from_json(
            r#"[{"name": "math", "api": "math", "methods": [{"target": "Math", "name": "random"}]}]"#,
        )
        .unwrap();
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "group": "math",
                "kind": "method",
                "targets": ["Math"],
                "names": ["random"],
                "api": "math",
                "options": {}
            }])
        );
    }
}
