//! Serde shapes of a catalog document
//!
//! A document is an ordered array of groups. Members come in two shapes: a
//! bare name string, which inherits everything from its group, or an entry
//! object carrying its own targets, names, label and options.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GroupDoc {
    pub name: String,
    #[serde(default)]
    pub api: Option<String>,
    /// Single target shared by entries that name none.
    #[serde(default)]
    pub target: Option<String>,
    /// Target list shared by every entry; wins over entry targets.
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Vec<MemberDoc>,
    #[serde(default)]
    pub props: Vec<MemberDoc>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDoc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum MemberDoc {
    Name(String),
    Entry(EntryDoc),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntryDoc {
    #[serde(default)]
    pub target: Option<OneOrMany>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub wrap_callback_arg: Option<usize>,
    #[serde(default)]
    pub on_return: Option<OnReturnDoc>,
    /// Hook on the target itself, for static class members.
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(path) => vec![path],
            OneOrMany::Many(paths) => paths,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConstructorDoc {
    pub name: String,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub wrap_callback_arg: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OnReturnDoc {
    pub hook_method: String,
    #[serde(default)]
    pub api: Option<String>,
}
