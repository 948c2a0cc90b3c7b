//! Data types for the 115 drive workflow

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One node of the remote directory tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// File id for files, directory id for directories
    pub id: String,
    /// Id of the containing directory
    pub parent_id: String,
    /// Display name
    pub name: String,
    /// Whether this entry is a file
    pub is_file: bool,
}

/// Listing record as the service returns it
///
/// Files carry `fid` and use `cid` for their parent; directories carry no
/// `fid`, use `cid` for themselves and `pid` for their parent.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    #[serde(default, deserialize_with = "optional_id")]
    pub fid: Option<String>,
    #[serde(deserialize_with = "id")]
    pub cid: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub pid: Option<String>,
    pub n: String,
}

impl From<RawEntry> for DirectoryEntry {
    fn from(raw: RawEntry) -> Self {
        match raw.fid {
            Some(fid) => DirectoryEntry {
                id: fid,
                parent_id: raw.cid,
                name: raw.n,
                is_file: true,
            },
            None => DirectoryEntry {
                id: raw.cid,
                parent_id: raw.pid.unwrap_or_default(),
                name: raw.n,
                is_file: false,
            },
        }
    }
}

/// One page of a directory listing
#[derive(Debug, Deserialize)]
pub(crate) struct ListingPage {
    #[serde(default)]
    pub data: Vec<RawEntry>,
    pub count: u64,
}

/// Directory creation response
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedDirectory {
    #[serde(deserialize_with = "id")]
    pub cid: String,
}

/// Offline task submission response
#[derive(Debug, Deserialize)]
pub(crate) struct TaskBatch {
    pub result: Vec<TaskOutcome>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskOutcome {
    pub state: bool,
    #[serde(default)]
    pub info_hash: Option<String>,
}

/// A link to download into a destination path
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Slash-delimited path under the drive root
    pub destination_path: String,
    /// Download link (magnet, ed2k, http...)
    pub link: String,
}

impl WorkItem {
    /// Create a work item
    pub fn new(destination_path: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            destination_path: destination_path.into(),
            link: link.into(),
        }
    }
}

/// An accepted offline download task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task identifier assigned by the service
    pub info_hash: String,
}

/// Links grouped by destination path
///
/// Paths keep first-seen order and links keep input order within a path.
/// Paths are compared verbatim, so `"a/b"` and `"/a/b"` form two groups even
/// though they resolve to the same directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathGroups {
    groups: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl PathGroups {
    /// Group `items` by destination path
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut groups = Self::default();
        for item in items {
            groups.push(&item.destination_path, &item.link);
        }
        groups
    }

    /// Add one link under `path`
    pub fn push(&mut self, path: &str, link: &str) {
        let slot = match self.index.get(path) {
            Some(&slot) => slot,
            None => {
                self.groups.push((path.to_string(), Vec::new()));
                self.index.insert(path.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].1.push(link.to_string());
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no links were added
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate `(path, links)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(path, links)| (path.as_str(), links.as_slice()))
    }
}

/// Operations the drive node understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Submit links as offline download tasks
    AddLinkTasks,
}

impl std::str::FromStr for Operation {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addLinkTasks" => Ok(Operation::AddLinkTasks),
            other => Err(crate::error::Error::NotSupported(format!(
                "Unknown operation: {}",
                other
            ))),
        }
    }
}

// The service sends ids as strings on some endpoints and numbers on others.
fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(s)| s))
}
