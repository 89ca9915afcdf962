//! The backend's log directory as a browsable tree.
//!
//! Nodes live in an arena; every node keeps the index of its owning parent so
//! a file's full path is recovered by walking up to the root.

use crate::api::DashboardClient;
use crate::error::{ApiError, ApiResult};
use crate::models::LogNodeWire;
use crate::notify::Notifier;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TEXT_SUFFIX: &str = ".txt";
pub const MARKDOWN_FILE: &str = "ai_suggestion.txt";

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub label: String,
    pub parent: Option<NodeId>,
    /// `None` for files; directories always carry a list, possibly empty.
    pub children: Option<Vec<NodeId>>,
}

impl LogEntry {
    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }
}

#[derive(Debug, Default)]
pub struct LogTree {
    nodes: Vec<LogEntry>,
    roots: Vec<NodeId>,
}

impl LogTree {
    /// Builds the tree and sorts every level.
    pub fn from_wire(nodes: Vec<LogNodeWire>) -> Self {
        let mut tree = LogTree::default();
        let mut roots = Vec::with_capacity(nodes.len());
        for n in nodes {
            roots.push(tree.insert(n, None));
        }
        tree.roots = tree.sorted(roots);
        tree
    }

    fn insert(&mut self, wire: LogNodeWire, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(LogEntry { label: wire.label, parent, children: None });
        if let Some(children) = wire.children {
            let mut ids = Vec::with_capacity(children.len());
            for c in children {
                ids.push(self.insert(c, Some(id)));
            }
            let ids = self.sorted(ids);
            self.nodes[id].children = Some(ids);
        }
        id
    }

    fn sorted(&self, mut ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.sort_by(|a, b| compare_siblings(&self.nodes[*a], &self.nodes[*b]));
        ids
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> &LogEntry {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes[id].children.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Labels from the root down to `id`.
    pub fn full_path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(i) = current {
            let node = &self.nodes[i];
            if !node.label.is_empty() {
                path.push(node.label.clone());
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Resolves a `/`-separated path typed by the user.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let id = *level.iter().find(|i| self.nodes[**i].label == part)?;
            found = Some(id);
            level = self.children(id);
        }
        found
    }

    /// Depth-first walk in display order, yielding `(depth, id)`.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        self.walk_from(&self.roots)
    }

    fn walk_from(&self, start: &[NodeId]) -> Vec<(usize, NodeId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, NodeId)> = start.iter().rev().map(|r| (0, *r)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for c in self.children(id).iter().rev() {
                stack.push((depth + 1, *c));
            }
        }
        out
    }

    pub fn render(&self) -> String {
        self.render_nodes(self.walk())
    }

    pub fn render_subtree(&self, id: NodeId) -> String {
        self.render_nodes(self.walk_from(&[id]))
    }

    fn render_nodes(&self, nodes: Vec<(usize, NodeId)>) -> String {
        let mut out = String::new();
        for (depth, id) in nodes {
            let node = &self.nodes[id];
            let marker = if node.is_dir() { "/" } else { "" };
            out.push_str(&format!("{}{}{}\n", "  ".repeat(depth), node.label, marker));
        }
        out
    }
}

/// Directories before files, then case-insensitive name order with the
/// case-sensitive comparison breaking ties.
pub fn compare_siblings(a: &LogEntry, b: &LogEntry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
        .then_with(|| a.label.cmp(&b.label))
}

/// Only text files may be viewed or downloaded.
pub fn ensure_text_file(label: &str, action: &str) -> ApiResult<()> {
    if label.ends_with(TEXT_SUFFIX) {
        Ok(())
    } else {
        Err(ApiError::validation(format!("Only text files can be {action}.")))
    }
}

pub fn is_markdown(label: &str) -> bool {
    label == MARKDOWN_FILE
}

/// Local file name for a download: the path components joined by `_`.
pub fn download_name(path: &[String]) -> String {
    path.join("_")
}

#[derive(Debug, Clone)]
pub struct FileView {
    pub label: String,
    pub content: String,
    pub markdown: bool,
}

/// A loaded log tree plus the file actions on it. Every failure is also
/// reported through the notifier.
pub struct LogBrowser {
    client: Arc<DashboardClient>,
    notifier: Notifier,
    tree: LogTree,
}

impl LogBrowser {
    pub async fn load(client: Arc<DashboardClient>, notifier: Notifier) -> ApiResult<Self> {
        match client.get_log_structure().await {
            Ok(nodes) => Ok(Self { client, notifier, tree: LogTree::from_wire(nodes) }),
            Err(e) => {
                notifier.error(format!("Failed to load log structure: {}", e.detail()));
                Err(e)
            }
        }
    }

    pub fn tree(&self) -> &LogTree {
        &self.tree
    }

    fn gate(&self, id: NodeId, action: &str) -> ApiResult<()> {
        ensure_text_file(&self.tree.get(id).label, action).inspect_err(|e| self.notifier.error(e.detail()))
    }

    pub async fn view_file(&self, id: NodeId) -> ApiResult<FileView> {
        self.gate(id, "viewed")?;
        let label = self.tree.get(id).label.clone();
        match self.client.view_file(&self.tree.full_path(id)).await {
            Ok(content) => Ok(FileView { markdown: is_markdown(&label), label, content }),
            Err(e) => {
                self.notifier.error(format!("Failed to load file content: {}", e.detail()));
                Err(e)
            }
        }
    }

    /// Saves the file into `dir` under its `_`-joined path name.
    pub async fn download_file(&self, id: NodeId, dir: &Path) -> ApiResult<PathBuf> {
        self.gate(id, "downloaded")?;
        let path = self.tree.full_path(id);
        let dest = dir.join(download_name(&path));
        match self.client.download_file(&path, &dest).await {
            Ok(_) => Ok(dest),
            Err(e) => {
                self.notifier.error(format!("Failed to download file: {}", e.detail()));
                Err(e)
            }
        }
    }
}
