// Walker module - 目录遍历
// 将选择中的目录递归展开为叶子文件，并保留相对路径

use crate::error::{IngestError, Result};
use crate::path::ResolvedPath;
use crate::source::{DirectoryHandle, Entry, FileHandle, Selection};
use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 叶子文件及其解析后的相对路径
#[derive(Clone)]
pub struct Leaf {
    pub handle: Arc<dyn FileHandle>,
    pub path: ResolvedPath,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf").field("path", &self.path).finish()
    }
}

/// Expands entries into leaves in pre-order, depth-first per branch.
///
/// Sibling subtrees are walked concurrently; results are joined back in
/// enumeration order. Directory batch reads share a semaphore so the number
/// of outstanding enumeration requests stays bounded. A permit is held only
/// for a single batch request, never across recursion.
#[derive(Clone)]
pub struct TreeWalker {
    permits: Arc<Semaphore>,
}

impl TreeWalker {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// 遍历整个选择；各顶层条目的结果按输入顺序拼接
    pub async fn walk_selection(&self, selection: Selection) -> Result<Vec<Leaf>> {
        let walks = selection.into_entries().into_iter().map(|item| {
            let walker = self.clone();
            async move {
                match item.entry {
                    Entry::File(handle) => {
                        let path = ResolvedPath::from_relative(
                            item.relative_path.as_deref(),
                            handle.name(),
                        );
                        Ok(vec![Leaf { handle, path }])
                    }
                    dir @ Entry::Directory(_) => walker.walk(dir, String::new()).await,
                }
            }
        });

        let leaves: Vec<Leaf> = try_join_all(walks).await?.into_iter().flatten().collect();
        Ok(leaves)
    }

    /// 遍历单个条目，`prefix` 为祖先目录拼接出的前缀（根为空串）
    pub fn walk(&self, entry: Entry, prefix: String) -> BoxFuture<'static, Result<Vec<Leaf>>> {
        let walker = self.clone();
        async move {
            match entry {
                Entry::File(handle) => {
                    let path = ResolvedPath::leaf(&prefix, handle.name());
                    Ok(vec![Leaf { handle, path }])
                }
                Entry::Directory(dir) => {
                    let children = walker.read_all_children(dir.as_ref(), &prefix).await?;
                    let child_prefix = ResolvedPath::child_prefix(&prefix, dir.name());

                    tracing::debug!("Walking {} ({} entries)", child_prefix, children.len());

                    let walks = children
                        .into_iter()
                        .map(|child| walker.walk(child, child_prefix.clone()));
                    let nested = try_join_all(walks).await?;
                    Ok(nested.into_iter().flatten().collect())
                }
            }
        }
        .boxed()
    }

    /// 持续请求下一批，直到返回空批次
    async fn read_all_children(
        &self,
        dir: &dyn DirectoryHandle,
        prefix: &str,
    ) -> Result<Vec<Entry>> {
        let traversal_error = |source| IngestError::Traversal {
            path: format!("{}{}", prefix, dir.name()),
            source,
        };

        let mut reader = {
            let _permit = self.permits.acquire().await;
            dir.reader().await.map_err(traversal_error)?
        };

        let mut children = Vec::new();
        loop {
            let batch = {
                let _permit = self.permits.acquire().await;
                reader.read_entries().await.map_err(traversal_error)?
            };
            if batch.is_empty() {
                break;
            }
            children.extend(batch);
        }
        Ok(children)
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(crate::pipeline::DEFAULT_MAX_IN_FLIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EntryReader, MemoryDirectory, MemoryFile};
    use async_trait::async_trait;
    use std::io;

    fn paths(leaves: &[Leaf]) -> Vec<&str> {
        leaves.iter().map(|l| l.path.as_str()).collect()
    }

    #[tokio::test]
    async fn file_entry_is_a_single_leaf() {
        let walker = TreeWalker::new(4);
        let leaves = walker
            .walk(Entry::file(MemoryFile::new("a.py", "")), "x/".to_string())
            .await
            .unwrap();
        assert_eq!(paths(&leaves), vec!["x/a.py"]);
    }

    #[tokio::test]
    async fn nested_tree_is_pre_order() {
        let tree = MemoryDirectory::new("proj")
            .with_file("main.py", "")
            .with_dir(
                MemoryDirectory::new("lib")
                    .with_file("util.js", "")
                    .with_dir(MemoryDirectory::new("deep").with_file("x.rs", "")),
            )
            .with_file("README", "");

        let leaves = TreeWalker::new(4)
            .walk(Entry::directory(tree), String::new())
            .await
            .unwrap();
        assert_eq!(
            paths(&leaves),
            vec!["proj/main.py", "proj/lib/util.js", "proj/lib/deep/x.rs", "proj/README"]
        );
    }

    #[tokio::test]
    async fn empty_directory_has_no_leaves() {
        let leaves = TreeWalker::new(1)
            .walk(Entry::directory(MemoryDirectory::new("empty")), String::new())
            .await
            .unwrap();
        assert!(leaves.is_empty());
    }

    #[tokio::test]
    async fn paginated_directories_are_fully_read() {
        let mut dir = MemoryDirectory::new("many").with_page_size(1);
        for i in 0..5 {
            dir = dir.with_file(format!("f{}.c", i), "");
        }

        let leaves = TreeWalker::new(1)
            .walk(Entry::directory(dir), String::new())
            .await
            .unwrap();
        assert_eq!(
            paths(&leaves),
            vec!["many/f0.c", "many/f1.c", "many/f2.c", "many/f3.c", "many/f4.c"]
        );
    }

    #[tokio::test]
    async fn selection_keeps_input_order_and_relative_paths() {
        let mut selection = Selection::new();
        selection.push(Entry::directory(MemoryDirectory::new("b").with_file("1.js", "")));
        selection.push_with_path(Entry::file(MemoryFile::new("util.js", "")), "proj/lib/util.js");
        selection.push(Entry::directory(MemoryDirectory::new("a").with_file("2.js", "")));

        let leaves = TreeWalker::new(2).walk_selection(selection).await.unwrap();
        assert_eq!(paths(&leaves), vec!["b/1.js", "proj/lib/util.js", "a/2.js"]);
    }

    struct Forbidden;

    #[async_trait]
    impl DirectoryHandle for Forbidden {
        fn name(&self) -> &str {
            "private"
        }

        async fn reader(&self) -> io::Result<Box<dyn EntryReader>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"))
        }
    }

    #[tokio::test]
    async fn enumeration_failure_aborts_walk() {
        let tree = MemoryDirectory::new("proj")
            .with_file("ok.py", "")
            .with_entry(Entry::directory(Forbidden));

        let err = TreeWalker::new(4)
            .walk(Entry::directory(tree), String::new())
            .await
            .unwrap_err();

        match err {
            IngestError::Traversal { path, source } => {
                assert_eq!(path, "proj/private");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
