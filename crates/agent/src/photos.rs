use std::path::{Path, PathBuf};

use courtside_core::domain::item::Item;
use courtside_core::flows::messages::{photo_caption, photo_unavailable_caption};
use courtside_core::flows::Reply;
use tracing::warn;

/// Resolves item images under a configured root directory.
#[derive(Clone, Debug)]
pub struct PhotoLocator {
    root: PathBuf,
}

impl PhotoLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, item: &Item) -> PathBuf {
        self.root.join(&item.image)
    }

    /// `None` when the image is not a readable file.
    pub async fn locate(&self, item: &Item) -> Option<PathBuf> {
        let path = self.path_for(item);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }

    /// A missing image degrades to a text reply for that item only.
    pub async fn render(&self, item: &Item) -> Reply {
        match self.locate(item).await {
            Some(path) => Reply::Photo { path, caption: photo_caption(item) },
            None => {
                warn!(
                    event_name = "photos.image_missing",
                    item_id = %item.id.0,
                    path = %self.path_for(item).display(),
                    "item image unavailable, sending text fallback"
                );
                Reply::PhotoUnavailable { caption: photo_unavailable_caption(item) }
            }
        }
    }

    pub async fn render_all(&self, items: &[Item]) -> Vec<Reply> {
        let mut replies = Vec::with_capacity(items.len());
        for item in items {
            replies.push(self.render(item).await);
        }
        replies
    }
}
