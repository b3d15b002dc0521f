//! # Lifecycle Events
//!
//! The host notifies registered listeners of two attachment events:
//! - **uploaded**: file stored and size variants generated. Listeners act as a
//!   filter: each receives the metadata returned by the previous one.
//! - **deleted**: the attachment is going away; only its id is passed.
//!
//! Dispatch is sequential, in registration order.

use crate::host::SizeVariantSet;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait AttachmentListener: Send + Sync {
    /// Returns the metadata handed to the next listener
    async fn on_uploaded(&self, source: &Path, sizes: SizeVariantSet) -> SizeVariantSet;

    async fn on_deleted(&self, attachment_id: &str);
}

#[derive(Default)]
pub struct LifecycleDispatcher {
    listeners: Vec<Arc<dyn AttachmentListener>>,
}

impl LifecycleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if this exact listener is already registered
    pub fn register(&mut self, listener: Arc<dyn AttachmentListener>) -> bool {
        if self.listeners.iter().any(|known| Arc::ptr_eq(known, &listener)) {
            warn!("Listener already registered, ignoring");
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn uploaded(&self, source: &Path, mut sizes: SizeVariantSet) -> SizeVariantSet {
        debug!("Dispatching upload of {} to {} listener(s)", source.display(), self.listeners.len());
        for listener in &self.listeners {
            sizes = listener.on_uploaded(source, sizes).await;
        }
        sizes
    }

    pub async fn deleted(&self, attachment_id: &str) {
        debug!("Dispatching deletion of {} to {} listener(s)", attachment_id, self.listeners.len());
        for listener in &self.listeners {
            listener.on_deleted(attachment_id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Appends its tag to every size label it sees and logs each call
    struct Tagger {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl AttachmentListener for Tagger {
        async fn on_uploaded(&self, _source: &Path, sizes: SizeVariantSet) -> SizeVariantSet {
            self.log.lock().unwrap().push(format!("{}:upload", self.tag));
            sizes
                .iter()
                .map(|(label, path)| (format!("{}{}", label, self.tag), path.to_path_buf()))
                .collect()
        }

        async fn on_deleted(&self, attachment_id: &str) {
            self.log.lock().unwrap().push(format!("{}:delete:{}", self.tag, attachment_id));
        }
    }

    fn tagger(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn AttachmentListener> {
        Arc::new(Tagger { tag, log: log.clone() })
    }

    #[tokio::test]
    async fn test_metadata_is_threaded_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = LifecycleDispatcher::new();
        dispatcher.register(tagger("-a", &log));
        dispatcher.register(tagger("-b", &log));
        let sizes: SizeVariantSet = [("thumb", "t.jpg")].into_iter().collect();

        let result = dispatcher.uploaded(Path::new("/up/x.jpg"), sizes).await;

        assert_eq!(result.get("thumb-a-b"), Some(Path::new("t.jpg")));
        assert_eq!(*log.lock().unwrap(), vec!["-a:upload", "-b:upload"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = tagger("-a", &log);
        let mut dispatcher = LifecycleDispatcher::new();

        assert!(dispatcher.register(listener.clone()));
        assert!(!dispatcher.register(listener));
        assert_eq!(dispatcher.len(), 1);

        dispatcher.deleted("9").await;
        assert_eq!(*log.lock().unwrap(), vec!["-a:delete:9"]);
    }

    #[tokio::test]
    async fn test_no_listeners_passes_metadata_through() {
        let dispatcher = LifecycleDispatcher::new();
        let sizes: SizeVariantSet = [("thumb", "t.jpg")].into_iter().collect();

        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.uploaded(Path::new("x.jpg"), sizes.clone()).await, sizes);
    }
}
