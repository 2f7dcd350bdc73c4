//! Object map standing in for a hosted image bucket.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{MediaStore, MediaStoreError};
use crate::domain::{ImageUpload, MediaFolder};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub folder: MediaFolder,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Media store keeping objects in process memory.
///
/// Objects are addressed as `{base}/{folder}/{uuid}.{ext}`.
#[derive(Debug)]
pub struct InMemoryMediaStore {
    base: Url,
    objects: Mutex<HashMap<Url, StoredObject>>,
}

impl InMemoryMediaStore {
    /// Create an empty store publishing URLs under `base`.
    ///
    /// A trailing slash is added to `base` when missing so folder paths
    /// nest beneath it.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            objects: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an object is stored at `url`.
    pub fn contains(&self, url: &Url) -> bool {
        self.objects().contains_key(url)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The object stored at `url`, if any.
    pub fn get(&self, url: &Url) -> Option<StoredObject> {
        self.objects().get(url).cloned()
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<Url, StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn address(&self, folder: MediaFolder, file: &ImageUpload) -> Result<Url, MediaStoreError> {
        let key = format!(
            "{}/{}.{}",
            folder.as_str(),
            Uuid::new_v4(),
            file.extension()
        );
        self.base
            .join(&key)
            .map_err(|err| MediaStoreError::upload(format!("cannot address {key}: {err}")))
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(
        &self,
        folder: MediaFolder,
        files: &[ImageUpload],
    ) -> Result<Vec<Url>, MediaStoreError> {
        let staged = files
            .iter()
            .map(|file| {
                let url = self.address(folder, file)?;
                Ok((
                    url,
                    StoredObject {
                        folder,
                        content_type: file.content_type.clone(),
                        bytes: file.bytes.clone(),
                    },
                ))
            })
            .collect::<Result<Vec<_>, MediaStoreError>>()?;

        let mut objects = self.objects();
        let urls = staged
            .into_iter()
            .map(|(url, object)| {
                objects.insert(url.clone(), object);
                url
            })
            .collect::<Vec<_>>();
        debug!(folder = folder.as_str(), count = urls.len(), "stored media objects");
        Ok(urls)
    }

    async fn delete(&self, folder: MediaFolder, urls: &[Url]) -> Result<(), MediaStoreError> {
        let mut objects = self.objects();
        let removed = urls
            .iter()
            .filter(|url| objects.remove(*url).is_some())
            .count();
        debug!(folder = folder.as_str(), removed, "deleted media objects");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryMediaStore {
        InMemoryMediaStore::new(Url::parse("https://media.test/crop").expect("base url"))
    }

    #[rstest]
    #[tokio::test]
    async fn urls_follow_folder_layout(store: InMemoryMediaStore) {
        let urls = store
            .upload(
                MediaFolder::Harvests,
                &[
                    ImageUpload::new("a", "image/png", vec![1_u8]),
                    ImageUpload::new("b", "image/jpeg", vec![2_u8]),
                ],
            )
            .await
            .expect("upload");

        assert_eq!(urls.len(), 2);
        assert!(urls[0].as_str().starts_with("https://media.test/crop/harvests/"));
        assert!(urls[0].as_str().ends_with(".png"));
        assert!(urls[1].as_str().ends_with(".jpg"));
        assert_eq!(store.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_ignores_unknown_urls(store: InMemoryMediaStore) {
        let urls = store
            .upload(
                MediaFolder::Commodities,
                &[ImageUpload::new("a", "image/png", vec![1_u8])],
            )
            .await
            .expect("upload");
        let unknown = Url::parse("https://media.test/crop/commodities/gone.png").expect("url");

        store
            .delete(MediaFolder::Commodities, &[urls[0].clone(), unknown])
            .await
            .expect("delete");

        assert!(store.is_empty());
    }
}
