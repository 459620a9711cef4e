//! Storage orchestration
//!
//! `RemoteStorage` composes a [`DocumentStore`] and a [`MetadataStore`]: every
//! document mutation is followed by a metadata update of the document and a
//! version bump of each folder the document store reports as affected.
//!
//! The two stores are not updated in one transaction. A failure part way
//! through aborts the remaining steps and is returned as-is; nothing is rolled
//! back, so callers should re-read versions after an error.

use log::{info, warn};
use std::collections::BTreeMap;

use crate::document::DocumentStore;
use crate::error::RemoteStorageError;
use crate::metadata::MetadataStore;
use crate::path::StoragePath;
use crate::storage::listing::{FolderListing, ListingItem};

pub struct RemoteStorage<M, D> {
    metadata: M,
    documents: D,
}

impl<M: MetadataStore, D: DocumentStore> RemoteStorage<M, D> {
    pub fn new(metadata: M, documents: D) -> Self {
        Self {
            metadata,
            documents,
        }
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// Stores a document and returns its new version.
    ///
    /// Order: bytes, then the document's metadata, then one bump per affected
    /// folder. The first failing step stops the rest.
    pub fn put_document(
        &self,
        path: &StoragePath,
        content_type: &str,
        data: &[u8],
    ) -> Result<u64, RemoteStorageError> {
        if !path.is_document() {
            return Err(RemoteStorageError::NotADocument(path.to_string()));
        }

        let affected = self.documents.put_document(path, data)?;
        let version = self.metadata.update_document(path, content_type)?;
        for folder in &affected {
            self.metadata.update_folder(folder)?;
        }

        info!(
            "PUT {} ({} bytes, {}) -> version {}, {} folders bumped",
            path,
            data.len(),
            content_type,
            version,
            affected.len()
        );
        Ok(version)
    }

    /// Deletes a document and the metadata of everything the document store
    /// removed along with it.
    ///
    /// Folders that still have children keep their version, so their ETag does
    /// not change even though a child disappeared.
    pub fn delete_document(&self, path: &StoragePath) -> Result<(), RemoteStorageError> {
        if !path.is_document() {
            return Err(RemoteStorageError::NotADocument(path.to_string()));
        }

        let deleted = self.documents.delete_document(path)?;
        for entry in &deleted {
            self.metadata.delete_entry(entry)?;
        }

        info!("DELETE {} ({} entries removed)", path, deleted.len());
        Ok(())
    }

    pub fn get_version(&self, path: &StoragePath) -> Result<Option<u64>, RemoteStorageError> {
        Ok(self.metadata.get_version(path)?)
    }

    pub fn get_content_type(&self, path: &StoragePath) -> Result<Option<String>, RemoteStorageError> {
        Ok(self.metadata.get_content_type(path)?)
    }

    pub fn get_document(&self, path: &StoragePath) -> Result<Vec<u8>, RemoteStorageError> {
        if !path.is_document() {
            return Err(RemoteStorageError::NotADocument(path.to_string()));
        }
        Ok(self.documents.get_document(path)?)
    }

    /// Builds the folder description of `path`.
    ///
    /// A child without a metadata entry is listed with a `null` ETag.
    pub fn get_folder(&self, path: &StoragePath) -> Result<FolderListing, RemoteStorageError> {
        if !path.is_folder() {
            return Err(RemoteStorageError::NotAFolder(path.to_string()));
        }

        let children = self.documents.get_folder(path)?;
        let mut items = BTreeMap::new();

        for name in children.into_keys() {
            let child = path.child(&name)?;
            let entry = self.metadata.get_entry(&child)?;
            if entry.is_none() {
                warn!("{} is listed but has no metadata entry", child);
            }

            let content_type = if child.is_folder() {
                None
            } else {
                entry.as_ref().and_then(|e| e.content_type.clone())
            };
            items.insert(
                name,
                ListingItem {
                    etag: entry.map(|e| e.version),
                    content_type,
                },
            );
        }

        Ok(FolderListing::new(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FolderEntries, MemoryDocumentStore};
    use crate::error::{DocumentError, MetadataError};
    use crate::metadata::{DatabaseMetadataStore, MetadataDatabase};
    use std::io;
    use std::sync::Arc;

    type MemoryStorage = RemoteStorage<DatabaseMetadataStore, MemoryDocumentStore>;

    fn storage() -> MemoryStorage {
        RemoteStorage::new(
            DatabaseMetadataStore::new(Arc::new(MetadataDatabase::in_memory())),
            MemoryDocumentStore::new(),
        )
    }

    fn path(raw: &str) -> StoragePath {
        StoragePath::parse(raw).unwrap()
    }

    struct BrokenDocumentStore;

    impl DocumentStore for BrokenDocumentStore {
        fn put_document(&self, _: &StoragePath, _: &[u8]) -> Result<Vec<StoragePath>, DocumentError> {
            Err(io::Error::other("disk on fire").into())
        }

        fn delete_document(&self, _: &StoragePath) -> Result<Vec<StoragePath>, DocumentError> {
            Err(io::Error::other("disk on fire").into())
        }

        fn get_document(&self, p: &StoragePath) -> Result<Vec<u8>, DocumentError> {
            Err(DocumentError::NotFound(p.to_string()))
        }

        fn get_folder(&self, _: &StoragePath) -> Result<FolderEntries, DocumentError> {
            Ok(FolderEntries::new())
        }
    }

    #[test]
    fn test_put_bumps_document_and_ancestors() {
        let rs = storage();
        let doc = path("/admin/contacts/work/colleagues.vcf");

        assert_eq!(rs.put_document(&doc, "text/vcard", b"v1").unwrap(), 1);
        for folder in doc.folder_tree_from_root() {
            assert_eq!(rs.get_version(&folder).unwrap(), Some(1), "{}", folder);
        }

        assert_eq!(rs.put_document(&doc, "text/x-vcard", b"v2").unwrap(), 2);
        for folder in doc.folder_tree_from_root() {
            assert_eq!(rs.get_version(&folder).unwrap(), Some(2), "{}", folder);
        }
        assert_eq!(
            rs.get_content_type(&doc).unwrap().as_deref(),
            Some("text/x-vcard")
        );
        assert_eq!(rs.get_document(&doc).unwrap(), b"v2");
    }

    #[test]
    fn test_sibling_write_bumps_shared_folders_only() {
        let rs = storage();
        rs.put_document(&path("/admin/contacts/a.vcf"), "text/vcard", b"a")
            .unwrap();
        rs.put_document(&path("/admin/notes/b.txt"), "text/plain", b"b")
            .unwrap();

        assert_eq!(rs.get_version(&path("/admin/contacts/")).unwrap(), Some(1));
        assert_eq!(rs.get_version(&path("/admin/notes/")).unwrap(), Some(1));
        let user_root = StoragePath::user_root("admin", false).unwrap();
        assert_eq!(rs.get_version(&user_root).unwrap(), Some(2));
        assert_eq!(rs.get_version(&StoragePath::storage_root()).unwrap(), Some(2));
    }

    #[test]
    fn test_unwritten_path_has_no_version() {
        let rs = storage();
        let doc = path("/admin/contacts/none.vcf");
        assert_eq!(rs.get_version(&doc).unwrap(), None);
        assert_eq!(rs.get_content_type(&doc).unwrap(), None);
        assert!(matches!(
            rs.get_document(&doc),
            Err(RemoteStorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_folder_listing_items() {
        let rs = storage();
        let doc = path("/admin/contacts/a.vcf");
        rs.put_document(&doc, "text/vcard", b"a").unwrap();
        rs.put_document(&doc, "text/vcard", b"aa").unwrap();
        rs.put_document(&path("/admin/contacts/work/b.vcf"), "text/vcard", b"b")
            .unwrap();

        let listing = rs.get_folder(&path("/admin/contacts/")).unwrap();
        assert_eq!(listing.items.len(), 2);

        let item = &listing.items["a.vcf"];
        assert_eq!(item.etag, rs.get_version(&doc).unwrap());
        assert_eq!(item.etag, Some(2));
        assert_eq!(item.content_type.as_deref(), Some("text/vcard"));

        let sub = &listing.items["work/"];
        assert_eq!(sub.etag, Some(1));
        assert_eq!(sub.content_type, None);
    }

    #[test]
    fn test_user_root_listing_shows_modules() {
        let rs = storage();
        rs.put_document(&path("/admin/contacts/a.vcf"), "text/vcard", b"a")
            .unwrap();
        rs.put_document(&path("/admin/public/photos/p.jpg"), "image/jpeg", b"p")
            .unwrap();

        let listing = rs
            .get_folder(&StoragePath::user_root("admin", false).unwrap())
            .unwrap();
        assert_eq!(listing.items["contacts/"].etag, Some(1));
        assert_eq!(listing.items["public/"].etag, Some(1));
        assert!(listing.items.values().all(|i| i.content_type.is_none()));
    }

    #[test]
    fn test_wrong_kind_is_rejected_before_touching_stores() {
        let rs = storage();
        let folder = path("/admin/contacts/");
        assert!(matches!(
            rs.put_document(&folder, "text/plain", b"x"),
            Err(RemoteStorageError::NotADocument(_))
        ));
        assert!(matches!(
            rs.delete_document(&folder),
            Err(RemoteStorageError::NotADocument(_))
        ));
        assert!(matches!(
            rs.get_folder(&path("/admin/contacts/a.vcf")),
            Err(RemoteStorageError::NotAFolder(_))
        ));
        assert!(rs.metadata().database().is_empty().unwrap());
    }

    #[test]
    fn test_failed_document_write_skips_metadata() {
        let database = Arc::new(MetadataDatabase::in_memory());
        let rs = RemoteStorage::new(
            DatabaseMetadataStore::new(Arc::clone(&database)),
            BrokenDocumentStore,
        );
        let doc = path("/admin/contacts/a.vcf");

        assert!(matches!(
            rs.put_document(&doc, "text/vcard", b"a"),
            Err(RemoteStorageError::Document(DocumentError::IoError(_)))
        ));
        assert!(database.is_empty().unwrap());
    }

    #[test]
    fn test_failed_metadata_write_keeps_document_bytes() {
        let rs = storage();
        let doc = path("/admin/contacts/a.vcf");
        rs.metadata().database().close().unwrap();

        assert!(matches!(
            rs.put_document(&doc, "text/vcard", b"a"),
            Err(RemoteStorageError::Metadata(MetadataError::Closed))
        ));
        assert_eq!(rs.get_document(&doc).unwrap(), b"a");
    }

    #[test]
    fn test_delete_removes_entries_but_leaves_surviving_folders() {
        let rs = storage();
        let keep = path("/admin/contacts/keep.vcf");
        let gone = path("/admin/contacts/work/gone.vcf");
        rs.put_document(&keep, "text/vcard", b"k").unwrap();
        rs.put_document(&gone, "text/vcard", b"g").unwrap();

        let contacts = path("/admin/contacts/");
        let before = rs.get_version(&contacts).unwrap();
        assert_eq!(before, Some(2));

        rs.delete_document(&gone).unwrap();
        assert_eq!(rs.get_version(&gone).unwrap(), None);
        assert_eq!(rs.get_version(&path("/admin/contacts/work/")).unwrap(), None);
        // the surviving parent is not bumped
        assert_eq!(rs.get_version(&contacts).unwrap(), before);

        let listing = rs.get_folder(&contacts).unwrap();
        assert_eq!(listing.items.keys().collect::<Vec<_>>(), vec!["keep.vcf"]);
    }

    #[test]
    fn test_listed_child_without_metadata_has_null_etag() {
        let rs = storage();
        let doc = path("/admin/contacts/a.vcf");
        rs.put_document(&doc, "text/vcard", b"a").unwrap();
        rs.metadata().delete_entry(&doc).unwrap();

        let listing = rs.get_folder(&path("/admin/contacts/")).unwrap();
        assert_eq!(listing.items["a.vcf"].etag, None);
        assert_eq!(listing.items["a.vcf"].content_type, None);
    }
}
