//! Provider facade
//!
//! Validates argument shapes and delegates to the entity store and the
//! session manager. This is the surface both the control-port handlers and
//! in-process callers use.

use std::sync::Arc;

use storage_common::Item;
use storage_common::validators::{
    self, ContentTypeError, EtagError, ItemIdError, ItemNameError, PageTokenError,
};

use crate::error::{ProviderError, ProviderResult};
use crate::sessions::{ByteStream, ClientId, SessionManager};
use crate::store::{EntityStore, UploadTarget};

/// An open upload: write the content into `stream`, then shut it down
#[derive(Debug)]
pub struct UploadHandle {
    pub upload_id: String,
    pub stream: ByteStream,
}

/// An open download: read `stream` to EOF
#[derive(Debug)]
pub struct DownloadHandle {
    pub download_id: String,
    pub stream: ByteStream,
}

#[derive(Clone)]
pub struct Provider {
    store: Arc<EntityStore>,
    sessions: Arc<SessionManager>,
}

impl Provider {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            store: Arc::clone(sessions.store()),
            sessions,
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn roots(&self) -> ProviderResult<Vec<Item>> {
        Ok(self.store.roots())
    }

    /// One page of a folder's children; an empty `next_page_token` ends the listing
    pub fn list(&self, item_id: &str, page_token: &str) -> ProviderResult<(Vec<Item>, String)> {
        check_item_id("item_id", item_id)?;
        check_page_token(page_token)?;
        self.store.children(item_id, page_token)
    }

    pub fn lookup(&self, parent_id: &str, name: &str) -> ProviderResult<Vec<Item>> {
        check_item_id("parent_id", parent_id)?;
        check_name(name)?;
        self.store.lookup(parent_id, name)
    }

    pub fn metadata(&self, item_id: &str) -> ProviderResult<Item> {
        check_item_id("item_id", item_id)?;
        self.store.get(item_id)
    }

    pub fn create_folder(&self, parent_id: &str, name: &str) -> ProviderResult<Item> {
        check_item_id("parent_id", parent_id)?;
        check_name(name)?;
        self.store.create_folder(parent_id, name)
    }

    /// Begin uploading a new file (or a replacement for a same-named one)
    pub fn create_file(
        &self,
        client: ClientId,
        parent_id: &str,
        name: &str,
        content_type: &str,
        allow_overwrite: bool,
        expected_etag: &str,
    ) -> ProviderResult<UploadHandle> {
        check_item_id("parent_id", parent_id)?;
        check_name(name)?;
        check_content_type(content_type)?;
        check_etag("expected_etag", expected_etag)?;

        let target = UploadTarget::Create {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            content_type: content_type.to_string(),
            allow_overwrite,
            expected_etag: expected_etag.to_string(),
        };
        let (upload_id, stream) = self.sessions.begin_upload(client, target)?;
        Ok(UploadHandle { upload_id, stream })
    }

    /// Begin replacing an existing file's content
    pub fn update(&self, client: ClientId, item_id: &str, old_etag: &str) -> ProviderResult<UploadHandle> {
        check_item_id("item_id", item_id)?;
        check_etag("old_etag", old_etag)?;

        let target = UploadTarget::Replace {
            item_id: item_id.to_string(),
            expected_etag: old_etag.to_string(),
        };
        let (upload_id, stream) = self.sessions.begin_upload(client, target)?;
        Ok(UploadHandle { upload_id, stream })
    }

    /// Discard an upload; always succeeds for well-formed ids
    pub fn cancel_upload(&self, client: ClientId, upload_id: &str) -> ProviderResult<()> {
        check_item_id("upload_id", upload_id)?;
        self.sessions.cancel_upload(client, upload_id)
    }

    pub async fn finish_upload(&self, client: ClientId, upload_id: &str) -> ProviderResult<Item> {
        check_item_id("upload_id", upload_id)?;
        self.sessions.finish_upload(client, upload_id).await
    }

    pub fn download(&self, client: ClientId, item_id: &str, match_etag: &str) -> ProviderResult<DownloadHandle> {
        check_item_id("item_id", item_id)?;
        check_etag("match_etag", match_etag)?;
        let (download_id, stream) = self.sessions.begin_download(client, item_id, match_etag)?;
        Ok(DownloadHandle { download_id, stream })
    }

    pub fn finish_download(&self, client: ClientId, download_id: &str) -> ProviderResult<()> {
        check_item_id("download_id", download_id)?;
        self.sessions.finish_download(client, download_id)
    }

    pub fn delete(&self, item_id: &str) -> ProviderResult<()> {
        check_item_id("item_id", item_id)?;
        self.store.delete(item_id)
    }

    pub fn move_item(&self, item_id: &str, new_parent_id: &str, new_name: &str) -> ProviderResult<Item> {
        check_item_id("item_id", item_id)?;
        check_item_id("new_parent_id", new_parent_id)?;
        check_name(new_name)?;
        self.store.move_item(item_id, new_parent_id, new_name)
    }

    pub fn copy(&self, item_id: &str, new_parent_id: &str, new_name: &str) -> ProviderResult<Item> {
        check_item_id("item_id", item_id)?;
        check_item_id("new_parent_id", new_parent_id)?;
        check_name(new_name)?;
        self.store.copy(item_id, new_parent_id, new_name)
    }
}

fn check_item_id(field: &str, id: &str) -> ProviderResult<()> {
    validators::validate_item_id(id).map_err(|e| {
        let reason = match e {
            ItemIdError::Empty => "is empty".to_string(),
            ItemIdError::TooLong => {
                format!("exceeds {} characters", validators::MAX_ITEM_ID_LENGTH)
            }
            ItemIdError::InvalidCharacters => "contains invalid characters".to_string(),
        };
        ProviderError::InvalidArgument(format!("{field} {reason}"))
    })
}

fn check_name(name: &str) -> ProviderResult<()> {
    validators::validate_item_name(name).map_err(|e| {
        let reason = match e {
            ItemNameError::Empty => "is empty".to_string(),
            ItemNameError::TooLong => {
                format!("exceeds {} characters", validators::MAX_ITEM_NAME_LENGTH)
            }
            ItemNameError::Reserved => "is reserved".to_string(),
            ItemNameError::ContainsPathSeparator => "contains a path separator".to_string(),
            ItemNameError::ContainsNull => "contains a NUL character".to_string(),
            ItemNameError::InvalidCharacters => "contains invalid characters".to_string(),
        };
        ProviderError::InvalidArgument(format!("name {reason}"))
    })
}

fn check_content_type(content_type: &str) -> ProviderResult<()> {
    validators::validate_content_type(content_type).map_err(|e| {
        let reason = match e {
            ContentTypeError::TooLong => format!(
                "exceeds {} characters",
                validators::MAX_CONTENT_TYPE_LENGTH
            ),
            ContentTypeError::MissingSubtype => "is missing a subtype".to_string(),
            ContentTypeError::InvalidCharacters => "contains invalid characters".to_string(),
        };
        ProviderError::InvalidArgument(format!("content_type {reason}"))
    })
}

fn check_etag(field: &str, etag: &str) -> ProviderResult<()> {
    validators::validate_etag(etag).map_err(|e| {
        let reason = match e {
            EtagError::TooLong => format!("exceeds {} characters", validators::MAX_ETAG_LENGTH),
            EtagError::InvalidCharacters => "contains invalid characters".to_string(),
        };
        ProviderError::InvalidArgument(format!("{field} {reason}"))
    })
}

fn check_page_token(token: &str) -> ProviderResult<()> {
    validators::validate_page_token(token).map_err(|e| match e {
        PageTokenError::TooLong | PageTokenError::InvalidEncoding => {
            ProviderError::InvalidArgument("invalid page token".to_string())
        }
    })
}
