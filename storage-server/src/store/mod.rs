//! In-memory entity store
//!
//! Holds the forest of roots, folders and files. Every mutation assigns a
//! fresh etag to the mutated item and to each parent whose child set
//! changed. All mutations are serialized by one lock; callers should not
//! rely on that.
//!
//! ## Listing consistency
//!
//! Children are listed in `(name, item_id)` order and pages are keyset
//! cursors (see [`page`]). If the store changes between two `children`
//! calls, items present both before and after the change are neither
//! skipped nor repeated. Items inserted or removed in between may or may
//! not appear. A rename moves an item to a new key, so it behaves as a
//! removal plus an insertion.

mod etag;
mod item;
mod page;

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use storage_common::{DEFAULT_CONTENT_TYPE, DEFAULT_PAGE_SIZE, Item, ItemType};
use uuid::Uuid;

use crate::error::{ProviderError, ProviderResult};

pub use item::Content;

use etag::make_etag;
use item::ItemRecord;
use page::{ChildKey, decode_token, encode_token};

/// Store behaviour switches
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Let several siblings share a name
    pub allow_duplicate_names: bool,
    /// Children returned per page
    pub page_size: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            allow_duplicate_names: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// What an upload writes when it is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadTarget {
    /// New file under `parent_id`, or replacement of a same-named sibling
    Create {
        parent_id: String,
        name: String,
        /// Empty to infer from content at commit
        content_type: String,
        allow_overwrite: bool,
        /// Non-empty to require an existing sibling with this etag
        expected_etag: String,
    },
    /// New content for an existing file
    Replace {
        item_id: String,
        /// Empty for an unconditional replacement
        expected_etag: String,
    },
}

pub struct EntityStore {
    inner: RwLock<StoreInner>,
    options: StoreOptions,
}

#[derive(Default)]
struct StoreInner {
    items: HashMap<String, ItemRecord>,
    /// Child keys per container, present for every root and folder
    children: HashMap<String, BTreeSet<ChildKey>>,
    roots: Vec<String>,
    /// Bumped for every etag handed out
    generation: u64,
}

enum CreateSlot {
    New,
    Existing(String),
}

impl EntityStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            options,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a new top-level root
    pub fn add_root(&self, name: &str) -> Item {
        let mut inner = self.write();
        let id = Uuid::new_v4().to_string();
        let etag = inner.next_etag(&id);
        let now = Utc::now();
        let record = ItemRecord {
            id: id.clone(),
            parent_id: String::new(),
            name: name.to_string(),
            etag,
            kind: ItemType::Root,
            content_type: None,
            content: Content::from(Vec::new()),
            created_at: now,
            modified_at: now,
        };
        let item = record.to_item();
        inner.insert(record);
        inner.roots.push(id);
        item
    }

    pub fn roots(&self) -> Vec<Item> {
        let inner = self.read();
        inner
            .roots
            .iter()
            .filter_map(|id| inner.items.get(id))
            .map(ItemRecord::to_item)
            .collect()
    }

    pub fn get(&self, item_id: &str) -> ProviderResult<Item> {
        self.read().get(item_id).map(ItemRecord::to_item)
    }

    /// Number of items in the store, roots included
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One page of `parent_id`'s children and the token for the next page
    ///
    /// The returned token is empty when this was the last page.
    pub fn children(&self, parent_id: &str, page_token: &str) -> ProviderResult<(Vec<Item>, String)> {
        let after = decode_token(page_token)?;
        let inner = self.read();
        inner.container(parent_id)?;

        let empty = BTreeSet::new();
        let set = inner.children.get(parent_id).unwrap_or(&empty);
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };

        let page_size = self.options.page_size.max(1);
        let mut keys: Vec<&ChildKey> = set
            .range((lower, Bound::Unbounded))
            .take(page_size + 1)
            .collect();
        let next_token = if keys.len() > page_size {
            keys.truncate(page_size);
            keys.last().map(|key| encode_token(key)).unwrap_or_default()
        } else {
            String::new()
        };

        let items = keys
            .into_iter()
            .filter_map(|(_, id)| inner.items.get(id))
            .map(ItemRecord::to_item)
            .collect();
        Ok((items, next_token))
    }

    /// Children of `parent_id` named exactly `name`
    ///
    /// Normally zero or one item, more when duplicate names are allowed.
    pub fn lookup(&self, parent_id: &str, name: &str) -> ProviderResult<Vec<Item>> {
        let inner = self.read();
        inner.container(parent_id)?;
        Ok(inner
            .named_children(parent_id, name)
            .into_iter()
            .map(ItemRecord::to_item)
            .collect())
    }

    pub fn create_folder(&self, parent_id: &str, name: &str) -> ProviderResult<Item> {
        let mut inner = self.write();
        inner.container(parent_id)?;
        inner.ensure_name_free(parent_id, name, None, self.options.allow_duplicate_names)?;

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let etag = inner.next_etag(&id);
        let record = ItemRecord {
            id,
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            etag,
            kind: ItemType::Folder,
            content_type: None,
            content: Content::from(Vec::new()),
            created_at: now,
            modified_at: now,
        };
        let item = record.to_item();
        inner.insert(record);
        inner.touch(parent_id, now);
        Ok(item)
    }

    /// Delete an item and everything beneath it
    pub fn delete(&self, item_id: &str) -> ProviderResult<()> {
        let mut inner = self.write();
        let record = inner.get(item_id)?;
        if record.kind == ItemType::Root {
            return Err(ProviderError::PermissionDenied(
                "roots cannot be deleted".to_string(),
            ));
        }

        let parent_id = record.parent_id.clone();
        let key = (record.name.clone(), record.id.clone());
        if let Some(siblings) = inner.children.get_mut(&parent_id) {
            siblings.remove(&key);
        }
        inner.remove_subtree(item_id);
        inner.touch(&parent_id, Utc::now());
        Ok(())
    }

    /// Move and/or rename an item
    pub fn move_item(&self, item_id: &str, new_parent_id: &str, new_name: &str) -> ProviderResult<Item> {
        let mut inner = self.write();
        let record = inner.get(item_id)?;
        if record.kind == ItemType::Root {
            return Err(ProviderError::PermissionDenied(
                "roots cannot be moved".to_string(),
            ));
        }
        let old_parent_id = record.parent_id.clone();
        let old_key = (record.name.clone(), record.id.clone());

        inner.container(new_parent_id)?;
        if inner.is_within(new_parent_id, item_id) {
            return Err(ProviderError::InvalidArgument(format!(
                "cannot move '{item_id}' into itself"
            )));
        }
        inner.ensure_name_free(
            new_parent_id,
            new_name,
            Some(item_id),
            self.options.allow_duplicate_names,
        )?;

        let now = Utc::now();
        let etag = inner.next_etag(item_id);
        if let Some(siblings) = inner.children.get_mut(&old_parent_id) {
            siblings.remove(&old_key);
        }
        let item = match inner.items.get_mut(item_id) {
            Some(record) => {
                record.parent_id = new_parent_id.to_string();
                record.name = new_name.to_string();
                record.etag = etag;
                record.modified_at = now;
                record.to_item()
            }
            None => return Err(ProviderError::item_not_found(item_id)),
        };
        inner
            .children
            .entry(new_parent_id.to_string())
            .or_default()
            .insert((new_name.to_string(), item_id.to_string()));

        inner.touch(&old_parent_id, now);
        if old_parent_id != new_parent_id {
            inner.touch(new_parent_id, now);
        }
        Ok(item)
    }

    /// Copy an item (recursively for folders) under a new parent and name
    ///
    /// Copies get fresh ids and share file content with the source. A root
    /// copies as a folder.
    pub fn copy(&self, item_id: &str, new_parent_id: &str, new_name: &str) -> ProviderResult<Item> {
        let mut inner = self.write();
        inner.get(item_id)?;
        inner.container(new_parent_id)?;
        if inner.is_within(new_parent_id, item_id) {
            return Err(ProviderError::InvalidArgument(format!(
                "cannot copy '{item_id}' into itself"
            )));
        }
        inner.ensure_name_free(new_parent_id, new_name, None, self.options.allow_duplicate_names)?;

        let now = Utc::now();
        let mut top = None;
        let mut pending = vec![(
            item_id.to_string(),
            new_parent_id.to_string(),
            Some(new_name.to_string()),
        )];
        while let Some((source_id, dest_parent, rename)) = pending.pop() {
            let Some(source) = inner.items.get(&source_id).cloned() else {
                continue;
            };
            let id = Uuid::new_v4().to_string();
            let etag = inner.next_etag(&id);
            let kind = match source.kind {
                ItemType::Root => ItemType::Folder,
                other => other,
            };
            let record = ItemRecord {
                id: id.clone(),
                parent_id: dest_parent,
                name: rename.unwrap_or(source.name),
                etag,
                kind,
                content_type: source.content_type,
                content: source.content,
                created_at: now,
                modified_at: now,
            };
            if top.is_none() {
                top = Some(record.to_item());
            }

            let child_ids: Vec<String> = inner
                .children
                .get(&source_id)
                .map(|set| set.iter().map(|(_, child)| child.clone()).collect())
                .unwrap_or_default();
            inner.insert(record);
            pending.extend(
                child_ids
                    .into_iter()
                    .map(|child| (child, id.clone(), None)),
            );
        }

        inner.touch(new_parent_id, now);
        top.ok_or_else(|| ProviderError::item_not_found(item_id))
    }

    /// Point-in-time view of a file's metadata and content
    ///
    /// A non-empty `match_etag` must equal the current etag.
    pub fn snapshot(&self, item_id: &str, match_etag: &str) -> ProviderResult<(Item, Content)> {
        let inner = self.read();
        let record = inner.get(item_id)?;
        if record.kind != ItemType::File {
            return Err(ProviderError::InvalidArgument(format!(
                "'{item_id}' is not a file"
            )));
        }
        if !match_etag.is_empty() && record.etag != match_etag {
            return Err(ProviderError::etag_mismatch(item_id));
        }
        Ok((record.to_item(), record.content.clone()))
    }

    /// Check that an upload to `target` could be committed right now
    pub fn check_upload(&self, target: &UploadTarget) -> ProviderResult<()> {
        let inner = self.read();
        match target {
            UploadTarget::Create {
                parent_id,
                name,
                allow_overwrite,
                expected_etag,
                ..
            } => inner
                .resolve_create(
                    parent_id,
                    name,
                    *allow_overwrite,
                    expected_etag,
                    self.options.allow_duplicate_names,
                )
                .map(|_| ()),
            UploadTarget::Replace {
                item_id,
                expected_etag,
            } => {
                let record = inner.get(item_id)?;
                if record.kind != ItemType::File {
                    return Err(ProviderError::InvalidArgument(format!(
                        "'{item_id}' is not a file"
                    )));
                }
                if !expected_etag.is_empty() && record.etag != *expected_etag {
                    return Err(ProviderError::etag_mismatch(item_id));
                }
                Ok(())
            }
        }
    }

    /// Make staged content visible, re-checking the upload's preconditions
    ///
    /// Either the whole commit happens or the store is left untouched.
    pub fn commit(&self, target: &UploadTarget, content: Content) -> ProviderResult<Item> {
        let mut inner = self.write();
        let now = Utc::now();
        match target {
            UploadTarget::Create {
                parent_id,
                name,
                content_type,
                allow_overwrite,
                expected_etag,
            } => {
                let slot = inner.resolve_create(
                    parent_id,
                    name,
                    *allow_overwrite,
                    expected_etag,
                    self.options.allow_duplicate_names,
                )?;
                match slot {
                    CreateSlot::Existing(id) => {
                        let content_type = resolve_content_type(content_type, &content);
                        inner.replace_content(&id, content, Some(content_type), now)
                    }
                    CreateSlot::New => {
                        let id = Uuid::new_v4().to_string();
                        let etag = inner.next_etag(&id);
                        let record = ItemRecord {
                            id,
                            parent_id: parent_id.clone(),
                            name: name.clone(),
                            etag,
                            kind: ItemType::File,
                            content_type: Some(resolve_content_type(content_type, &content)),
                            content,
                            created_at: now,
                            modified_at: now,
                        };
                        let item = record.to_item();
                        inner.insert(record);
                        inner.touch(parent_id, now);
                        Ok(item)
                    }
                }
            }
            UploadTarget::Replace {
                item_id,
                expected_etag,
            } => {
                let Some(record) = inner.items.get(item_id) else {
                    return Err(ProviderError::Conflict(format!(
                        "'{item_id}' was deleted while the upload was open"
                    )));
                };
                if !expected_etag.is_empty() && record.etag != *expected_etag {
                    return Err(ProviderError::etag_mismatch(item_id));
                }
                inner.replace_content(item_id, content, None, now)
            }
        }
    }
}

/// Declared type if any, else sniffed from the content's magic bytes
fn resolve_content_type(declared: &str, content: &[u8]) -> String {
    if !declared.is_empty() {
        return declared.to_string();
    }
    infer::get(content)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

impl StoreInner {
    fn next_etag(&mut self, item_id: &str) -> String {
        self.generation += 1;
        make_etag(item_id, self.generation)
    }

    fn get(&self, item_id: &str) -> ProviderResult<&ItemRecord> {
        self.items
            .get(item_id)
            .ok_or_else(|| ProviderError::item_not_found(item_id))
    }

    /// The record for `item_id` if it can hold children
    fn container(&self, item_id: &str) -> ProviderResult<&ItemRecord> {
        let record = self.get(item_id)?;
        if !record.is_container() {
            return Err(ProviderError::not_a_folder(item_id));
        }
        Ok(record)
    }

    fn named_children(&self, parent_id: &str, name: &str) -> Vec<&ItemRecord> {
        let Some(set) = self.children.get(parent_id) else {
            return Vec::new();
        };
        set.range((name.to_string(), String::new())..)
            .take_while(|(child_name, _)| child_name == name)
            .filter_map(|(_, id)| self.items.get(id))
            .collect()
    }

    fn ensure_name_free(
        &self,
        parent_id: &str,
        name: &str,
        except: Option<&str>,
        allow_duplicates: bool,
    ) -> ProviderResult<()> {
        if allow_duplicates {
            return Ok(());
        }
        let taken = self
            .named_children(parent_id, name)
            .iter()
            .any(|record| Some(record.id.as_str()) != except);
        if taken {
            return Err(ProviderError::name_exists(name));
        }
        Ok(())
    }

    /// Decide where a create-style upload lands
    ///
    /// A non-empty etag is always checked, whatever `allow_overwrite` says.
    fn resolve_create(
        &self,
        parent_id: &str,
        name: &str,
        allow_overwrite: bool,
        expected_etag: &str,
        allow_duplicates: bool,
    ) -> ProviderResult<CreateSlot> {
        self.container(parent_id)?;
        let existing = self.named_children(parent_id, name);

        if !expected_etag.is_empty() {
            return match existing.iter().find(|r| r.etag == expected_etag) {
                Some(r) if r.kind == ItemType::File => Ok(CreateSlot::Existing(r.id.clone())),
                Some(_) => Err(ProviderError::Conflict(format!("'{name}' is a folder"))),
                None => Err(ProviderError::etag_mismatch(name)),
            };
        }

        if existing.is_empty() {
            return Ok(CreateSlot::New);
        }
        if allow_overwrite {
            return match existing.iter().find(|r| r.kind == ItemType::File) {
                Some(file) => Ok(CreateSlot::Existing(file.id.clone())),
                None => Err(ProviderError::Conflict(format!("'{name}' is a folder"))),
            };
        }
        if allow_duplicates {
            return Ok(CreateSlot::New);
        }
        Err(ProviderError::name_exists(name))
    }

    fn insert(&mut self, record: ItemRecord) {
        if !record.parent_id.is_empty() {
            self.children
                .entry(record.parent_id.clone())
                .or_default()
                .insert((record.name.clone(), record.id.clone()));
        }
        if record.is_container() {
            self.children.entry(record.id.clone()).or_default();
        }
        self.items.insert(record.id.clone(), record);
    }

    /// New content for a file; `content_type` of `None` keeps the current type
    fn replace_content(
        &mut self,
        item_id: &str,
        content: Content,
        content_type: Option<String>,
        now: DateTime<Utc>,
    ) -> ProviderResult<Item> {
        let etag = self.next_etag(item_id);
        let record = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| ProviderError::item_not_found(item_id))?;
        record.content = content;
        if content_type.is_some() {
            record.content_type = content_type;
        }
        record.etag = etag;
        record.modified_at = now;
        Ok(record.to_item())
    }

    /// Fresh etag and modification time for a container whose children changed
    fn touch(&mut self, item_id: &str, now: DateTime<Utc>) {
        if !self.items.contains_key(item_id) {
            return;
        }
        let etag = self.next_etag(item_id);
        if let Some(record) = self.items.get_mut(item_id) {
            record.etag = etag;
            record.modified_at = now;
        }
    }

    /// Whether `candidate` is `ancestor` or lies beneath it
    fn is_within(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = candidate;
        loop {
            if current == ancestor {
                return true;
            }
            match self.items.get(current) {
                Some(record) if !record.parent_id.is_empty() => current = &record.parent_id,
                _ => return false,
            }
        }
    }

    fn remove_subtree(&mut self, item_id: &str) {
        let mut pending = vec![item_id.to_string()];
        while let Some(id) = pending.pop() {
            self.items.remove(&id);
            if let Some(children) = self.children.remove(&id) {
                pending.extend(children.into_iter().map(|(_, child)| child));
            }
        }
    }
}
