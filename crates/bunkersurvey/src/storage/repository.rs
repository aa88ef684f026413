//! Typed repositories over a [`DocumentStore`].
//!
//! Entity ids are the last path segment; the `id` field is stripped from the
//! stored body and filled back in on read.

use std::cmp::Ordering;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::survey::Survey;
use crate::vessel::Vessel;

use super::{Collection, DocPath, DocumentStore};

/// An entity stored under a per-user collection.
pub trait Record: Serialize + DeserializeOwned {
    /// The collection holding this kind of record.
    const COLLECTION: Collection;

    /// The store id, if assigned.
    fn id(&self) -> Option<&str>;

    /// Assign the store id.
    fn set_id(&mut self, id: String);

    /// Listing order.
    fn list_order(&self, other: &Self) -> Ordering;
}

impl Record for Survey {
    const COLLECTION: Collection = Collection::Surveys;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    // Newest first.
    fn list_order(&self, other: &Self) -> Ordering {
        other.date.cmp(&self.date).then_with(|| self.id.cmp(&other.id))
    }
}

impl Record for Vessel {
    const COLLECTION: Collection = Collection::VesselConfigs;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn list_order(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then_with(|| self.id.cmp(&other.id))
    }
}

fn to_body<R: Record>(record: &R) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

fn from_body<R: Record>(id: &str, body: Value) -> Result<R> {
    let mut record: R = serde_json::from_value(body)?;
    record.set_id(id.to_string());
    Ok(record)
}

/// Per-user repository of one record type.
#[derive(Debug)]
pub struct Repository<'a, S, R> {
    store: &'a S,
    user_id: String,
    _record: PhantomData<R>,
}

/// Surveys of one user.
pub type SurveyRepository<'a, S> = Repository<'a, S, Survey>;

/// Vessel configurations of one user.
pub type VesselRepository<'a, S> = Repository<'a, S, Vessel>;

impl<'a, S: DocumentStore, R: Record> Repository<'a, S, R> {
    /// Create a repository for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `user_id` is not a valid path segment.
    pub fn new(store: &'a S, user_id: &str) -> Result<Self> {
        R::COLLECTION.user_node(user_id)?;
        Ok(Self {
            store,
            user_id: user_id.to_string(),
            _record: PhantomData,
        })
    }

    /// The owning user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn path(&self, id: &str) -> Result<DocPath> {
        R::COLLECTION.document(&self.user_id, id)
    }

    /// Store a new record under a fresh id and return the id.
    ///
    /// The id is also written back into `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn create(&self, record: &mut R) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.store.set(&self.path(&id)?, &to_body(record)?)?;
        record.set_id(id.clone());
        info!(
            "Created {} record {} for user {}",
            R::COLLECTION.name(),
            id,
            self.user_id
        );
        Ok(id)
    }

    /// Store `record` under its own id, creating or replacing it.
    ///
    /// Records without an id are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the store write fails.
    pub fn save(&self, record: &mut R) -> Result<String> {
        match record.id().map(str::to_string) {
            Some(id) => {
                self.store.set(&self.path(&id)?, &to_body(record)?)?;
                debug!("Saved {} record {}", R::COLLECTION.name(), id);
                Ok(id)
            }
            None => self.create(record),
        }
    }

    /// Read one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the document does not
    /// deserialize.
    pub fn get(&self, id: &str) -> Result<Option<R>> {
        self.store
            .get(&self.path(id)?)?
            .map(|body| from_body(id, body))
            .transpose()
    }

    /// List every record of the user, in the record's listing order.
    ///
    /// Documents that do not deserialize are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn list(&self) -> Result<Vec<R>> {
        let node = R::COLLECTION.user_node(&self.user_id)?;
        let mut records: Vec<R> = Vec::new();
        for (id, body) in self.store.children(&node)? {
            match from_body(&id, body) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable document {}/{}: {}", node, id, e),
            }
        }
        records.sort_by(R::list_order);
        Ok(records)
    }

    /// Replace an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if no record has this id, or an
    /// error if the store fails.
    pub fn update(&self, id: &str, record: &R) -> Result<()> {
        let path = self.path(id)?;
        if self.store.get(&path)?.is_none() {
            return Err(Error::not_found(path.as_str()));
        }
        self.store.set(&path, &to_body(record)?)?;
        debug!("Updated {} record {}", R::COLLECTION.name(), id);
        Ok(())
    }

    /// Delete a record. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.store.remove(&self.path(id)?)
    }
}

/// A user profile document at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    /// Display name.
    pub name: String,
    /// Contact e-mail.
    pub email: String,
    /// Surveying company.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Account role, e.g. `surveyor` or `admin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// When the profile was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// User profiles.
#[derive(Debug)]
pub struct UserRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> UserRepository<'a, S> {
    /// Create a repository over `store`.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Write the profile of `user_id`, stamping `created_at` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the store write fails.
    pub fn add(&self, user_id: &str, profile: &UserProfile) -> Result<UserProfile> {
        let mut profile = profile.clone();
        profile.created_at.get_or_insert_with(Utc::now);
        let path = Collection::Users.user_node(user_id)?;
        self.store.set(&path, &serde_json::to_value(&profile)?)?;
        info!("Added user {}", user_id);
        Ok(profile)
    }

    /// Read the profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails or the document is corrupt.
    pub fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let path = Collection::Users.user_node(user_id)?;
        self.store
            .get(&path)?
            .map(|body| serde_json::from_value(body).map_err(Error::from))
            .transpose()
    }

    /// Merge `fields` into the profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the merged document is not a
    /// valid profile.
    pub fn update(&self, user_id: &str, fields: &Map<String, Value>) -> Result<UserProfile> {
        let path = Collection::Users.user_node(user_id)?;
        let merged = self.store.update(&path, fields)?;
        Ok(serde_json::from_value(merged)?)
    }

    /// List all profiles keyed by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub fn list(&self) -> Result<Vec<(String, UserProfile)>> {
        let mut users = Vec::new();
        for (id, body) in self.store.children(&Collection::Users.root())? {
            match serde_json::from_value(body) {
                Ok(profile) => users.push((id, profile)),
                Err(e) => warn!("Skipping unreadable user profile {}: {}", id, e),
            }
        }
        Ok(users)
    }
}
