//! 115 cloud-drive client: directory resolution and offline link tasks.
//!
//! The one workflow here is "add link tasks": group incoming links by their
//! destination path, make sure each path exists on the drive (creating any
//! missing segment), then submit every link for that path in one batch.
//!
//! All calls are sequential and unretried. Directory creation is guarded only
//! by a listing lookup, so two invocations racing on the same new path can
//! both create it.

use crate::config::{Config, DriveConfig};
use crate::credentials::DriveCredentials;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, AuthenticatedCall, HttpCaller};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

mod dispatch;
mod types;

pub use types::{DirectoryEntry, Operation, PathGroups, TaskResult, WorkItem};
use types::{CreatedDirectory, ListingPage, TaskBatch};

/// Client for the 115 drive, generic over the request primitive
pub struct DriveClient<C> {
    caller: C,
    config: DriveConfig,
}

impl DriveClient<HttpCaller<DriveCredentials>> {
    /// Build a reqwest-backed client from the crate configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] if no 115 credentials are configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.credentials.drive.clone().ok_or_else(|| {
            Error::config("credentials.drive", "115 credentials are not configured")
        })?;
        let client = config.http.build_client()?;
        Ok(Self::new(
            HttpCaller::new(client, credentials),
            config.drive.clone(),
        ))
    }
}

impl<C: AuthenticatedCall> DriveClient<C> {
    /// Create a client issuing requests through `caller`
    pub fn new(caller: C, config: DriveConfig) -> Self {
        Self { caller, config }
    }

    /// Drive settings in use
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// List every file and subdirectory of `directory_id`
    ///
    /// Pages through the listing until the entries collected reach the total
    /// the service reports. The total is re-read on every page.
    pub async fn list_directory_entries(&self, directory_id: &str) -> Result<Vec<DirectoryEntry>> {
        let endpoint = &self.config.endpoints.list_files;
        let mut entries: Vec<DirectoryEntry> = Vec::new();

        loop {
            let request = ApiRequest::get(endpoint)
                .query("cid", directory_id)
                .query("show_dir", 1)
                .query("offset", entries.len())
                .query("limit", self.config.page_size);

            let page: ListingPage = decode(endpoint, self.caller.call(request).await?)?;
            let received = page.data.len();
            entries.extend(page.data.into_iter().map(DirectoryEntry::from));

            debug!(
                cid = %directory_id,
                received,
                collected = entries.len(),
                total = page.count,
                "Fetched directory listing page"
            );

            if entries.len() as u64 >= page.count {
                break;
            }
            if received == 0 {
                warn!(
                    cid = %directory_id,
                    collected = entries.len(),
                    total = page.count,
                    "Listing returned an empty page before reaching the reported total"
                );
                break;
            }
        }

        Ok(entries)
    }

    /// Id of the subdirectory `name` of `parent_id`, created if missing
    ///
    /// Names compare exactly; the first matching directory in listing order
    /// wins. Files with the same name are ignored.
    pub async fn ensure_child_directory(&self, parent_id: &str, name: &str) -> Result<String> {
        let entries = self.list_directory_entries(parent_id).await?;
        if let Some(existing) = entries
            .into_iter()
            .find(|entry| !entry.is_file && entry.name == name)
        {
            debug!(parent = %parent_id, name, cid = %existing.id, "Found existing directory");
            return Ok(existing.id);
        }

        let endpoint = &self.config.endpoints.create_directory;
        let request = ApiRequest::post(endpoint)
            .form("pid", parent_id)
            .form("cname", name);
        let created: CreatedDirectory = decode(endpoint, self.caller.call(request).await?)?;

        info!(parent = %parent_id, name, cid = %created.cid, "Created directory");
        Ok(created.cid)
    }

    /// Id of the deepest directory of `path`, creating missing segments
    ///
    /// Empty segments are dropped, so `"/a//b/"` and `"a/b"` are the same
    /// path. A path with no segments is the drive root.
    pub async fn ensure_directory_path(&self, path: &str) -> Result<String> {
        let mut current = self.config.root_id.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.ensure_child_directory(&current, segment).await?;
        }
        Ok(current)
    }

    /// Submit `links` as offline tasks saving into `directory_id`
    ///
    /// The batch is all-or-nothing: if any link is rejected the whole call
    /// fails with the full response attached, even though the other links
    /// may have been accepted by the service.
    pub async fn submit_link_tasks(
        &self,
        links: &[String],
        directory_id: &str,
    ) -> Result<Vec<String>> {
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = &self.config.endpoints.add_link_tasks;
        let mut request = ApiRequest::post(endpoint)
            .query("ct", "lixian")
            .query("ac", "add_task_urls")
            .form("wp_path_id", directory_id);
        for (idx, link) in links.iter().enumerate() {
            request = request.form(format!("url[{}]", idx), link);
        }

        let body = self.caller.call(request).await?;
        let batch: TaskBatch = decode(endpoint, body.clone())?;

        if batch.result.len() != links.len() || batch.result.iter().any(|r| !r.state) {
            return Err(Error::api(endpoint, body));
        }

        let mut info_hashes = Vec::with_capacity(links.len());
        for outcome in batch.result {
            match outcome.info_hash {
                Some(hash) => info_hashes.push(hash),
                None => return Err(Error::api(endpoint, body)),
            }
        }

        info!(cid = %directory_id, count = info_hashes.len(), "Submitted link tasks");
        Ok(info_hashes)
    }
}

/// Deserialize a response body, keeping the raw body on mismatch
fn decode<T: DeserializeOwned>(endpoint: &str, body: serde_json::Value) -> Result<T> {
    match T::deserialize(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(endpoint, error = %e, "Unexpected response shape");
            Err(Error::api(endpoint, body))
        }
    }
}
