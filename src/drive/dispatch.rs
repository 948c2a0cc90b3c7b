//! Top-level "add link tasks" invocation.

use super::{DriveClient, Operation, PathGroups, TaskResult, WorkItem};
use crate::error::Result;
use crate::http::AuthenticatedCall;
use tracing::info;

impl<C: AuthenticatedCall> DriveClient<C> {
    /// Run the named operation over `items`
    ///
    /// # Errors
    /// [`Error::NotSupported`](crate::Error::NotSupported) for an unknown
    /// operation name, before any request is made.
    pub async fn execute(&self, operation: &str, items: &[WorkItem]) -> Result<Vec<TaskResult>> {
        match operation.parse::<Operation>()? {
            Operation::AddLinkTasks => self.dispatch(items).await,
        }
    }

    /// Resolve each destination path once and submit its links in one batch
    ///
    /// Results come back in group order (first-seen destination path), links
    /// in input order within a group. The first failing group aborts the
    /// whole dispatch; groups already submitted are not rolled back.
    pub async fn dispatch(&self, items: &[WorkItem]) -> Result<Vec<TaskResult>> {
        let groups = PathGroups::from_items(items);
        info!(
            items = items.len(),
            paths = groups.len(),
            "Dispatching link tasks"
        );

        let mut results = Vec::with_capacity(items.len());
        for (path, links) in groups.iter() {
            let cid = self.ensure_directory_path(path).await?;
            let hashes = self.submit_link_tasks(links, &cid).await?;
            results.extend(hashes.into_iter().map(|info_hash| TaskResult { info_hash }));
        }

        Ok(results)
    }
}
