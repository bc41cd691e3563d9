// Generic resource endpoints
//
// Devices, VPNs and networks share one REST shape:
// `GET|POST {path}`, `PATCH|DELETE {path}/{id}`, plus per-item
// `{path}/{id}/email` and `{path}/{id}/config?qrcode=` on the peer
// resources.

use bytes::Bytes;
use tracing::debug;

use crate::auth::Target;
use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ArtifactKind, Resource};

impl ApiClient {
    /// List every record of `R` visible on `target`.
    ///
    /// `GET {path}`
    pub async fn list<R: Resource>(&self, target: Target) -> Result<Vec<R>, Error> {
        debug!(kind = R::KIND, "listing");
        self.get(target, R::PATH).await
    }

    /// Create a record; returns the server's copy (with its assigned id).
    ///
    /// `POST {path}`
    pub async fn create<R: Resource>(&self, target: Target, item: &R) -> Result<R, Error> {
        debug!(kind = R::KIND, label = item.label(), "creating");
        self.post(target, R::PATH, item).await
    }

    /// Update a record in place; returns the server's copy.
    ///
    /// `PATCH {path}/{id}`
    pub async fn update<R: Resource>(&self, target: Target, item: &R) -> Result<R, Error> {
        debug!(kind = R::KIND, id = item.id(), "updating");
        self.patch(target, &item_path::<R>(item.id()), item).await
    }

    /// Delete a record by id.
    ///
    /// `DELETE {path}/{id}`
    pub async fn remove<R: Resource>(&self, target: Target, id: &str) -> Result<(), Error> {
        debug!(kind = R::KIND, id, "deleting");
        self.delete(target, &item_path::<R>(id)).await
    }

    /// Ask the server to e-mail a record's configuration to its owner.
    ///
    /// `GET {path}/{id}/email`
    pub async fn email<R: Resource>(&self, target: Target, id: &str) -> Result<(), Error> {
        debug!(kind = R::KIND, id, "requesting email");
        self.get_discard(target, &format!("{}/email", item_path::<R>(id)))
            .await
    }

    /// Fetch a binary artifact for one record.
    ///
    /// `GET {path}/{id}/config?qrcode={true|false}`
    pub async fn artifact<R: Resource>(
        &self,
        target: Target,
        id: &str,
        kind: ArtifactKind,
    ) -> Result<Bytes, Error> {
        debug!(kind = R::KIND, id, artifact = %kind, "fetching artifact");
        self.get_bytes(
            target,
            &format!("{}/config", item_path::<R>(id)),
            &[("qrcode", kind.qrcode_param())],
        )
        .await
    }
}

fn item_path<R: Resource>(id: &str) -> String {
    format!("{}/{id}", R::PATH)
}
