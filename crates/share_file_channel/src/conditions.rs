// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Preconditions attached to every remote call a behavior issues.
///
/// The conditions are opaque to this crate: they are handed to the
/// [`ShareFileClient`](crate::ShareFileClient) unchanged, and the remote side decides
/// whether a request satisfies them. A request that violates them fails with a transport
/// error.
///
/// Conditions are immutable once built. Share them through an [`Arc`](std::sync::Arc)
/// to apply one condition set to both the read and write side of a file.
///
/// # Example
///
/// ```
/// use share_file_channel::AccessConditions;
///
/// let conditions = AccessConditions::new()
///     .with_lease_id("6a4c3a8e-0d0a-4a5c-9f34-7c1f7ad3c2b1")
///     .with_if_match("\"0x8DB5C2F5F1A2B3C\"");
///
/// assert_eq!(conditions.if_match(), Some("\"0x8DB5C2F5F1A2B3C\""));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessConditions {
    lease_id: Option<String>,
    if_match: Option<String>,
}

impl AccessConditions {
    /// Creates an empty condition set that every request satisfies.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lease_id: None,
            if_match: None,
        }
    }

    /// Requires the request to present the given active lease.
    #[must_use]
    pub fn with_lease_id(mut self, lease_id: impl Into<String>) -> Self {
        self.lease_id = Some(lease_id.into());
        self
    }

    /// Requires the remote file to still carry the given ETag.
    #[must_use]
    pub fn with_if_match(mut self, etag: impl Into<String>) -> Self {
        self.if_match = Some(etag.into());
        self
    }

    /// The required lease, if any.
    #[must_use]
    pub fn lease_id(&self) -> Option<&str> {
        self.lease_id.as_deref()
    }

    /// The required ETag, if any.
    #[must_use]
    pub fn if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    /// Returns `true` if no condition is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lease_id.is_none() && self.if_match.is_none()
    }
}

/// Whether a remote write updates the file's last-written timestamp.
///
/// Forwarded verbatim to [`ShareFileClient::upload_range`](crate::ShareFileClient::upload_range).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LastWrittenMode {
    /// Set the last-written time to the time of the write.
    #[default]
    Now,

    /// Keep the existing last-written time.
    Preserve,
}
