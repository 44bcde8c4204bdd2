//! WADO-RS URI construction.
//!
//! Pure helpers that compute resource and frame URIs from an instance
//! identity triple and a [`RetrievalConfig`]. These functions are total: they
//! never validate the UIDs and never touch the network. An empty UID simply
//! produces a malformed path, which the server rejects at request time.
//! Pushing this rejection to the server is a protocol-layer convention, not
//! an oversight.

use crate::config::RetrievalConfig;

// =============================================================================
// Instance Reference
// =============================================================================

/// Identity of a single DICOM instance.
///
/// The triple is the identity; the struct is immutable once constructed and
/// supplied by the caller on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceReference {
    /// Study Instance UID (0020,000D)
    pub study_instance_uid: String,

    /// Series Instance UID (0020,000E)
    pub series_instance_uid: String,

    /// SOP Instance UID (0008,0018)
    pub sop_instance_uid: String,
}

impl InstanceReference {
    /// Create an instance reference from the three UIDs.
    pub fn new(
        study_instance_uid: impl Into<String>,
        series_instance_uid: impl Into<String>,
        sop_instance_uid: impl Into<String>,
    ) -> Self {
        Self {
            study_instance_uid: study_instance_uid.into(),
            series_instance_uid: series_instance_uid.into(),
            sop_instance_uid: sop_instance_uid.into(),
        }
    }
}

// =============================================================================
// URI Builders
// =============================================================================

/// Build the WADO-RS resource URI for an instance:
/// `{base}/studies/{study}/series/{series}/instances/{sop}`.
pub fn instance_resource_uri(instance: &InstanceReference, config: &RetrievalConfig) -> String {
    format!(
        "{}/studies/{}/series/{}/instances/{}",
        config.base_url,
        instance.study_instance_uid,
        instance.series_instance_uid,
        instance.sop_instance_uid
    )
}

/// Build the WADO-RS frame URI for an instance:
/// `{base}/studies/{study}/series/{series}/instances/{sop}/frames/{frame}`.
///
/// WADO-RS frame numbering is 1-based and servers reject frame 0, so a
/// missing or zero frame defaults to `1`.
pub fn frame_resource_uri(
    instance: &InstanceReference,
    config: &RetrievalConfig,
    frame: Option<u32>,
) -> String {
    let frame = match frame {
        Some(0) | None => 1,
        Some(n) => n,
    };
    format!("{}/frames/{}", instance_resource_uri(instance, config), frame)
}

/// Build a `wadors:` image identifier for an image-loading layer, or `None`
/// when there is no retrievable location (empty underlying URI).
pub fn wadors_image_id(
    instance: &InstanceReference,
    config: &RetrievalConfig,
    frame: Option<u32>,
) -> Option<String> {
    let uri = frame_resource_uri(instance, config, frame);

    if uri.is_empty() {
        return None;
    }

    Some(format!("wadors:{}", uri))
}

// =============================================================================
// Tests
// =============================================================================
