//! The registry row for one voucher.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::status::Status;
use crate::timestamp::Timestamp;

/// One row of the voucher registry.
///
/// Everything except `status` is fixed at creation. The on-disk field names
/// (`number`, `status`, `created_at`, `artifact`, `sidecar`, `items_count`)
/// are part of the index format and must not change; unknown fields are
/// ignored on read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRecord {
    number: u64,
    #[serde(default)]
    status: Status,
    #[serde(with = "crate::timestamp::lenient")]
    created_at: Timestamp,
    #[serde(rename = "artifact")]
    artifact_path: String,
    #[serde(
        rename = "sidecar",
        default,
        serialize_with = "serialize_sidecar",
        deserialize_with = "deserialize_sidecar"
    )]
    sidecar_path: Option<String>,
    #[serde(rename = "items_count", default)]
    item_count: usize,
}

impl VoucherRecord {
    /// Create a new `Pending` record.
    pub fn new(
        number: u64,
        created_at: Timestamp,
        artifact_path: impl Into<String>,
        sidecar_path: Option<String>,
        item_count: usize,
    ) -> Self {
        Self {
            number,
            status: Status::Pending,
            created_at,
            artifact_path: artifact_path.into(),
            sidecar_path: sidecar_path.filter(|s| !s.is_empty()),
            item_count,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Artifact filename, relative to the registry root.
    pub fn artifact_path(&self) -> &str {
        &self.artifact_path
    }

    /// Sidecar filename, relative to the registry root.
    pub fn sidecar_path(&self) -> Option<&str> {
        self.sidecar_path.as_deref()
    }

    /// Line-item count cached at creation time.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Overwrite the status. Only the registry applies this to stored rows,
    /// after checking the transition is allowed.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

fn serialize_sidecar<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_sidecar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
