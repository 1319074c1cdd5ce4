//! Tuning job entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use ecuflow_core::naming::TuneOptions;
use ecuflow_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `tuning_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TuningJob {
    pub id: DbId,
    pub owner_id: DbId,
    /// File name as uploaded by the requester.
    pub original_file_name: String,
    /// Opaque reference to the uploaded bytes in file storage.
    pub stored_file_name: String,
    pub dpf_off: bool,
    pub egr_off: bool,
    pub adblue_off: bool,
    pub dtc_off: bool,
    pub dtc_codes: Option<String>,
    pub immo_off: bool,
    pub notes: Option<String>,
    pub status_id: StatusId,
    /// Reference to the processed file. Set only on completion.
    pub processed_file_name: Option<String>,
    /// Operator-authored note shown to the requester.
    pub operator_message: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<String>,
    pub ecu_type: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TuningJob {
    /// The processing options captured at submission, in the shape the
    /// filename derivation expects.
    pub fn options(&self) -> TuneOptions {
        TuneOptions {
            dpf_off: self.dpf_off,
            egr_off: self.egr_off,
            adblue_off: self.adblue_off,
            dtc_off: self.dtc_off,
            dtc_codes: self.dtc_codes.clone(),
            immo_off: self.immo_off,
        }
    }
}

/// DTO for submitting a new tuning job via `POST /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct CreateTuningJob {
    pub original_file_name: String,
    pub stored_file_name: String,
    #[serde(default)]
    pub dpf_off: bool,
    #[serde(default)]
    pub egr_off: bool,
    #[serde(default)]
    pub adblue_off: bool,
    #[serde(default)]
    pub dtc_off: bool,
    pub dtc_codes: Option<String>,
    #[serde(default)]
    pub immo_off: bool,
    pub notes: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<String>,
    pub ecu_type: Option<String>,
}

/// DTO for editing a pending job. All fields are optional; absent fields
/// keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTuningJob {
    pub dpf_off: Option<bool>,
    pub egr_off: Option<bool>,
    pub adblue_off: Option<bool>,
    pub dtc_off: Option<bool>,
    pub dtc_codes: Option<String>,
    pub immo_off: Option<bool>,
    pub notes: Option<String>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub vehicle_year: Option<String>,
    pub ecu_type: Option<String>,
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Filter by status ID (e.g. 1 = pending, 2 = completed).
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
