pub mod error;
pub mod kind;
pub mod record;
pub mod time;

pub use error::{CoreError, Result};
pub use kind::ResourceKind;
pub use record::{
    PATIENT_NO_PREFIX, STORE_FIELDS, generated_code, into_object, stamp_new_record, update_patch,
};
pub use crate::time::{format_timestamp, normalize_timestamp, now_timestamp, parse_date};
