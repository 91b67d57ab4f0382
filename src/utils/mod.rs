pub mod attendance_policy;
pub mod clock;
pub mod csv;
pub mod db_utils;
pub mod stats;
pub mod validation;
