//! Canonical logging macros
//!
//! Every dispatch boundary logs exactly one start event and one end (or
//! end_error) event through these macros.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use tabulara_core::log_op_start;
/// log_op_start!("dispatch");
/// log_op_start!("dispatch", command_id = "cmd-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use tabulara_core::log_op_end;
/// log_op_end!("dispatch", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError`. Validation and precondition
/// failures are expected outcomes and log at `warn`; the rest log at `error`.
///
/// # Example
///
/// ```
/// # use tabulara_core::{log_op_error, errors::TabularaError};
/// let err = TabularaError::InvalidJson { message: "eof".to_string() };
/// log_op_error!("dispatch", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {
        $crate::log_op_error!($op, $err, duration_ms = $duration,)
    };
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::{ErrorCategory, ExError};
        let ex_err: ExError = $err.into();
        match ex_err.category() {
            ErrorCategory::Validation | ErrorCategory::Precondition | ErrorCategory::Idempotency => {
                tracing::warn!(
                    component = module_path!(),
                    op = $op,
                    event = $crate::core_types::schema::EVENT_END_ERROR,
                    duration_ms = $duration,
                    err_kind = ?ex_err.kind(),
                    err_code = ex_err.code(),
                    $($field)*
                );
            }
            _ => {
                tracing::error!(
                    component = module_path!(),
                    op = $op,
                    event = $crate::core_types::schema::EVENT_END_ERROR,
                    duration_ms = $duration,
                    err_kind = ?ex_err.kind(),
                    err_code = ex_err.code(),
                    $($field)*
                );
            }
        }
    }};
}
