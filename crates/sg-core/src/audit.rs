//! Audit routing for rejections.
//!
//! The validation engine never logs raw input. The audit message of a
//! rejection does contain it, and is written here under the
//! `sg_core::audit` target so deployments can route it to a restricted sink.

use sg_validate::Rejection;

/// Tracing target for audit records.
pub const AUDIT_TARGET: &str = "sg_core::audit";

/// Emit the audit record for a rejection.
///
/// Operator-attention kinds (unknown type, I/O failure) are logged at error,
/// everything else at warn.
pub fn record(rejection: &Rejection) {
    let kind = rejection.kind();
    if rejection.requires_operator_attention() {
        tracing::error!(
            target: AUDIT_TARGET,
            context = rejection.context(),
            kind = kind.name(),
            code = kind.code(),
            "{}",
            rejection.audit_message()
        );
    } else {
        tracing::warn!(
            target: AUDIT_TARGET,
            context = rejection.context(),
            kind = kind.name(),
            code = kind.code(),
            "{}",
            rejection.audit_message()
        );
    }
}
