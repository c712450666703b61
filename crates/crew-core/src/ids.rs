//! ID prefix constants.
//!
//! Entity IDs are `<prefix>-<8 hex chars>`, generated by the store inside the
//! request transaction. User IDs are opaque subjects issued by the identity
//! provider and carry no prefix.

pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_TASK: &str = "tsk";
pub const PREFIX_COMMENT: &str = "cmt";

/// Check whether `id` has the shape `<prefix>-<8 lowercase hex>`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| {
            hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        })
}
