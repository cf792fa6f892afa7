//! The naming convention is a wire-level contract: other services derive the
//! same subjects from the same type and member names, so the rules here must
//! not drift.
//!
//! Subject: `<service>.<member>` all lower case, with the words `Message` and
//! `Queue` removed from the end of the member name. A member ending in
//! `Message` subscribes individually; one ending in `MessageQueue` joins the
//! queue group `<service>_<member>`.

/// A member name that matched the convention suffixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberMatch {
    /// Lower-cased member name with the convention suffixes removed.
    pub message_name: String,
    /// Whether the member subscribes as part of a queue group.
    pub queued: bool,
}

/// Derives a type label from a qualified type name.
///
/// Strips any namespace prefix up to the last `/`, removes pointer and
/// parenthesis decoration, then keeps the last `take` dot-separated segments
/// and drops the trailing `drop` segments from what remains. Never fails; an
/// empty input yields an empty label.
#[must_use]
pub fn type_label(qualified: &str, take: i32, drop: i32) -> String {
    let mut name = qualified;
    if let Some(ix) = name.rfind('/') {
        if ix > 0 && ix + 1 < name.len() {
            name = &name[ix + 1..];
        }
    }
    let name: String = name
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '*'))
        .collect();

    let mut parts: Vec<&str> = name.split('.').collect();
    let take = usize::try_from(take.max(0)).unwrap_or(0);
    if take < parts.len() {
        parts.drain(..parts.len() - take);
    }
    if let Ok(drop) = usize::try_from(drop) {
        if drop > 0 && drop < parts.len() {
            parts.truncate(parts.len() - drop);
        }
    }
    parts.join(".")
}

/// Derives the lower-cased service name for a Rust type.
///
/// `std::any::type_name` plays the role of a fully qualified type string:
/// path separators are normalized to dots, any generic suffix is cut off, and
/// the bare final segment is kept.
#[must_use]
pub fn service_label<T: ?Sized>() -> String {
    let qualified = std::any::type_name::<T>();
    let qualified = qualified.split('<').next().unwrap_or(qualified);
    let qualified = qualified.replace("::", ".");
    type_label(&qualified, 1, 0).to_lowercase()
}

/// Matches a member name against the convention suffixes.
///
/// Returns `None` for names ending in neither `Message` nor `MessageQueue`;
/// such members are silently skipped by enumeration, never reported.
///
/// A member literally named `Message` or `MessageQueue` yields an empty
/// message name and therefore the subject `"<service>."`. That is a known
/// quirk of the convention, kept as is.
#[must_use]
pub fn resolve_member(member: &str) -> Option<MemberMatch> {
    let queued = member.ends_with("MessageQueue");
    if !queued && !member.ends_with("Message") {
        return None;
    }

    let stem = member.strip_suffix("Queue").unwrap_or(member);
    let stem = stem.strip_suffix("Message").unwrap_or(stem);

    Some(MemberMatch {
        message_name: stem.to_lowercase(),
        queued,
    })
}
