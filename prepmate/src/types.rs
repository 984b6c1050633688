//! Shared identifier types.

use uuid::Uuid;

pub type AccountId = Uuid;
pub type ResumeId = Uuid;
pub type LogEntryId = Uuid;
pub type PaymentId = Uuid;

/// Abbreviate a UUID to its first segment for compact log fields.
pub fn abbrev_uuid(id: &Uuid) -> String {
    let s = id.to_string();
    s.split('-').next().unwrap_or(&s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbrev_takes_first_segment() {
        let id = Uuid::parse_str("01234567-89ab-cdef-0123-456789abcdef").unwrap();
        assert_eq!(abbrev_uuid(&id), "01234567");
    }
}
