use std::fmt;

use uuid::Uuid;

/// Header carrying the ticket on every outbound call
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ticket issued for one outbound call
///
/// A dispatcher holds on to the ticket of the call it is waiting for; any
/// completion presenting a different ticket is stale and gets dropped. The
/// same value goes out in [`REQUEST_ID_HEADER`] so backend logs line up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Issues a ticket no earlier call can hold
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_header_form_is_hyphenated_uuid() {
        let id = RequestId::new();
        let header = id.to_string();
        assert_eq!(header.len(), 36);
        assert_eq!(Uuid::parse_str(&header).unwrap(), id.0);
    }
}
