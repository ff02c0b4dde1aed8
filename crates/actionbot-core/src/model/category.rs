//! Business categories assigned by the classifier.

use std::fmt;

/// Category of a classified message.
///
/// Declaration order is significant: it breaks ties when categories are
/// sorted by message count, so `Ord` is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Category {
    /// Bills and payment requests.
    Invoice,
    /// Requests for time off.
    LeaveRequest,
    /// Customer or colleague asking for help.
    SupportRequest,
    /// Invitations and scheduling.
    MeetingRequest,
    /// Orders for goods or services.
    PurchaseOrder,
    /// Unsolicited mail.
    Spam,
    /// Anything else, including labels the classifier invents.
    #[default]
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Invoice,
        Self::LeaveRequest,
        Self::SupportRequest,
        Self::MeetingRequest,
        Self::PurchaseOrder,
        Self::Spam,
        Self::Other,
    ];

    /// Parse a classifier label.
    ///
    /// Case, `_`, `-` and repeated spaces are ignored. Unknown labels map to
    /// [`Category::Other`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let normalized = s
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|part| !part.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "invoice" => Self::Invoice,
            "leave request" => Self::LeaveRequest,
            "support request" => Self::SupportRequest,
            "meeting request" => Self::MeetingRequest,
            "purchase order" => Self::PurchaseOrder,
            "spam" => Self::Spam,
            _ => Self::Other,
        }
    }

    /// Stable machine identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::LeaveRequest => "leave_request",
            Self::SupportRequest => "support_request",
            Self::MeetingRequest => "meeting_request",
            Self::PurchaseOrder => "purchase_order",
            Self::Spam => "spam",
            Self::Other => "other",
        }
    }

    /// Human-readable label, as the classifier spells it.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::LeaveRequest => "Leave Request",
            Self::SupportRequest => "Support Request",
            Self::MeetingRequest => "Meeting Request",
            Self::PurchaseOrder => "Purchase Order",
            Self::Spam => "Spam",
            Self::Other => "Other",
        }
    }

    /// Description of what belongs in this category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Invoice => "Bills, invoices and payment reminders",
            Self::LeaveRequest => "Vacation, sick leave and other time-off requests",
            Self::SupportRequest => "Questions and problems that need a helping hand",
            Self::MeetingRequest => "Invitations and scheduling requests",
            Self::PurchaseOrder => "Orders for goods or services",
            Self::Spam => "Unsolicited or suspicious mail",
            Self::Other => "Everything the classifier could not place",
        }
    }

    /// Position in declaration order.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
