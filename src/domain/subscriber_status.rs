/// Lifecycle of a subscription. `Unsubscribed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriberStatus {
    Pending,
    Verified,
    Unsubscribed,
}

/// Effect of a requested state change on a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to the given status.
    Apply(SubscriberStatus),
    /// The subscriber is already in the requested status.
    Unchanged,
    /// The subscription is closed; nothing may change it.
    Closed,
}

impl SubscriberStatus {
    pub fn on_verify(self) -> Transition {
        match self {
            Self::Pending => Transition::Apply(Self::Verified),
            Self::Verified => Transition::Unchanged,
            Self::Unsubscribed => Transition::Closed,
        }
    }

    pub fn on_unsubscribe(self) -> Transition {
        match self {
            Self::Pending | Self::Verified => Transition::Apply(Self::Unsubscribed),
            Self::Unsubscribed => Transition::Unchanged,
        }
    }
}
