use crate::domain::{Districts, SubscriberEmail, SubscriberName};

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: Option<SubscriberName>,
    pub districts: Districts,
    pub receive_forecasts: bool,
}
