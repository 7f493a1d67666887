mod districts;
mod new_subscriber;
mod subscriber_email;
mod subscriber_name;
mod subscriber_record;
mod subscriber_status;

pub use districts::Districts;
pub use new_subscriber::NewSubscriber;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
pub use subscriber_record::{format_timestamp, Column, RowMappingError, SubscriberRecord};
pub use subscriber_status::{SubscriberStatus, Transition};
