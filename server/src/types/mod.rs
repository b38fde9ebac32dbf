pub mod error;
pub mod requests;

pub use error::{ApiError, ErrorCode};
pub use requests::{
    Ack, NotifyMessage, NotifyRequest, SetTokenRequest, SignedTopic, SilentNotifyRequest,
    SpaceRequest, SubscriptionsResponse, TopicPair, TopicsRequest,
};
