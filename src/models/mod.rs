mod api;
mod event;

pub use api::{HealthResponse, RelayResponse};
pub use event::{
    ACTION_SOURCE_WEBSITE, ClientSignals, DEFAULT_EVENT_NAME, EventsEnvelope, ServerEvent,
    TrackPayload, UserData,
};
