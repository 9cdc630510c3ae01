mod registry;
pub use registry::SharedRegistry;

mod metrics;
pub use metrics::{Inner, Metrics, MsgKind, SideEffect};

pub use prometheus_client;
