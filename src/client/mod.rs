mod frames;
mod reqwest_transport;
mod transport;

pub use frames::{FrameClient, FramePayload, FrameRequest, FrameRetrieval, FrameSelector};
pub use reqwest_transport::ReqwestTransport;
pub use transport::{HttpTransport, RawResponse};
