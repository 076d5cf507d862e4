mod hosted;
mod local;

pub use hosted::HostedApiBackend;
pub use local::LocalInferenceBackend;
