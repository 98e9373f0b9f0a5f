//! Text encoding and hosted-endpoint classification.

pub mod encode;
pub mod endpoint;

pub use encode::{encode, one_hot_encode, vectorize};
pub use endpoint::{EndpointResponse, HttpInferenceEndpoint, InferenceEndpoint, Label, Verdict};
