pub mod activation;

pub use activation::{log_softmax, log_softmax_backward, relu, relu_backward};
