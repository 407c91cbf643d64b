pub mod frame;
pub mod label;

pub use frame::{build_parameters_frame, build_send_dmx_frame, encode_frame};
pub use label::{Operation, Port};
