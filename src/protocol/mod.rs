// Binary wire protocol shared with the vehicle controller
//
// Provides:
// - Frame codec ([type][len u16 LE][payload])
// - Message registry (payload shapes, typed decode/encode)

pub mod codec;
pub mod registry;

pub use codec::{Frame, FrameError, HEADER_SIZE, MAX_PAYLOAD};
pub use registry::{PayloadShape, RegistryError, decode_message, encode_message, resolve};
