// Purpose: Voice management, polyphony, note messages
// This layer sits above the DSP primitives and below the render pipeline

pub mod message;
pub mod pool;
pub mod voice;
