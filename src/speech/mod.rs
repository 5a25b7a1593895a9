//! Speech synthesis system

pub mod backends;
pub mod cancel;
pub mod output;
pub mod session;
pub mod synth;
pub mod tempo;

pub use cancel::PlaybackControl;
pub use output::{AudioOutput, OutputFactory, RodioOutput};
pub use session::{ChunkStatus, Player, SessionEvent, LOOKAHEAD};
pub use synth::{create_backends, AudioFetcher, Backend, BackendKind, BackendOptions, Synth};
pub use tempo::{AudioFilter, FfmpegTempo};
