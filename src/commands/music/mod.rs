pub(crate) mod play;

pub(crate) mod audio_sources;
pub(crate) mod utils;
