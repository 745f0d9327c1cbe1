pub mod captions;
pub mod gemini;
pub mod ingest;
pub mod media;
pub mod metadata;
pub mod pipeline;
pub mod queue;
pub mod video_ref;
