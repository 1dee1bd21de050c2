//! External collaborators.
//!
//! Each third-party dependency of the pipeline sits behind a trait so stages
//! can be exercised with in-memory fakes. The concrete implementations are
//! thin reqwest/subprocess clients; they carry no retry policy. A failed
//! call surfaces as a [`CollabError`] and the stage decides the blast radius
//! (one idea, one item).

pub mod assets;
pub mod host;
pub mod ideas;
pub mod narration;
pub mod render;

pub use assets::{AssetLibrary, PexelsLibrary};
pub use host::{UploadReceipt, VideoHost, YouTubeHost};
pub use ideas::{IdeaGenerator, OpenAiIdeas};
pub use narration::{Narration, Narrator, OpenAiNarrator};
pub use render::{CommandRenderer, RenderEngine};
