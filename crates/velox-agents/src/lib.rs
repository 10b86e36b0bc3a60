pub mod cloudflare;
pub mod image;
pub mod openai;
pub mod providers;

pub use cloudflare::WorkersAiProvider;
pub use image::{GeneratedImage, ImagePipeline, PromptStrategy};
pub use openai::OpenAiProvider;
pub use providers::{CompletionProvider, ImageProvider};
