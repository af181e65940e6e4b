pub mod assembly;
pub mod news;
pub mod pipeline;
pub mod script;
pub mod shared;
pub mod synthesis;
pub mod voice;
