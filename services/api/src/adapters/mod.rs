pub mod aid_llm;
pub mod enrichment_llm;
pub mod extraction_llm;
pub mod gemini;
pub mod mindmap_image;
pub mod store;

pub use aid_llm::GeminiAidAdapter;
pub use enrichment_llm::GeminiEnrichmentAdapter;
pub use extraction_llm::GeminiExtractionAdapter;
pub use gemini::GeminiClient;
pub use mindmap_image::ImagenMindMapAdapter;
pub use store::RestDocumentStore;
