pub mod assistant_llm;
pub mod llm;
pub mod mailer;
pub mod pg_store;
pub mod review_llm;

pub use assistant_llm::{OpenAiAdvisorAdapter, OpenAiSupportAdapter};
pub use mailer::TemplatedMailer;
pub use pg_store::PgKeyValueStore;
pub use review_llm::OpenAiReviewAdapter;
